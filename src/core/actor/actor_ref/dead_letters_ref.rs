use crate::core::actor::actor_path::ActorPath;
use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::dead_letters::DeadLetters;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::message_queue::dead_letters_message_queue::DeadLettersMessageQueue;
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use crate::core::dispatch::system_message::system_message::SystemMessage;

/// Reference whose every message ends up as a dead letter.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLettersRef {
  path: ActorPath,
  queue: DeadLettersMessageQueue,
}

impl DeadLettersRef {
  pub fn new(path: ActorPath, dead_letters: DeadLetters) -> Self {
    Self {
      path,
      queue: DeadLettersMessageQueue::new(dead_letters),
    }
  }

  pub fn path(&self) -> &ActorPath {
    &self.path
  }

  pub fn dead_letters(&self) -> &DeadLetters {
    self.queue.dead_letters()
  }

  pub(crate) fn send_message(&self, myself: &ActorRef, envelope: Envelope) -> Result<(), MailboxError> {
    self.queue.enqueue(myself, envelope)
  }

  pub(crate) fn send_system_message(&self, myself: &ActorRef, message: SystemMessage) {
    self.queue.system_enqueue(myself, message);
  }
}
