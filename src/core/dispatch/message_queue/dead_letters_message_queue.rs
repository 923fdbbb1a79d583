use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::any_message::AnyMessage;
use crate::core::dispatch::dead_letters::{DeadLetter, DeadLetters};
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use crate::core::dispatch::system_message::system_message::SystemMessage;

/// Queue-shaped front of the dead-letter sink. Nothing is ever stored, so it is always empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLettersMessageQueue {
  dead_letters: DeadLetters,
}

impl DeadLettersMessageQueue {
  pub fn new(dead_letters: DeadLetters) -> Self {
    Self { dead_letters }
  }

  pub fn dead_letters(&self) -> &DeadLetters {
    &self.dead_letters
  }

  pub fn system_enqueue(&self, receiver: &ActorRef, message: SystemMessage) {
    match message {
      // A watcher of something already gone must still learn about it.
      SystemMessage::Watch { watchee, watcher } if watcher != *receiver && !watcher.is_no_sender() => {
        log::debug!("{} is already terminated, notifying watcher {}", watchee, watcher);
        watcher.send_system_message(SystemMessage::of_death_watch_notification(watchee, false));
      }
      other => self.dead_letters.publish(DeadLetter::new(
        AnyMessage::new(other),
        ActorRef::NoSender,
        receiver.clone(),
      )),
    }
  }
}

impl MessageQueueBehavior for DeadLettersMessageQueue {
  fn enqueue(&self, receiver: &ActorRef, envelope: Envelope) -> Result<(), MailboxError> {
    let (message, sender) = envelope.into_parts();
    self
      .dead_letters
      .publish(DeadLetter::new(message, sender, receiver.clone()));
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    None
  }

  fn number_of_messages(&self) -> usize {
    0
  }
}
