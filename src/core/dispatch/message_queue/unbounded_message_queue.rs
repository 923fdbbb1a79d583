use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use crossbeam::queue::SegQueue;

#[derive(Debug, Default)]
pub struct UnboundedMessageQueue {
  queue: SegQueue<Envelope>,
}

impl UnboundedMessageQueue {
  pub fn new() -> Self {
    Self::default()
  }
}

impl MessageQueueBehavior for UnboundedMessageQueue {
  fn enqueue(&self, _receiver: &ActorRef, envelope: Envelope) -> Result<(), MailboxError> {
    self.queue.push(envelope);
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    self.queue.pop()
  }

  fn number_of_messages(&self) -> usize {
    self.queue.len()
  }

  fn has_messages(&self) -> bool {
    !self.queue.is_empty()
  }
}
