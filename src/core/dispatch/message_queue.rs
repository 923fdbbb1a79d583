use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use std::fmt::Debug;

pub mod bounded_message_queue;
pub mod dead_letters_message_queue;
pub mod unbounded_message_queue;
pub mod unbounded_stable_priority_message_queue;

/// User-message queue of a mailbox.
///
/// Implementations must accept concurrent `enqueue` from any number of threads while a single runner calls
/// `dequeue`.
pub trait MessageQueueBehavior: Debug + Send + Sync {
  /// Appends the envelope. `receiver` names the owner for dead-letter bookkeeping.
  fn enqueue(&self, receiver: &ActorRef, envelope: Envelope) -> Result<(), MailboxError>;

  /// Non-blocking. `None` means the queue is empty.
  fn dequeue(&self) -> Option<Envelope>;

  fn number_of_messages(&self) -> usize;

  fn has_messages(&self) -> bool {
    self.number_of_messages() > 0
  }

  /// Moves everything still queued to `dead_letters`.
  fn clean_up(&self, owner: &ActorRef, dead_letters: &dyn MessageQueueBehavior) {
    while let Some(envelope) = self.dequeue() {
      if let Err(err) = dead_letters.enqueue(owner, envelope) {
        log::warn!("Failed to hand over a message to dead letters: {}", err);
      }
    }
  }
}
