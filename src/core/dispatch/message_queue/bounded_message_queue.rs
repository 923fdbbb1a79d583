use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use crossbeam::channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// FIFO with a fixed capacity. A full queue makes `enqueue` wait up to `push_time_out`, then fail.
#[derive(Debug)]
pub struct BoundedMessageQueue {
  capacity: usize,
  push_time_out: Duration,
  sender: Sender<Envelope>,
  receiver: Receiver<Envelope>,
}

impl BoundedMessageQueue {
  pub fn new(capacity: usize, push_time_out: Duration) -> Result<Self, MailboxError> {
    if capacity == 0 {
      return Err(MailboxError::InvalidCapacity { capacity });
    }
    let (sender, receiver) = bounded(capacity);
    Ok(Self {
      capacity,
      push_time_out,
      sender,
      receiver,
    })
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  fn queue_full(&self, receiver: &ActorRef, envelope: Envelope) -> MailboxError {
    log::warn!(
      "Message queue of {} is full (capacity = {}), rejecting [{}]",
      receiver,
      self.capacity,
      envelope.message().type_name()
    );
    MailboxError::QueueFull {
      capacity: self.capacity,
      envelope: Box::new(envelope),
    }
  }
}

impl MessageQueueBehavior for BoundedMessageQueue {
  fn enqueue(&self, receiver: &ActorRef, envelope: Envelope) -> Result<(), MailboxError> {
    if self.push_time_out.is_zero() {
      match self.sender.try_send(envelope) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(envelope)) | Err(TrySendError::Disconnected(envelope)) => {
          Err(self.queue_full(receiver, envelope))
        }
      }
    } else {
      match self.sender.send_timeout(envelope, self.push_time_out) {
        Ok(()) => Ok(()),
        Err(SendTimeoutError::Timeout(envelope)) | Err(SendTimeoutError::Disconnected(envelope)) => {
          Err(self.queue_full(receiver, envelope))
        }
      }
    }
  }

  fn dequeue(&self) -> Option<Envelope> {
    self.receiver.try_recv().ok()
  }

  fn number_of_messages(&self) -> usize {
    self.receiver.len()
  }

  fn has_messages(&self) -> bool {
    !self.receiver.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Instant;

  #[test]
  fn test_zero_capacity_is_rejected() {
    assert!(matches!(
      BoundedMessageQueue::new(0, Duration::ZERO),
      Err(MailboxError::InvalidCapacity { capacity: 0 })
    ));
  }

  #[test]
  fn test_full_queue_hands_back_the_envelope() {
    let queue = BoundedMessageQueue::new(2, Duration::ZERO).unwrap();
    queue.enqueue(&ActorRef::NoSender, Envelope::new(1u8)).unwrap();
    queue.enqueue(&ActorRef::NoSender, Envelope::new(2u8)).unwrap();
    match queue.enqueue(&ActorRef::NoSender, Envelope::new(3u8)) {
      Err(MailboxError::QueueFull { capacity, envelope }) => {
        assert_eq!(capacity, 2);
        assert_eq!(envelope.typed_message::<u8>().unwrap(), 3);
      }
      other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(queue.number_of_messages(), 2);
    assert_eq!(queue.dequeue().unwrap().typed_message::<u8>().unwrap(), 1);
    queue.enqueue(&ActorRef::NoSender, Envelope::new(4u8)).unwrap();
  }

  #[test]
  fn test_push_time_out_waits_before_failing() {
    let queue = BoundedMessageQueue::new(1, Duration::from_millis(20)).unwrap();
    queue.enqueue(&ActorRef::NoSender, Envelope::new(())).unwrap();
    let started = Instant::now();
    assert!(queue.enqueue(&ActorRef::NoSender, Envelope::new(())).is_err());
    assert!(started.elapsed() >= Duration::from_millis(20));
  }
}
