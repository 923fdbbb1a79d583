use crate::core::dispatch::system_message::system_message::SystemMessage;
use crate::core::dispatch::system_message::SystemMessageQueueBehavior;
use crossbeam::queue::SegQueue;

/// Unbounded lock-free FIFO of system messages. Any number of producers; the mailbox runner is the only consumer.
#[derive(Debug, Default)]
pub struct SystemMessageQueue {
  queue: SegQueue<SystemMessage>,
}

impl SystemMessageQueue {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SystemMessageQueueBehavior for SystemMessageQueue {
  fn system_enqueue(&self, message: SystemMessage) {
    self.queue.push(message);
  }

  fn system_dequeue(&self) -> Option<SystemMessage> {
    self.queue.pop()
  }

  fn number_of_system_messages(&self) -> usize {
    self.queue.len()
  }

  fn has_system_messages(&self) -> bool {
    !self.queue.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::actor::ActorError;
  use std::sync::Arc;
  use std::thread;

  #[test]
  fn test_fifo() {
    let queue = SystemMessageQueue::new();
    assert!(!queue.has_system_messages());
    queue.system_enqueue(SystemMessage::of_create());
    queue.system_enqueue(SystemMessage::of_suspend());
    queue.system_enqueue(SystemMessage::of_recreate(ActorError::of_failed("boom")));
    assert_eq!(queue.number_of_system_messages(), 3);
    assert_eq!(queue.system_dequeue(), Some(SystemMessage::Create));
    let rest = queue.system_drain();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0], SystemMessage::Suspend);
    assert_eq!(rest[1].name(), "Recreate");
    assert_eq!(queue.system_dequeue(), None);
  }

  #[test]
  fn test_concurrent_producers() {
    let queue = Arc::new(SystemMessageQueue::new());
    let handles = (0..4)
      .map(|_| {
        let queue = queue.clone();
        thread::spawn(move || {
          for _ in 0..250 {
            queue.system_enqueue(SystemMessage::of_resume());
          }
        })
      })
      .collect::<Vec<_>>();
    for handle in handles {
      handle.join().unwrap();
    }
    assert_eq!(queue.system_drain().len(), 1000);
  }
}
