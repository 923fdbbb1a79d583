use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::message_queue::bounded_message_queue::BoundedMessageQueue;
use crate::core::dispatch::message_queue::unbounded_message_queue::UnboundedMessageQueue;
use crate::core::dispatch::message_queue::unbounded_stable_priority_message_queue::{
  PriorityGenerator, UnboundedStablePriorityMessageQueue,
};
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum MailboxType {
  Unbounded,
  Bounded { capacity: usize, push_time_out: Duration },
  UnboundedStablePriority { priority: PriorityGenerator },
}

impl Default for MailboxType {
  fn default() -> Self {
    MailboxType::Unbounded
  }
}

impl MailboxType {
  pub fn of_unbounded() -> Self {
    MailboxType::Unbounded
  }

  pub fn of_bounded(capacity: usize, push_time_out: Duration) -> Self {
    MailboxType::Bounded {
      capacity,
      push_time_out,
    }
  }

  pub fn of_unbounded_stable_priority(priority: PriorityGenerator) -> Self {
    MailboxType::UnboundedStablePriority { priority }
  }
}

pub trait MailboxTypeBehavior {
  fn create_message_queue(&self) -> Result<Arc<dyn MessageQueueBehavior>, MailboxError>;
}

impl MailboxTypeBehavior for MailboxType {
  fn create_message_queue(&self) -> Result<Arc<dyn MessageQueueBehavior>, MailboxError> {
    match self {
      MailboxType::Unbounded => Ok(Arc::new(UnboundedMessageQueue::new())),
      MailboxType::Bounded {
        capacity,
        push_time_out,
      } => Ok(Arc::new(BoundedMessageQueue::new(*capacity, *push_time_out)?)),
      MailboxType::UnboundedStablePriority { priority } => {
        Ok(Arc::new(UnboundedStablePriorityMessageQueue::new(priority.clone())))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_create_message_queue() {
    assert!(MailboxType::of_unbounded().create_message_queue().is_ok());
    assert!(MailboxType::of_bounded(8, Duration::ZERO).create_message_queue().is_ok());
    assert!(matches!(
      MailboxType::of_bounded(0, Duration::ZERO).create_message_queue(),
      Err(MailboxError::InvalidCapacity { capacity: 0 })
    ));
  }
}
