use crate::core::dispatch::system_message::system_message::SystemMessage;
use std::fmt::Debug;

pub mod system_message;
pub mod system_message_queue;

pub trait SystemMessageQueueBehavior: Debug + Send + Sync {
  fn system_enqueue(&self, message: SystemMessage);
  fn system_dequeue(&self) -> Option<SystemMessage>;
  fn number_of_system_messages(&self) -> usize;

  fn has_system_messages(&self) -> bool {
    self.number_of_system_messages() > 0
  }

  /// Removes every pending message, earliest first.
  fn system_drain(&self) -> Vec<SystemMessage> {
    let mut result = Vec::with_capacity(self.number_of_system_messages());
    while let Some(message) = self.system_dequeue() {
      result.push(message);
    }
    result
  }
}
