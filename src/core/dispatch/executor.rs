use crate::core::dispatch::dispatcher::DispatchError;
use crate::core::dispatch::mailbox::mailbox::Mailbox;
use std::fmt::Debug;

pub mod inline_executor;
pub mod tokio_executor;

/// Worker pool seen by a dispatcher: accepts "run this mailbox now" requests.
pub trait ExecutorBehavior: Debug + Send + Sync {
  fn execute(&self, mailbox: Mailbox) -> Result<(), DispatchError>;

  /// Stops accepting work. Requests made afterwards are rejected.
  fn shutdown(&self) {}
}
