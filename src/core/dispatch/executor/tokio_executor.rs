use crate::core::dispatch::dispatcher::DispatchError;
use crate::core::dispatch::executor::ExecutorBehavior;
use crate::core::dispatch::mailbox::mailbox::Mailbox;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;

/// Runs mailboxes as tasks on a tokio multi-thread runtime.
///
/// Only the handle is kept. Whoever built the runtime owns it and decides when it shuts down.
#[derive(Debug)]
pub struct TokioExecutor {
  handle: Handle,
  is_shutdown: AtomicBool,
}

impl TokioExecutor {
  pub fn new(handle: Handle) -> Self {
    Self {
      handle,
      is_shutdown: AtomicBool::new(false),
    }
  }
}

impl ExecutorBehavior for TokioExecutor {
  fn execute(&self, mailbox: Mailbox) -> Result<(), DispatchError> {
    if self.is_shutdown.load(Ordering::Acquire) {
      return Err(DispatchError::ExecutorShutdown);
    }
    self.handle.spawn(async move {
      mailbox.run();
    });
    Ok(())
  }

  fn shutdown(&self) {
    self.is_shutdown.store(true, Ordering::Release);
  }
}
