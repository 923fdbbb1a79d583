use crate::core::dispatch::dispatcher::DispatchError;
use crate::core::dispatch::executor::ExecutorBehavior;
use crate::core::dispatch::mailbox::mailbox::Mailbox;
use crate::infrastructure::logging_mutex::LoggingMutex;
use crate::mutex_lock_with_log;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs mailboxes on the calling thread.
///
/// Requests made while a run is in progress are queued and drained by the thread already running, so a
/// mailbox run never nests inside another.
#[derive(Debug)]
pub struct InlineExecutor {
  pending: LoggingMutex<VecDeque<Mailbox>>,
  running: AtomicBool,
  is_shutdown: AtomicBool,
}

impl Default for InlineExecutor {
  fn default() -> Self {
    Self::new()
  }
}

impl InlineExecutor {
  pub fn new() -> Self {
    Self {
      pending: LoggingMutex::new("InlineExecutor#pending", VecDeque::new()),
      running: AtomicBool::new(false),
      is_shutdown: AtomicBool::new(false),
    }
  }

  fn pop(&self) -> Option<Mailbox> {
    mutex_lock_with_log!(self.pending, "pop").pop_front()
  }

  fn is_empty(&self) -> bool {
    mutex_lock_with_log!(self.pending, "is_empty").is_empty()
  }

  fn drain(&self) {
    loop {
      if self
        .running
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
      {
        return;
      }
      while let Some(mailbox) = self.pop() {
        mailbox.run();
      }
      self.running.store(false, Ordering::Release);
      if self.is_empty() {
        return;
      }
    }
  }
}

impl ExecutorBehavior for InlineExecutor {
  fn execute(&self, mailbox: Mailbox) -> Result<(), DispatchError> {
    if self.is_shutdown.load(Ordering::Acquire) {
      return Err(DispatchError::ExecutorShutdown);
    }
    mutex_lock_with_log!(self.pending, "execute").push_back(mailbox);
    self.drain();
    Ok(())
  }

  fn shutdown(&self) {
    self.is_shutdown.store(true, Ordering::Release);
  }
}
