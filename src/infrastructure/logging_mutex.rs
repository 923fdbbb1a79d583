use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A `Mutex` that names itself in the log when locked and recovers from poisoning.
///
/// Every lock in the crate goes through this type, so a panicking actor handler can never leave a
/// poisoned lock that wedges the cell for good.
pub struct LoggingMutex<T> {
  inner: Mutex<T>,
  name: &'static str,
  log_output: bool,
}

impl<T> Debug for LoggingMutex<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LoggingMutex")
      .field("name", &self.name)
      .field("log_output", &self.log_output)
      .finish()
  }
}

impl<T> LoggingMutex<T> {
  pub fn new(name: &'static str, data: T) -> Self {
    LoggingMutex {
      inner: Mutex::new(data),
      name,
      log_output: false,
    }
  }

  pub fn with_log_output(mut self, log_output: bool) -> Self {
    self.log_output = log_output;
    self
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn lock_with_info(
    &self,
    function_name: &'static str,
    module_path: &'static str,
    file: &'static str,
    line: u32,
  ) -> MutexGuard<'_, T> {
    if self.log_output {
      log::debug!(
        "Attempting to lock: {} by {}:{} at {}:{}",
        self.name,
        function_name,
        module_path,
        file,
        line,
      );
    }
    let guard = self.inner.lock().unwrap_or_else(|poisoned: PoisonError<MutexGuard<'_, T>>| {
      log::warn!(
        "Recovered poisoned lock: {} by {}:{} at {}:{}",
        self.name,
        function_name,
        module_path,
        file,
        line,
      );
      poisoned.into_inner()
    });
    if self.log_output {
      log::debug!(
        "Lock acquired: {} by {}:{} at {}:{}",
        self.name,
        function_name,
        module_path,
        file,
        line,
      );
    }
    guard
  }

  pub fn into_inner(self) -> T {
    self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
  }
}

#[macro_export]
macro_rules! mutex_lock_with_log {
  ($mutex:expr, $fname:expr) => {
    $mutex.lock_with_info($fname, module_path!(), file!(), line!())
  };
}
