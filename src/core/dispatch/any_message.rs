use std::any::{type_name, Any};
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to downcast message of type {actual} to {expected}")]
pub struct DowncastAnyMessageError {
  pub expected: &'static str,
  pub actual: &'static str,
}

/// Type-erased message payload. Cloning only bumps a reference count.
#[derive(Clone)]
pub struct AnyMessage {
  msg: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl AnyMessage {
  pub fn new<T>(msg: T) -> Self
  where
    T: Any + Send + Sync, {
    Self {
      msg: Arc::new(msg),
      type_name: type_name::<T>(),
    }
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn is<T: Any>(&self) -> bool {
    self.msg.is::<T>()
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.msg.downcast_ref::<T>()
  }

  pub fn downcast<T>(&self) -> Result<Arc<T>, DowncastAnyMessageError>
  where
    T: Any + Send + Sync, {
    self.msg.clone().downcast::<T>().map_err(|_| DowncastAnyMessageError {
      expected: type_name::<T>(),
      actual: self.type_name,
    })
  }

  /// Returns an owned copy of the payload, moving it out when this is the last reference.
  pub fn take<T>(self) -> Result<T, DowncastAnyMessageError>
  where
    T: Any + Send + Sync + Clone, {
    let arc = self.downcast::<T>()?;
    Ok(Arc::try_unwrap(arc).unwrap_or_else(|shared| (*shared).clone()))
  }
}

impl Debug for AnyMessage {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "AnyMessage({})", self.type_name)
  }
}

impl PartialEq for AnyMessage {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.msg, &other.msg)
  }
}
