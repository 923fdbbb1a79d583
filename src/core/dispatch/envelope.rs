use std::any::Any;

use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::any_message::{AnyMessage, DowncastAnyMessageError};

/// A message together with the reference of whoever sent it. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct Envelope {
  message: AnyMessage,
  sender: ActorRef,
}

impl Envelope {
  pub fn new<T>(message: T) -> Self
  where
    T: Any + Send + Sync, {
    Self::of_any(AnyMessage::new(message), ActorRef::NoSender)
  }

  pub fn new_with_sender<T>(message: T, sender: ActorRef) -> Self
  where
    T: Any + Send + Sync, {
    Self::of_any(AnyMessage::new(message), sender)
  }

  pub fn of_any(message: AnyMessage, sender: ActorRef) -> Self {
    Self { message, sender }
  }

  pub fn message(&self) -> &AnyMessage {
    &self.message
  }

  pub fn typed_message<T>(&self) -> Result<T, DowncastAnyMessageError>
  where
    T: Any + Send + Sync + Clone, {
    self.message.clone().take::<T>()
  }

  pub fn sender(&self) -> &ActorRef {
    &self.sender
  }

  pub fn into_parts(self) -> (AnyMessage, ActorRef) {
    (self.message, self.sender)
  }
}

impl PartialEq for Envelope {
  fn eq(&self, other: &Self) -> bool {
    self.message == other.message && self.sender == other.sender
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_envelope_without_sender() {
    let envelope = Envelope::new(1u64);
    assert_eq!(envelope.typed_message::<u64>().unwrap(), 1);
    assert_eq!(*envelope.sender(), ActorRef::NoSender);
    assert!(envelope.typed_message::<String>().is_err());
  }
}
