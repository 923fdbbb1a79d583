use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::system_message::system_message::SystemMessage;
use std::any::Any;
use thiserror::Error;

pub mod mailbox;
pub mod mailbox_status;
pub mod mailbox_type;

#[derive(Error, Debug)]
pub enum MailboxError {
  #[error("Message queue is full (capacity = {capacity})")]
  QueueFull { capacity: usize, envelope: Box<Envelope> },
  #[error("Invalid mailbox capacity: {capacity}, must be greater than zero")]
  InvalidCapacity { capacity: usize },
  #[error("An actor has already been set on this mailbox")]
  ActorAlreadySet,
}

/// Applies dequeued messages to an actor. The mailbox calls it from at most one thread at a time.
pub trait MessageInvoker: Send + Sync {
  fn invoke(&self, envelope: Envelope);
  fn system_invoke(&self, message: SystemMessage);
  fn self_ref(&self) -> ActorRef;
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_owned()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_owned()
  }
}
