use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::any_message::AnyMessage;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::system_message::system_message::SystemMessage;
use std::any::Any;

/// What an actor can see and do while handling one message.
#[derive(Debug, Clone)]
pub struct ActorContext {
  self_ref: ActorRef,
  sender: ActorRef,
}

impl ActorContext {
  pub(crate) fn new(self_ref: ActorRef, sender: ActorRef) -> Self {
    Self { self_ref, sender }
  }

  pub fn self_ref(&self) -> &ActorRef {
    &self.self_ref
  }

  pub fn sender(&self) -> &ActorRef {
    &self.sender
  }

  /// Sends `msg` back to the sender of the current message, with this actor as sender.
  pub fn reply<M>(&self, msg: M) -> Result<(), MailboxError>
  where
    M: Any + Send + Sync, {
    self.sender.tell_with_sender(msg, self.self_ref.clone())
  }

  /// Stops this actor once the current message has been handled.
  pub fn stop(&self) {
    self.self_ref.stop();
  }

  pub fn watch(&self, subject: &ActorRef) {
    subject.send_system_message(SystemMessage::of_watch(subject.clone(), self.self_ref.clone()));
  }

  pub fn unwatch(&self, subject: &ActorRef) {
    subject.send_system_message(SystemMessage::of_unwatch(subject.clone(), self.self_ref.clone()));
  }

  pub fn unhandled(&self, msg: &AnyMessage) {
    log::warn!(
      "unhandled message [{}] from {} to {}",
      msg.type_name(),
      self.sender,
      self.self_ref
    );
  }
}
