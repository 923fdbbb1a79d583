use crate::core::actor::actor_path::ActorPath;
use crate::core::actor::actor_ref::dead_letters_ref::DeadLettersRef;
use crate::core::actor::actor_ref::local_actor_ref::LocalActorRef;
use crate::core::actor::ActorError;
use crate::core::dispatch::any_message::AnyMessage;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::system_message::system_message::SystemMessage;
use std::any::Any;
use std::fmt::{Debug, Display, Formatter};

pub mod dead_letters_ref;
pub mod local_actor_ref;

/// Handle used to send messages to an actor.
#[derive(Clone)]
pub enum ActorRef {
  NoSender,
  Local(LocalActorRef),
  DeadLetters(DeadLettersRef),
}

impl Debug for ActorRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ActorRef::NoSender => write!(f, "NoSender"),
      ActorRef::Local(local) => write!(f, "Local({})", local.path()),
      ActorRef::DeadLetters(dead_letters) => write!(f, "DeadLetters({})", dead_letters.path()),
    }
  }
}

impl Display for ActorRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.path() {
      Some(path) => write!(f, "Actor[{}]", path),
      None => write!(f, "NoSender"),
    }
  }
}

impl PartialEq for ActorRef {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (ActorRef::NoSender, ActorRef::NoSender) => true,
      (ActorRef::Local(l), ActorRef::Local(r)) => l == r,
      (ActorRef::DeadLetters(l), ActorRef::DeadLetters(r)) => l == r,
      _ => false,
    }
  }
}

impl ActorRef {
  pub fn of_local(local: LocalActorRef) -> Self {
    ActorRef::Local(local)
  }

  pub fn of_dead_letters(dead_letters: DeadLettersRef) -> Self {
    ActorRef::DeadLetters(dead_letters)
  }

  pub fn is_no_sender(&self) -> bool {
    matches!(self, ActorRef::NoSender)
  }

  pub fn path(&self) -> Option<&ActorPath> {
    match self {
      ActorRef::NoSender => None,
      ActorRef::Local(local) => Some(local.path()),
      ActorRef::DeadLetters(dead_letters) => Some(dead_letters.path()),
    }
  }

  pub fn tell<M>(&self, msg: M) -> Result<(), MailboxError>
  where
    M: Any + Send + Sync, {
    self.tell_envelope(Envelope::new(msg))
  }

  pub fn tell_with_sender<M>(&self, msg: M, sender: ActorRef) -> Result<(), MailboxError>
  where
    M: Any + Send + Sync, {
    self.tell_envelope(Envelope::new_with_sender(msg, sender))
  }

  pub fn tell_any(&self, msg: AnyMessage, sender: ActorRef) -> Result<(), MailboxError> {
    self.tell_envelope(Envelope::of_any(msg, sender))
  }

  /// Fails only when the target's queue rejects the message, e.g. a full bounded mailbox.
  pub fn tell_envelope(&self, envelope: Envelope) -> Result<(), MailboxError> {
    match self {
      ActorRef::NoSender => {
        log::warn!(
          "Message [{}] sent to NoSender was dropped",
          envelope.message().type_name()
        );
        Ok(())
      }
      ActorRef::Local(local) => local.send_message(envelope),
      ActorRef::DeadLetters(dead_letters) => dead_letters.send_message(self, envelope),
    }
  }

  pub fn send_system_message(&self, message: SystemMessage) {
    match self {
      ActorRef::NoSender => log::debug!("System message [{}] sent to NoSender was dropped", message.name()),
      ActorRef::Local(local) => local.send_system_message(message),
      ActorRef::DeadLetters(dead_letters) => dead_letters.send_system_message(self, message),
    }
  }

  pub fn start(&self) {
    if let ActorRef::Local(local) = self {
      local.start();
    }
  }

  pub fn stop(&self) {
    if let ActorRef::Local(local) = self {
      local.stop();
    }
  }

  pub fn suspend(&self) {
    if let ActorRef::Local(local) = self {
      local.suspend();
    }
  }

  pub fn resume(&self, caused_by_failure: Option<ActorError>) {
    if let ActorRef::Local(local) = self {
      local.resume(caused_by_failure);
    }
  }

  pub fn restart(&self, cause: ActorError) {
    if let ActorRef::Local(local) = self {
      local.restart(cause);
    }
  }

  pub fn is_terminated(&self) -> bool {
    match self {
      ActorRef::Local(local) => local.is_terminated(),
      _ => false,
    }
  }

  pub fn has_messages(&self) -> bool {
    match self {
      ActorRef::Local(local) => local.has_messages(),
      _ => false,
    }
  }

  pub fn number_of_messages(&self) -> usize {
    match self {
      ActorRef::Local(local) => local.number_of_messages(),
      _ => 0,
    }
  }
}
