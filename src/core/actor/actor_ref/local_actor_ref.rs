use crate::core::actor::actor_cell::ActorCell;
use crate::core::actor::actor_path::ActorPath;
use crate::core::actor::ActorError;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::system_message::system_message::SystemMessage;
use std::sync::Arc;

/// Reference to an actor living in this process.
#[derive(Clone)]
pub struct LocalActorRef {
  cell: Arc<ActorCell>,
}

impl PartialEq for LocalActorRef {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.cell, &other.cell)
  }
}

impl LocalActorRef {
  pub fn new(cell: Arc<ActorCell>) -> Self {
    Self { cell }
  }

  pub fn path(&self) -> &ActorPath {
    self.cell.path()
  }

  pub fn send_message(&self, envelope: Envelope) -> Result<(), MailboxError> {
    self.cell.send_message(envelope)
  }

  pub fn send_system_message(&self, message: SystemMessage) {
    self.cell.send_system_message(message);
  }

  pub fn start(&self) {
    self.cell.start();
  }

  pub fn stop(&self) {
    self.cell.stop();
  }

  pub fn suspend(&self) {
    self.cell.suspend();
  }

  pub fn resume(&self, caused_by_failure: Option<ActorError>) {
    self.cell.resume(caused_by_failure);
  }

  pub fn restart(&self, cause: ActorError) {
    self.cell.restart(cause);
  }

  pub fn is_terminated(&self) -> bool {
    self.cell.is_terminated()
  }

  pub fn has_messages(&self) -> bool {
    self.cell.has_messages()
  }

  pub fn number_of_messages(&self) -> usize {
    self.cell.number_of_messages()
  }
}
