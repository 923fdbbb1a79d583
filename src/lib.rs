use crate::core::actor::actor_factory_registry::ActorFactoryError;
use crate::core::dispatch::dispatcher::DispatchError;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::settings::SettingsError;
use thiserror::Error;

pub mod core;
pub mod infrastructure;

#[derive(Error, Debug)]
pub enum ActuatorError {
  #[error("Invalid actor system name [{name}], must contain only word characters (i.e. [a-zA-Z0-9] plus non-leading '-' or '_')")]
  InvalidActorSystemName { name: String },
  #[error("Invalid actor path element [{element}]: {reason}")]
  InvalidActorName { element: String, reason: String },
  #[error("Actor name [{name}] is not unique")]
  ActorNameAlreadyInUse { name: String },
  #[error("Dispatcher [{id}] not configured")]
  DispatcherNotFound { id: String },
  #[error("Mailbox [{id}] not configured")]
  MailboxNotFound { id: String },
  #[error("Actor system [{name}] has been terminated")]
  ActorSystemTerminated { name: String },
  #[error("Failed to build the worker runtime: {0}")]
  RuntimeInitialization(#[from] std::io::Error),
  #[error(transparent)]
  Mailbox(#[from] MailboxError),
  #[error(transparent)]
  Dispatch(#[from] DispatchError),
  #[error(transparent)]
  ActorFactory(#[from] ActorFactoryError),
  #[error(transparent)]
  Settings(#[from] SettingsError),
}
