use crate::core::actor::props::Props;
use crate::core::actor::{ActorBehavior, ActorError, ActorResult};
use crate::core::dispatch::any_message::AnyMessage;
use crate::infrastructure::logging_mutex::LoggingMutex;
use crate::mutex_lock_with_log;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActorFactoryError {
  #[error("Actor kind [{kind}] is already registered")]
  DuplicateKind { kind: String },
  #[error("Unknown actor kind [{kind}]")]
  UnknownKind { kind: String },
  #[error("Failed to construct an actor of kind [{kind}]: {cause}")]
  ConstructionFailed { kind: String, cause: ActorError },
}

pub type ActorFactory = Arc<dyn Fn(&[AnyMessage]) -> ActorResult<Box<dyn ActorBehavior>> + Send + Sync>;

/// Builds actors from a declared kind and constructor arguments.
#[derive(Clone, Default)]
pub struct ActorFactoryRegistry {
  factories: Arc<DashMap<String, ActorFactory>>,
}

impl Debug for ActorFactoryRegistry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ActorFactoryRegistry")
      .field("kinds", &self.kinds())
      .finish()
  }
}

impl ActorFactoryRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<A, F>(&self, kind: &str, f: F) -> Result<(), ActorFactoryError>
  where
    A: ActorBehavior,
    F: Fn(&[AnyMessage]) -> ActorResult<A> + Send + Sync + 'static, {
    match self.factories.entry(kind.to_owned()) {
      Entry::Occupied(_) => Err(ActorFactoryError::DuplicateKind { kind: kind.to_owned() }),
      Entry::Vacant(entry) => {
        log::debug!("Registering actor kind [{}]", kind);
        entry.insert(Arc::new(move |args: &[AnyMessage]| {
          f(args).map(|actor| Box::new(actor) as Box<dyn ActorBehavior>)
        }));
        Ok(())
      }
    }
  }

  pub fn contains(&self, kind: &str) -> bool {
    self.factories.contains_key(kind)
  }

  pub fn kinds(&self) -> Vec<String> {
    let mut kinds = self.factories.iter().map(|e| e.key().clone()).collect::<Vec<_>>();
    kinds.sort();
    kinds
  }

  fn factory(&self, kind: &str) -> Result<ActorFactory, ActorFactoryError> {
    self
      .factories
      .get(kind)
      .map(|e| e.value().clone())
      .ok_or_else(|| ActorFactoryError::UnknownKind { kind: kind.to_owned() })
  }

  pub fn produce(&self, kind: &str, args: &[AnyMessage]) -> Result<Box<dyn ActorBehavior>, ActorFactoryError> {
    let factory = self.factory(kind)?;
    factory(args).map_err(|cause| ActorFactoryError::ConstructionFailed {
      kind: kind.to_owned(),
      cause,
    })
  }

  /// Props for an actor of `kind`, built from `args`.
  ///
  /// The first instance is constructed here, so a failing constructor surfaces as `ConstructionFailed`
  /// before any actor exists. That instance is handed out by the first `new_actor` call; restarts call the
  /// factory again.
  pub fn props_of(&self, kind: &str, args: Vec<AnyMessage>) -> Result<Props, ActorFactoryError> {
    let factory = self.factory(kind)?;
    let first = factory(args.as_slice()).map_err(|cause| ActorFactoryError::ConstructionFailed {
      kind: kind.to_owned(),
      cause,
    })?;
    let slot = LoggingMutex::new("ActorFactoryRegistry#first_instance", Some(first));
    Ok(Props::of_producer(Arc::new(move || {
      let first = mutex_lock_with_log!(slot, "props_of").take();
      match first {
        Some(actor) => Ok(actor),
        None => factory(args.as_slice()),
      }
    })))
  }
}
