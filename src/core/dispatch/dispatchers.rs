use crate::core::dispatch::dispatcher::Dispatcher;
use crate::ActuatorError;
use dashmap::DashMap;
use std::sync::Arc;

pub const DEFAULT_DISPATCHER_ID: &str = "default-dispatcher";

/// Dispatchers of an actor system, by id.
#[derive(Debug, Clone)]
pub struct Dispatchers {
  default_dispatcher: Dispatcher,
  dispatchers: Arc<DashMap<String, Dispatcher>>,
}

impl Dispatchers {
  pub fn new(default_dispatcher: Dispatcher) -> Self {
    let dispatchers = DashMap::new();
    dispatchers.insert(DEFAULT_DISPATCHER_ID.to_owned(), default_dispatcher.clone());
    dispatchers.insert(default_dispatcher.id().to_owned(), default_dispatcher.clone());
    Self {
      default_dispatcher,
      dispatchers: Arc::new(dispatchers),
    }
  }

  pub fn default_dispatcher(&self) -> &Dispatcher {
    &self.default_dispatcher
  }

  pub fn register(&self, dispatcher: Dispatcher) {
    log::debug!("Registering dispatcher [{}]", dispatcher.id());
    self.dispatchers.insert(dispatcher.id().to_owned(), dispatcher);
  }

  pub fn has_dispatcher(&self, id: &str) -> bool {
    self.dispatchers.contains_key(id)
  }

  pub fn lookup(&self, id: &str) -> Result<Dispatcher, ActuatorError> {
    self
      .dispatchers
      .get(id)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| ActuatorError::DispatcherNotFound { id: id.to_owned() })
  }

  pub fn shutdown(&self) {
    for entry in self.dispatchers.iter() {
      entry.value().shutdown();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::dispatch::executor::inline_executor::InlineExecutor;

  #[test]
  fn test_lookup() {
    let executor = Arc::new(InlineExecutor::new());
    let dispatchers = Dispatchers::new(Dispatcher::new(DEFAULT_DISPATCHER_ID, 5, None, executor.clone()));
    dispatchers.register(Dispatcher::new("pinned", 1, None, executor));
    assert_eq!(dispatchers.lookup(DEFAULT_DISPATCHER_ID).unwrap().throughput(), 5);
    assert_eq!(dispatchers.lookup("pinned").unwrap().throughput(), 1);
    assert!(dispatchers.has_dispatcher("pinned"));
    assert!(matches!(
      dispatchers.lookup("missing"),
      Err(ActuatorError::DispatcherNotFound { .. })
    ));
  }
}
