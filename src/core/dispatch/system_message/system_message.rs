use crate::core::actor::actor_ref::ActorRef;
use crate::core::actor::ActorError;

/// Control messages. They bypass suspension and always run before user messages.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemMessage {
  Create,
  Recreate {
    cause: ActorError,
  },
  Suspend,
  Resume {
    caused_by_failure: Option<ActorError>,
  },
  Terminate,
  Watch {
    watchee: ActorRef,
    watcher: ActorRef,
  },
  Unwatch {
    watchee: ActorRef,
    watcher: ActorRef,
  },
  DeathWatchNotification {
    actor: ActorRef,
    existence_confirmed: bool,
  },
}

impl SystemMessage {
  pub fn of_create() -> Self {
    SystemMessage::Create
  }

  pub fn of_recreate(cause: ActorError) -> Self {
    SystemMessage::Recreate { cause }
  }

  pub fn of_suspend() -> Self {
    SystemMessage::Suspend
  }

  pub fn of_resume() -> Self {
    SystemMessage::Resume {
      caused_by_failure: None,
    }
  }

  pub fn of_resume_with_failure(caused_by_failure: ActorError) -> Self {
    SystemMessage::Resume {
      caused_by_failure: Some(caused_by_failure),
    }
  }

  pub fn of_terminate() -> Self {
    SystemMessage::Terminate
  }

  pub fn of_watch(watchee: ActorRef, watcher: ActorRef) -> Self {
    SystemMessage::Watch { watchee, watcher }
  }

  pub fn of_unwatch(watchee: ActorRef, watcher: ActorRef) -> Self {
    SystemMessage::Unwatch { watchee, watcher }
  }

  pub fn of_death_watch_notification(actor: ActorRef, existence_confirmed: bool) -> Self {
    SystemMessage::DeathWatchNotification {
      actor,
      existence_confirmed,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      SystemMessage::Create => "Create",
      SystemMessage::Recreate { .. } => "Recreate",
      SystemMessage::Suspend => "Suspend",
      SystemMessage::Resume { .. } => "Resume",
      SystemMessage::Terminate => "Terminate",
      SystemMessage::Watch { .. } => "Watch",
      SystemMessage::Unwatch { .. } => "Unwatch",
      SystemMessage::DeathWatchNotification { .. } => "DeathWatchNotification",
    }
  }
}
