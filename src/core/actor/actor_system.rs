use crate::core::actor::actor_cell::{new_uid, ActorCell, UNDEFINED_UID};
use crate::core::actor::actor_factory_registry::ActorFactoryRegistry;
use crate::core::actor::actor_path::ActorPath;
use crate::core::actor::actor_ref::dead_letters_ref::DeadLettersRef;
use crate::core::actor::actor_ref::local_actor_ref::LocalActorRef;
use crate::core::actor::actor_ref::ActorRef;
use crate::core::actor::props::Props;
use crate::core::dispatch::any_message::AnyMessage;
use crate::core::dispatch::dead_letters::{DeadLetter, DeadLetters};
use crate::core::dispatch::dispatcher::Dispatcher;
use crate::core::dispatch::dispatchers::{Dispatchers, DEFAULT_DISPATCHER_ID};
use crate::core::dispatch::executor::inline_executor::InlineExecutor;
use crate::core::dispatch::executor::tokio_executor::TokioExecutor;
use crate::core::dispatch::executor::ExecutorBehavior;
use crate::core::dispatch::mailbox::mailbox_type::MailboxType;
use crate::core::dispatch::mailboxes::Mailboxes;
use crate::core::settings::{ExecutorKind, Settings};
use crate::infrastructure::logging_mutex::LoggingMutex;
use crate::mutex_lock_with_log;
use crate::ActuatorError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Runtime};

static SYSTEM_NAME_PATTERN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-_]*$").expect("system name pattern is valid"));

const USER_GUARDIAN_NAME: &str = "user";
const DEAD_LETTERS_NAME: &str = "deadLetters";
const TERMINATION_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct ActorSystemInner {
  name: String,
  start_time: Instant,
  settings: Settings,
  runtime: LoggingMutex<Option<Runtime>>,
  dispatchers: Dispatchers,
  mailboxes: Mailboxes,
  registry: ActorFactoryRegistry,
  user_guardian_path: ActorPath,
  actors: DashMap<String, ActorRef>,
  dead_letters_ref: ActorRef,
  terminated: AtomicBool,
}

/// Owns the worker pool, the dispatchers, the mailbox registry and the top-level actors.
///
/// Cloning yields another handle to the same system. `terminate` must be called from outside the worker
/// runtime.
#[derive(Clone)]
pub struct ActorSystem {
  inner: Arc<ActorSystemInner>,
}

impl Debug for ActorSystem {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ActorSystem")
      .field("name", &self.inner.name)
      .field("settings", &self.inner.settings)
      .field("actors", &self.inner.actors.len())
      .field("terminated", &self.is_terminated())
      .finish()
  }
}

fn build_runtime(name: &str, worker_threads: usize) -> Result<Runtime, ActuatorError> {
  let runtime = Builder::new_multi_thread()
    .worker_threads(worker_threads)
    .thread_name(format!("{}-worker", name))
    .enable_all()
    .build()?;
  Ok(runtime)
}

impl ActorSystem {
  pub fn new(name: &str, settings: Settings, registry: ActorFactoryRegistry) -> Result<Self, ActuatorError> {
    if !SYSTEM_NAME_PATTERN.is_match(name) {
      return Err(ActuatorError::InvalidActorSystemName { name: name.to_owned() });
    }

    let (executor, runtime): (Arc<dyn ExecutorBehavior>, Option<Runtime>) = match settings.executor() {
      ExecutorKind::Tokio => {
        let runtime = build_runtime(name, settings.worker_threads())?;
        (Arc::new(TokioExecutor::new(runtime.handle().clone())), Some(runtime))
      }
      ExecutorKind::Inline => (Arc::new(InlineExecutor::new()), None),
    };

    let default_settings = settings.default_dispatcher();
    let dispatchers = Dispatchers::new(Dispatcher::new(
      DEFAULT_DISPATCHER_ID,
      default_settings.throughput,
      default_settings.throughput_deadline,
      executor.clone(),
    ));
    for dispatcher in settings.dispatchers() {
      dispatchers.register(Dispatcher::new(
        &dispatcher.id,
        dispatcher.throughput,
        dispatcher.throughput_deadline,
        executor.clone(),
      ));
    }

    let dead_letters = DeadLetters::new();
    let mailboxes = Mailboxes::new(settings.default_mailbox().clone(), dead_letters.clone());
    for (id, mailbox_type) in settings.mailboxes() {
      mailboxes.register(id, mailbox_type.clone());
    }

    let root_path = ActorPath::of_root(name);
    let dead_letters_ref = ActorRef::of_dead_letters(DeadLettersRef::new(
      root_path.with_child(DEAD_LETTERS_NAME, UNDEFINED_UID),
      dead_letters,
    ));

    log::info!("ActorSystem [{}] started with {:?} executor", name, settings.executor());
    Ok(Self {
      inner: Arc::new(ActorSystemInner {
        name: name.to_owned(),
        start_time: Instant::now(),
        runtime: LoggingMutex::new("ActorSystem#runtime", runtime),
        dispatchers,
        mailboxes,
        registry,
        user_guardian_path: root_path.with_child(USER_GUARDIAN_NAME, UNDEFINED_UID),
        actors: DashMap::new(),
        dead_letters_ref,
        terminated: AtomicBool::new(false),
        settings,
      }),
    })
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn start_time(&self) -> Instant {
    self.inner.start_time
  }

  pub fn uptime(&self) -> Duration {
    self.inner.start_time.elapsed()
  }

  pub fn settings(&self) -> &Settings {
    &self.inner.settings
  }

  pub fn dispatchers(&self) -> &Dispatchers {
    &self.inner.dispatchers
  }

  pub fn mailboxes(&self) -> &Mailboxes {
    &self.inner.mailboxes
  }

  pub fn registry(&self) -> &ActorFactoryRegistry {
    &self.inner.registry
  }

  pub fn dead_letters(&self) -> ActorRef {
    self.inner.dead_letters_ref.clone()
  }

  pub fn dead_letters_count(&self) -> usize {
    self.inner.mailboxes.dead_letters().count()
  }

  pub fn subscribe_dead_letters<F>(&self, f: F)
  where
    F: Fn(&DeadLetter) + Send + Sync + 'static, {
    self.inner.mailboxes.dead_letters().subscribe(f);
  }

  pub fn is_terminated(&self) -> bool {
    self.inner.terminated.load(Ordering::SeqCst)
  }

  fn resolve_dispatcher(&self, props: &Props) -> Result<Dispatcher, ActuatorError> {
    match props.dispatcher_id() {
      Some(id) => self.inner.dispatchers.lookup(id),
      None => Ok(self.inner.dispatchers.default_dispatcher().clone()),
    }
  }

  fn resolve_mailbox_type(&self, props: &Props) -> Result<MailboxType, ActuatorError> {
    if let Some(mailbox_type) = props.mailbox_type() {
      return Ok(mailbox_type.clone());
    }
    match props.mailbox_id() {
      Some(id) => self
        .inner
        .mailboxes
        .lookup(id)
        .ok_or_else(|| ActuatorError::MailboxNotFound { id: id.to_owned() }),
      None => Ok(self.inner.mailboxes.default_mailbox_type().clone()),
    }
  }

  fn new_actor_ref(&self, props: Props, name: &str) -> Result<ActorRef, ActuatorError> {
    let dispatcher = self.resolve_dispatcher(&props)?;
    let mailbox_type = self.resolve_mailbox_type(&props)?;
    let path = self.inner.user_guardian_path.with_child(name, new_uid());
    let cell = ActorCell::new(
      path,
      props,
      dispatcher,
      &mailbox_type,
      self.inner.mailboxes.dead_letters().clone(),
    )?;
    Ok(ActorRef::of_local(LocalActorRef::new(cell)))
  }

  /// Creates and starts a top-level actor. Names must be unique among live top-level actors.
  pub fn actor_of(&self, props: Props, name: &str) -> Result<ActorRef, ActuatorError> {
    if self.is_terminated() {
      return Err(ActuatorError::ActorSystemTerminated {
        name: self.inner.name.clone(),
      });
    }
    ActorPath::validate_path_element(name)?;
    let actor_ref = match self.inner.actors.entry(name.to_owned()) {
      Entry::Occupied(entry) if !entry.get().is_terminated() => {
        return Err(ActuatorError::ActorNameAlreadyInUse { name: name.to_owned() });
      }
      Entry::Occupied(mut entry) => {
        let actor_ref = self.new_actor_ref(props, name)?;
        entry.insert(actor_ref.clone());
        actor_ref
      }
      Entry::Vacant(entry) => {
        let actor_ref = self.new_actor_ref(props, name)?;
        entry.insert(actor_ref.clone());
        actor_ref
      }
    };
    // a concurrent terminate may have taken its snapshot of the actors before the insert
    if self.is_terminated() {
      self.inner.actors.remove_if(name, |_, registered| registered == &actor_ref);
      actor_ref.stop();
      return Err(ActuatorError::ActorSystemTerminated {
        name: self.inner.name.clone(),
      });
    }
    actor_ref.start();
    log::debug!("created {}", actor_ref);
    Ok(actor_ref)
  }

  /// Creates a top-level actor from a kind registered in the factory registry.
  pub fn actor_of_kind(&self, kind: &str, args: Vec<AnyMessage>, name: &str) -> Result<ActorRef, ActuatorError> {
    let props = self.inner.registry.props_of(kind, args)?;
    self.actor_of(props, name)
  }

  pub fn lookup(&self, name: &str) -> Option<ActorRef> {
    self
      .inner
      .actors
      .get(name)
      .map(|entry| entry.value().clone())
      .filter(|actor_ref| !actor_ref.is_terminated())
  }

  pub fn stop(&self, actor_ref: &ActorRef) {
    actor_ref.stop();
    if let Some(path) = actor_ref.path() {
      if path.parent() == Some(&self.inner.user_guardian_path) {
        self.inner.actors.remove_if(path.name(), |_, registered| registered == actor_ref);
      }
    }
  }

  /// Stops every top-level actor, waits for them within the shutdown timeout, then shuts the workers down.
  pub fn terminate(&self) {
    if self.inner.terminated.swap(true, Ordering::SeqCst) {
      return;
    }
    let deadline = Instant::now() + self.inner.settings.shutdown_timeout();
    let actors = self
      .inner
      .actors
      .iter()
      .map(|entry| entry.value().clone())
      .collect::<Vec<_>>();
    for actor_ref in &actors {
      actor_ref.stop();
    }
    while actors.iter().any(|actor_ref| !actor_ref.is_terminated()) && Instant::now() < deadline {
      std::thread::sleep(TERMINATION_POLL_INTERVAL);
    }
    let remaining = actors.iter().filter(|actor_ref| !actor_ref.is_terminated()).count();
    if remaining > 0 {
      log::warn!(
        "ActorSystem [{}]: {} actors still running after the shutdown timeout",
        self.inner.name,
        remaining
      );
    }
    self.inner.actors.clear();
    self.inner.dispatchers.shutdown();
    let runtime = mutex_lock_with_log!(self.inner.runtime, "terminate").take();
    if let Some(runtime) = runtime {
      runtime.shutdown_timeout(deadline.saturating_duration_since(Instant::now()));
    }
    log::info!("ActorSystem [{}] terminated after {:?}", self.inner.name, self.uptime());
  }
}
