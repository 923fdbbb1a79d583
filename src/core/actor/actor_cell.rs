use crate::core::actor::actor_context::ActorContext;
use crate::core::actor::actor_path::ActorPath;
use crate::core::actor::actor_ref::local_actor_ref::LocalActorRef;
use crate::core::actor::actor_ref::ActorRef;
use crate::core::actor::props::Props;
use crate::core::actor::{ActorBehavior, ActorError, ActorResult};
use crate::core::dispatch::dead_letters::DeadLetters;
use crate::core::dispatch::dispatcher::{Dispatcher, DispatcherBehavior};
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::mailbox::Mailbox;
use crate::core::dispatch::mailbox::mailbox_type::MailboxType;
use crate::core::dispatch::mailbox::{panic_message, MailboxError, MessageInvoker};
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use crate::core::dispatch::system_message::system_message::SystemMessage;
use crate::infrastructure::logging_mutex::LoggingMutex;
use crate::mutex_lock_with_log;
use crate::ActuatorError;
use rand::{thread_rng, RngCore};
use std::fmt::{Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub const UNDEFINED_UID: u32 = 0;

pub fn new_uid() -> u32 {
  loop {
    let uid = thread_rng().next_u32();
    if uid != UNDEFINED_UID {
      return uid;
    }
  }
}

/// Messages the cell handles itself instead of passing them to the actor.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoReceivedMessage {
  PoisonPill,
  Kill,
}

/// Delivered to a watcher after the watched actor has stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminated {
  pub actor: ActorRef,
  pub existence_confirmed: bool,
}

fn catch_actor_panic<F>(f: F) -> ActorResult<()>
where
  F: FnOnce() -> ActorResult<()>, {
  panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
    Err(ActorError::ActorPanicked {
      message: panic_message(payload.as_ref()),
    })
  })
}

/// Runtime context of one actor: owns the mailbox and the current actor instance, and interprets system
/// messages.
pub struct ActorCell {
  path: ActorPath,
  props: Props,
  dispatcher: Dispatcher,
  mailbox: Mailbox,
  actor: LoggingMutex<Option<Box<dyn ActorBehavior>>>,
  watched_by: LoggingMutex<Vec<ActorRef>>,
  started: AtomicBool,
  terminated: AtomicBool,
  myself: Weak<ActorCell>,
}

impl Debug for ActorCell {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ActorCell")
      .field("path", &self.path)
      .field("props", &self.props)
      .field("mailbox", &self.mailbox)
      .field("terminated", &self.is_terminated())
      .finish()
  }
}

impl ActorCell {
  pub fn new(
    path: ActorPath,
    props: Props,
    dispatcher: Dispatcher,
    mailbox_type: &MailboxType,
    dead_letters: DeadLetters,
  ) -> Result<Arc<Self>, ActuatorError> {
    let mailbox = dispatcher.create_mailbox(mailbox_type, dead_letters)?;
    let cell = Arc::new_cyclic(|myself| ActorCell {
      path,
      props,
      dispatcher,
      mailbox,
      actor: LoggingMutex::new("ActorCell#actor", None),
      watched_by: LoggingMutex::new("ActorCell#watched_by", Vec::new()),
      started: AtomicBool::new(false),
      terminated: AtomicBool::new(false),
      myself: myself.clone(),
    });
    let invoker = Arc::downgrade(&cell) as Weak<dyn MessageInvoker>;
    cell.mailbox.set_actor(invoker)?;
    Ok(cell)
  }

  pub fn path(&self) -> &ActorPath {
    &self.path
  }

  pub fn props(&self) -> &Props {
    &self.props
  }

  pub fn dispatcher(&self) -> &Dispatcher {
    &self.dispatcher
  }

  pub fn mailbox(&self) -> &Mailbox {
    &self.mailbox
  }

  pub fn is_terminated(&self) -> bool {
    self.terminated.load(Ordering::Acquire)
  }

  pub fn has_messages(&self) -> bool {
    self.mailbox.has_messages()
  }

  pub fn number_of_messages(&self) -> usize {
    self.mailbox.number_of_messages()
  }

  // --- lifecycle, callable from any thread

  /// Enqueues `Create` and attaches the mailbox. Later calls do nothing.
  pub fn start(&self) {
    if self.started.swap(true, Ordering::AcqRel) {
      log::debug!("{} is already started", self.path);
      return;
    }
    self.mailbox.system_enqueue(&self.self_ref(), SystemMessage::of_create());
    self.dispatcher.attach(&self.mailbox);
  }

  pub fn suspend(&self) {
    self.send_system_message(SystemMessage::of_suspend());
  }

  pub fn resume(&self, caused_by_failure: Option<ActorError>) {
    self.send_system_message(SystemMessage::Resume { caused_by_failure });
  }

  /// Suspends the mailbox and replaces the actor instance; the mailbox resumes once the new instance is up.
  pub fn restart(&self, cause: ActorError) {
    self.send_system_message(SystemMessage::of_suspend());
    self.send_system_message(SystemMessage::of_recreate(cause));
  }

  pub fn stop(&self) {
    self.send_system_message(SystemMessage::of_terminate());
  }

  pub fn send_message(&self, envelope: Envelope) -> Result<(), MailboxError> {
    self.dispatcher.dispatch(&self.self_ref(), &self.mailbox, envelope)
  }

  pub fn send_system_message(&self, message: SystemMessage) {
    self
      .dispatcher
      .system_dispatch(&self.self_ref(), &self.mailbox, message);
  }

  // --- message handling, called by the mailbox runner only

  fn context(&self, sender: ActorRef) -> ActorContext {
    ActorContext::new(self.self_ref(), sender)
  }

  fn auto_receive_message(&self, message: &AutoReceivedMessage) {
    match message {
      AutoReceivedMessage::PoisonPill => {
        log::debug!("{} received PoisonPill", self.path);
        self.stop();
      }
      AutoReceivedMessage::Kill => {
        log::error!("{} failed: {}", self.path, ActorError::ActorKilled);
        self.stop();
      }
    }
  }

  fn create(&self) {
    if self.is_terminated() {
      return;
    }
    let mut ctx = self.context(ActorRef::NoSender);
    let result = {
      let mut actor = mutex_lock_with_log!(self.actor, "create");
      if actor.is_some() {
        log::warn!("{} received Create while already created", self.path);
        return;
      }
      match self.props.new_actor() {
        Ok(mut instance) => {
          let result = catch_actor_panic(|| instance.around_pre_start(&mut ctx));
          *actor = Some(instance);
          result
        }
        Err(err) => Err(err),
      }
    };
    match result {
      Ok(()) => log::debug!("{} started", self.path),
      Err(err) => {
        log::error!("{} failed to start: {}", self.path, err);
        self.stop();
      }
    }
  }

  fn fault_suspend(&self) {
    self.dispatcher.suspend(&self.mailbox);
  }

  fn fault_resume(&self, caused_by_failure: Option<ActorError>) {
    if let Some(cause) = caused_by_failure {
      log::debug!("{} resuming after failure: {}", self.path, cause);
    }
    self.dispatcher.resume(&self.mailbox);
  }

  fn fault_recreate(&self, cause: ActorError) {
    if self.is_terminated() {
      return;
    }
    let mut ctx = self.context(ActorRef::NoSender);
    let recreated = {
      let mut actor = mutex_lock_with_log!(self.actor, "fault_recreate");
      if let Some(old) = actor.as_mut() {
        if let Err(err) = catch_actor_panic(|| old.pre_restart(&mut ctx, &cause)) {
          log::error!("{} failed in pre_restart: {}", self.path, err);
        }
      }
      *actor = None;
      match self.props.new_actor() {
        Ok(mut fresh) => {
          if let Err(err) = catch_actor_panic(|| fresh.post_restart(&mut ctx, &cause)) {
            log::error!("{} failed in post_restart: {}", self.path, err);
          }
          *actor = Some(fresh);
          true
        }
        Err(err) => {
          log::error!("{} could not be recreated: {}", self.path, err);
          false
        }
      }
    };
    if recreated {
      log::debug!("{} restarted after: {}", self.path, cause);
      self.dispatcher.resume(&self.mailbox);
    } else {
      self.stop();
    }
  }

  fn terminate(&self) {
    if self.terminated.swap(true, Ordering::AcqRel) {
      return;
    }
    let self_ref = self.self_ref();
    let instance = mutex_lock_with_log!(self.actor, "terminate").take();
    if let Some(mut instance) = instance {
      let mut ctx = self.context(ActorRef::NoSender);
      if let Err(err) = catch_actor_panic(|| instance.around_post_stop(&mut ctx)) {
        log::error!("{} failed in post_stop: {}", self.path, err);
      }
    }
    self.dispatcher.detach(&self.mailbox);
    let watchers = std::mem::take(&mut *mutex_lock_with_log!(self.watched_by, "terminate"));
    for watcher in watchers {
      watcher.send_system_message(SystemMessage::of_death_watch_notification(self_ref.clone(), true));
    }
    log::debug!("{} stopped", self.path);
  }

  fn add_watcher(&self, watchee: ActorRef, watcher: ActorRef) {
    let self_ref = self.self_ref();
    if watchee != self_ref || watcher == self_ref || watcher.is_no_sender() {
      log::warn!("{} ignoring Watch({}, {})", self.path, watchee, watcher);
      return;
    }
    let mut watched_by = mutex_lock_with_log!(self.watched_by, "add_watcher");
    if !watched_by.contains(&watcher) {
      log::debug!("{} is now watched by {}", self.path, watcher);
      watched_by.push(watcher);
    }
  }

  fn remove_watcher(&self, watchee: ActorRef, watcher: ActorRef) {
    if watchee != self.self_ref() {
      return;
    }
    mutex_lock_with_log!(self.watched_by, "remove_watcher").retain(|w| *w != watcher);
  }

  fn watched_actor_terminated(&self, actor: ActorRef, existence_confirmed: bool) {
    let terminated = Terminated {
      actor,
      existence_confirmed,
    };
    if let Err(err) = self.send_message(Envelope::new_with_sender(terminated, ActorRef::NoSender)) {
      log::warn!("{} could not enqueue Terminated: {}", self.path, err);
    }
  }
}

impl MessageInvoker for ActorCell {
  fn invoke(&self, envelope: Envelope) {
    if let Some(auto) = envelope.message().downcast_ref::<AutoReceivedMessage>() {
      self.auto_receive_message(auto);
      return;
    }
    let (message, sender) = envelope.into_parts();
    let type_name = message.type_name();
    let mut ctx = self.context(sender.clone());
    let outcome = {
      let mut actor = mutex_lock_with_log!(self.actor, "invoke");
      match actor.as_mut() {
        Some(instance) => Ok(catch_actor_panic(|| instance.around_receive(&mut ctx, message))),
        None => Err(message),
      }
    };
    match outcome {
      Ok(Ok(())) => {}
      Ok(Err(err)) => log::error!("{} failed to process [{}]: {}", self.path, type_name, err),
      Err(message) => {
        let _ = self
          .mailbox
          .dead_letters()
          .enqueue(&self.self_ref(), Envelope::of_any(message, sender));
      }
    }
  }

  fn system_invoke(&self, message: SystemMessage) {
    match message {
      SystemMessage::Create => self.create(),
      SystemMessage::Suspend => self.fault_suspend(),
      SystemMessage::Resume { caused_by_failure } => self.fault_resume(caused_by_failure),
      SystemMessage::Recreate { cause } => self.fault_recreate(cause),
      SystemMessage::Terminate => self.terminate(),
      SystemMessage::Watch { watchee, watcher } => self.add_watcher(watchee, watcher),
      SystemMessage::Unwatch { watchee, watcher } => self.remove_watcher(watchee, watcher),
      SystemMessage::DeathWatchNotification {
        actor,
        existence_confirmed,
      } => self.watched_actor_terminated(actor, existence_confirmed),
    }
  }

  fn self_ref(&self) -> ActorRef {
    self
      .myself
      .upgrade()
      .map(|cell| ActorRef::of_local(LocalActorRef::new(cell)))
      .unwrap_or(ActorRef::NoSender)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::actor::TypedActorBehavior;
  use crate::core::dispatch::any_message::AnyMessage;
  use crate::core::dispatch::executor::inline_executor::InlineExecutor;
  use std::env;

  fn init_logger() {
    env::set_var("RUST_LOG", "debug");
    let _ = env_logger::builder().is_test(true).try_init();
  }

  type Journal = Arc<LoggingMutex<Vec<String>>>;

  fn journal() -> Journal {
    Arc::new(LoggingMutex::new("journal", Vec::new()))
  }

  fn entries(journal: &Journal) -> Vec<String> {
    mutex_lock_with_log!(journal, "entries").clone()
  }

  struct LifecycleActor {
    journal: Journal,
  }

  impl LifecycleActor {
    fn record(&self, entry: String) {
      mutex_lock_with_log!(self.journal, "record").push(entry);
    }
  }

  impl ActorBehavior for LifecycleActor {
    fn receive(&mut self, ctx: &mut ActorContext, msg: AnyMessage) -> ActorResult<()> {
      if let Some(text) = msg.downcast_ref::<String>() {
        match text.as_str() {
          "fail" => return Err(ActorError::of_failed("asked to fail")),
          "panic" => panic!("asked to panic"),
          "stop" => ctx.stop(),
          _ => {}
        }
        self.record(format!("receive:{}", text));
      } else if let Some(terminated) = msg.downcast_ref::<Terminated>() {
        self.record(format!("terminated:{}", terminated.actor.path().map(|p| p.name()).unwrap_or("?")));
      }
      Ok(())
    }

    fn pre_start(&mut self, _ctx: &mut ActorContext) -> ActorResult<()> {
      self.record("pre_start".to_owned());
      Ok(())
    }

    fn pre_restart(&mut self, _ctx: &mut ActorContext, reason: &ActorError) -> ActorResult<()> {
      self.record(format!("pre_restart:{}", reason));
      Ok(())
    }

    fn post_restart(&mut self, _ctx: &mut ActorContext, _reason: &ActorError) -> ActorResult<()> {
      self.record("post_restart".to_owned());
      Ok(())
    }

    fn post_stop(&mut self, _ctx: &mut ActorContext) -> ActorResult<()> {
      self.record("post_stop".to_owned());
      Ok(())
    }
  }

  fn dispatcher() -> Dispatcher {
    Dispatcher::new("inline", 10, None, Arc::new(InlineExecutor::new()))
  }

  fn new_cell(name: &str, journal: &Journal, dispatcher: &Dispatcher, dead_letters: &DeadLetters) -> Arc<ActorCell> {
    let journal = journal.clone();
    let path = ActorPath::of_root("test").with_child(name, new_uid());
    ActorCell::new(
      path,
      Props::new(move || LifecycleActor {
        journal: journal.clone(),
      }),
      dispatcher.clone(),
      &MailboxType::of_unbounded(),
      dead_letters.clone(),
    )
    .unwrap()
  }

  #[test]
  fn test_new_uid_is_defined() {
    assert_ne!(new_uid(), UNDEFINED_UID);
  }

  #[test]
  fn test_start_receive_stop() {
    init_logger();
    let journal = journal();
    let dead_letters = DeadLetters::new();
    let cell = new_cell("a", &journal, &dispatcher(), &dead_letters);
    cell.start();
    cell.start();
    cell.send_message(Envelope::new("hello".to_owned())).unwrap();
    cell.stop();
    assert!(cell.is_terminated());
    assert!(cell.mailbox().is_closed());
    assert_eq!(entries(&journal), vec!["pre_start", "receive:hello", "post_stop"]);
    cell.send_message(Envelope::new("late".to_owned())).unwrap();
    assert_eq!(dead_letters.count(), 1);
  }

  #[test]
  fn test_failures_do_not_stop_processing() {
    init_logger();
    let journal = journal();
    let cell = new_cell("b", &journal, &dispatcher(), &DeadLetters::new());
    cell.start();
    for text in ["fail", "panic", "after"] {
      cell.send_message(Envelope::new(text.to_owned())).unwrap();
    }
    assert!(!cell.is_terminated());
    assert_eq!(entries(&journal), vec!["pre_start", "receive:after"]);
  }

  #[test]
  fn test_restart_replaces_instance_and_resumes() {
    init_logger();
    let journal = journal();
    let cell = new_cell("c", &journal, &dispatcher(), &DeadLetters::new());
    cell.start();
    cell.restart(ActorError::of_failed("boom"));
    assert!(!cell.mailbox().is_suspended());
    cell.send_message(Envelope::new("again".to_owned())).unwrap();
    assert_eq!(
      entries(&journal),
      vec!["pre_start", "pre_restart:Actor failed: boom", "post_restart", "receive:again"]
    );
  }

  #[test]
  fn test_suspend_holds_user_messages_until_resume() {
    init_logger();
    let journal = journal();
    let cell = new_cell("d", &journal, &dispatcher(), &DeadLetters::new());
    cell.start();
    cell.suspend();
    cell.send_message(Envelope::new("held".to_owned())).unwrap();
    assert_eq!(entries(&journal), vec!["pre_start"]);
    assert_eq!(cell.number_of_messages(), 1);
    cell.resume(None);
    assert_eq!(entries(&journal), vec!["pre_start", "receive:held"]);
  }

  #[test]
  fn test_poison_pill_and_stop_from_inside() {
    init_logger();
    let journal = journal();
    let dispatcher = dispatcher();
    let dead_letters = DeadLetters::new();
    let first = new_cell("e", &journal, &dispatcher, &dead_letters);
    first.start();
    first.send_message(Envelope::new(AutoReceivedMessage::PoisonPill)).unwrap();
    assert!(first.is_terminated());

    let second = new_cell("f", &journal, &dispatcher, &dead_letters);
    second.start();
    second.send_message(Envelope::new("stop".to_owned())).unwrap();
    assert!(second.is_terminated());
  }

  #[test]
  fn test_death_watch() {
    init_logger();
    let journal = journal();
    let dispatcher = dispatcher();
    let dead_letters = DeadLetters::new();
    let watcher = new_cell("watcher", &journal, &dispatcher, &dead_letters);
    let watchee = new_cell("watchee", &journal, &dispatcher, &dead_letters);
    watcher.start();
    watchee.start();
    watchee.send_system_message(SystemMessage::of_watch(watchee.self_ref(), watcher.self_ref()));
    watchee.stop();
    assert!(entries(&journal).contains(&"terminated:watchee".to_owned()));

    // watching something already gone still produces Terminated
    mutex_lock_with_log!(journal, "clear").clear();
    watchee.send_system_message(SystemMessage::of_watch(watchee.self_ref(), watcher.self_ref()));
    assert_eq!(entries(&journal), vec!["terminated:watchee"]);
  }

  struct Counter {
    total: u64,
    journal: Journal,
  }

  impl TypedActorBehavior<u64> for Counter {
    fn receive(&mut self, _ctx: &mut ActorContext, msg: u64) -> ActorResult<()> {
      self.total += msg;
      mutex_lock_with_log!(self.journal, "receive").push(format!("total:{}", self.total));
      Ok(())
    }
  }

  #[test]
  fn test_typed_actor_ignores_other_types() {
    init_logger();
    let journal = journal();
    let cloned = journal.clone();
    let cell = ActorCell::new(
      ActorPath::of_root("test").with_child("counter", new_uid()),
      Props::of_typed::<u64, _, _>(move || Counter {
        total: 0,
        journal: cloned.clone(),
      }),
      dispatcher(),
      &MailboxType::of_unbounded(),
      DeadLetters::new(),
    )
    .unwrap();
    cell.start();
    cell.send_message(Envelope::new(2u64)).unwrap();
    cell.send_message(Envelope::new("not a number")).unwrap();
    cell.send_message(Envelope::new(3u64)).unwrap();
    assert_eq!(entries(&journal), vec!["total:2", "total:5"]);
  }
}
