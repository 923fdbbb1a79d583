use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::dead_letters::DeadLetters;
use crate::core::dispatch::dispatcher::{Dispatcher, DispatcherBehavior};
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::mailbox_status::MailboxStatus;
use crate::core::dispatch::mailbox::{panic_message, MailboxError, MessageInvoker};
use crate::core::dispatch::message_queue::dead_letters_message_queue::DeadLettersMessageQueue;
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use crate::core::dispatch::system_message::system_message::SystemMessage;
use crate::core::dispatch::system_message::system_message_queue::SystemMessageQueue;
use crate::core::dispatch::system_message::SystemMessageQueueBehavior;
use once_cell::sync::OnceCell;
use std::fmt::{Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

struct MailboxInner {
  current_status: AtomicU32,
  message_queue: Arc<dyn MessageQueueBehavior>,
  system_queue: SystemMessageQueue,
  invoker: OnceCell<Weak<dyn MessageInvoker>>,
  dispatcher: Dispatcher,
  dead_letters: DeadLettersMessageQueue,
}

/// Per-actor mailbox: a user queue, a system queue and the packed status word that serializes `run`.
///
/// Cloning yields another handle to the same mailbox.
#[derive(Clone)]
pub struct Mailbox {
  inner: Arc<MailboxInner>,
}

impl Debug for Mailbox {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Mailbox")
      .field("status", &self.status())
      .field("number_of_messages", &self.number_of_messages())
      .field("number_of_system_messages", &self.number_of_system_messages())
      .field("dispatcher", &self.inner.dispatcher.id())
      .finish()
  }
}

impl PartialEq for Mailbox {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

// Clears the scheduled bit and re-checks for work however `run` exits.
struct RunGuard<'a> {
  mailbox: &'a Mailbox,
}

impl Drop for RunGuard<'_> {
  fn drop(&mut self) {
    self.mailbox.set_as_idle();
    self
      .mailbox
      .inner
      .dispatcher
      .register_for_execution(self.mailbox, false, false);
  }
}

impl Mailbox {
  pub fn new(message_queue: Arc<dyn MessageQueueBehavior>, dispatcher: Dispatcher, dead_letters: DeadLetters) -> Self {
    Self {
      inner: Arc::new(MailboxInner {
        current_status: AtomicU32::new(MailboxStatus::OPEN),
        message_queue,
        system_queue: SystemMessageQueue::new(),
        invoker: OnceCell::new(),
        dispatcher,
        dead_letters: DeadLettersMessageQueue::new(dead_letters),
      }),
    }
  }

  /// Wires the invoker. Only the first call succeeds.
  pub fn set_actor(&self, invoker: Weak<dyn MessageInvoker>) -> Result<(), MailboxError> {
    self
      .inner
      .invoker
      .set(invoker)
      .map_err(|_| MailboxError::ActorAlreadySet)
  }

  pub fn dispatcher(&self) -> &Dispatcher {
    &self.inner.dispatcher
  }

  pub fn dead_letters(&self) -> &DeadLettersMessageQueue {
    &self.inner.dead_letters
  }

  fn invoker(&self) -> Option<Arc<dyn MessageInvoker>> {
    self.inner.invoker.get().and_then(Weak::upgrade)
  }

  fn owner(&self) -> ActorRef {
    self
      .invoker()
      .map(|invoker| invoker.self_ref())
      .unwrap_or(ActorRef::NoSender)
  }

  // --- status word

  pub fn status(&self) -> MailboxStatus {
    MailboxStatus::from_bits(self.inner.current_status.load(Ordering::Acquire))
  }

  fn update_status(&self, old: u32, new: u32) -> bool {
    self
      .inner
      .current_status
      .compare_exchange(old, new, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  fn set_status(&self, value: u32) {
    self.inner.current_status.store(value, Ordering::Release);
  }

  pub fn should_process_message(&self) -> bool {
    self.status().should_process_message()
  }

  pub fn is_suspended(&self) -> bool {
    self.status().is_suspended()
  }

  pub fn is_closed(&self) -> bool {
    self.status().is_closed()
  }

  pub fn is_scheduled(&self) -> bool {
    self.status().is_scheduled()
  }

  pub fn suspend_count(&self) -> u32 {
    self.status().suspend_count()
  }

  /// Adds one suspension level. Returns true when the mailbox was not suspended before this call.
  pub fn suspend(&self) -> bool {
    loop {
      let s = self.inner.current_status.load(Ordering::Acquire);
      if MailboxStatus::from_bits(s).is_closed() {
        self.set_status(MailboxStatus::CLOSED);
        return false;
      }
      if self.update_status(s, s + MailboxStatus::SUSPEND_UNIT) {
        log::debug!("suspend: suspend_count = {}", s / MailboxStatus::SUSPEND_UNIT + 1);
        return s < MailboxStatus::SUSPEND_UNIT;
      }
    }
  }

  /// Removes one suspension level, never going below zero. Returns true when fully resumed.
  pub fn resume(&self) -> bool {
    loop {
      let s = self.inner.current_status.load(Ordering::Acquire);
      if MailboxStatus::from_bits(s).is_closed() {
        self.set_status(MailboxStatus::CLOSED);
        return false;
      }
      let next = if s < MailboxStatus::SUSPEND_UNIT {
        s
      } else {
        s - MailboxStatus::SUSPEND_UNIT
      };
      if self.update_status(s, next) {
        log::debug!("resume: suspend_count = {}", next / MailboxStatus::SUSPEND_UNIT);
        return next < MailboxStatus::SUSPEND_UNIT;
      }
    }
  }

  /// Closes the mailbox for good. Only the caller that performed the transition gets true.
  pub fn become_closed(&self) -> bool {
    loop {
      let s = self.inner.current_status.load(Ordering::Acquire);
      if MailboxStatus::from_bits(s).is_closed() {
        self.set_status(MailboxStatus::CLOSED);
        return false;
      }
      if self.update_status(s, MailboxStatus::CLOSED) {
        log::debug!("become_closed: {}", self.inner.dispatcher.id());
        return true;
      }
    }
  }

  /// Claims the right to run. Fails when already scheduled or closed; suspension does not matter.
  pub fn set_as_scheduled(&self) -> bool {
    loop {
      let s = self.inner.current_status.load(Ordering::Acquire);
      if s & MailboxStatus::SHOULD_SCHEDULE_MASK != MailboxStatus::OPEN {
        return false;
      }
      if self.update_status(s, s | MailboxStatus::SCHEDULED) {
        return true;
      }
    }
  }

  pub fn set_as_idle(&self) {
    loop {
      let s = self.inner.current_status.load(Ordering::Acquire);
      if self.update_status(s, s & !MailboxStatus::SCHEDULED) {
        return;
      }
    }
  }

  pub fn can_be_scheduled_for_execution(&self, has_message_hint: bool, has_system_message_hint: bool) -> bool {
    let status = self.status();
    if status.is_closed() {
      false
    } else if status.is_suspended() {
      has_system_message_hint || self.has_system_messages()
    } else {
      has_message_hint || has_system_message_hint || self.has_system_messages() || self.has_messages()
    }
  }

  // --- queues

  /// Appends a user message. A closed mailbox forwards it to dead letters instead.
  pub fn enqueue(&self, receiver: &ActorRef, envelope: Envelope) -> Result<(), MailboxError> {
    if self.is_closed() {
      return self.inner.dead_letters.enqueue(receiver, envelope);
    }
    self.inner.message_queue.enqueue(receiver, envelope)?;
    if self.is_closed() {
      // closed while we were appending; whoever drains first wins each message
      self.inner.message_queue.clean_up(receiver, &self.inner.dead_letters);
    }
    Ok(())
  }

  pub fn system_enqueue(&self, receiver: &ActorRef, message: SystemMessage) {
    if self.is_closed() {
      self.inner.dead_letters.system_enqueue(receiver, message);
      return;
    }
    self.inner.system_queue.system_enqueue(message);
    if self.is_closed() {
      self.drain_system_messages_to_dead_letters(receiver);
    }
  }

  pub fn dequeue(&self) -> Option<Envelope> {
    self.inner.message_queue.dequeue()
  }

  pub fn has_messages(&self) -> bool {
    self.inner.message_queue.has_messages()
  }

  pub fn number_of_messages(&self) -> usize {
    self.inner.message_queue.number_of_messages()
  }

  pub fn has_system_messages(&self) -> bool {
    self.inner.system_queue.has_system_messages()
  }

  pub fn number_of_system_messages(&self) -> usize {
    self.inner.system_queue.number_of_system_messages()
  }

  fn drain_system_messages_to_dead_letters(&self, receiver: &ActorRef) {
    while let Some(message) = self.inner.system_queue.system_dequeue() {
      self.inner.dead_letters.system_enqueue(receiver, message);
    }
  }

  /// Hands whatever is still queued to dead letters.
  pub fn clean_up(&self) {
    let owner = self.owner();
    self.drain_system_messages_to_dead_letters(&owner);
    self.inner.message_queue.clean_up(&owner, &self.inner.dead_letters);
  }

  // --- processing

  /// Entry point for the executor. Never panics; always leaves the mailbox idle and re-registered.
  pub fn run(&self) {
    let _guard = RunGuard { mailbox: self };
    if self.is_closed() {
      self.clean_up();
      return;
    }
    match self.invoker() {
      Some(invoker) => {
        self.process_all_system_messages(invoker.as_ref());
        self.process_mailbox(invoker.as_ref());
      }
      None => {
        log::warn!(
          "Mailbox on dispatcher {} has no live actor, closing it",
          self.inner.dispatcher.id()
        );
        self.become_closed();
        self.clean_up();
      }
    }
  }

  fn process_all_system_messages(&self, invoker: &dyn MessageInvoker) {
    while !self.is_closed() {
      match self.inner.system_queue.system_dequeue() {
        Some(message) => {
          log::debug!("system_invoke: {}", message.name());
          self.invoke_guarded(invoker, "system_invoke", || invoker.system_invoke(message));
        }
        None => return,
      }
    }
    self.drain_system_messages_to_dead_letters(&invoker.self_ref());
  }

  fn process_mailbox(&self, invoker: &dyn MessageInvoker) {
    let mut left = self.inner.dispatcher.throughput();
    let deadline = self
      .inner
      .dispatcher
      .throughput_deadline()
      .map(|duration| Instant::now() + duration);
    while left > 0 && self.should_process_message() {
      let next = match self.dequeue() {
        Some(next) => next,
        None => break,
      };
      log::debug!("invoke: {:?}", next.message());
      self.invoke_guarded(invoker, "invoke", || invoker.invoke(next));
      self.process_all_system_messages(invoker);
      left -= 1;
      if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
        break;
      }
    }
  }

  fn invoke_guarded<F: FnOnce()>(&self, invoker: &dyn MessageInvoker, what: &'static str, f: F) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
      log::error!(
        "{} of {} panicked: {}",
        what,
        invoker.self_ref(),
        panic_message(payload.as_ref())
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::dispatch::dispatcher::DispatchError;
  use crate::core::dispatch::executor::ExecutorBehavior;
  use crate::core::dispatch::message_queue::unbounded_message_queue::UnboundedMessageQueue;
  use crate::infrastructure::logging_mutex::LoggingMutex;
  use crate::mutex_lock_with_log;
  use std::collections::VecDeque;
  use std::sync::atomic::AtomicUsize;
  use std::time::Duration;
  use std::{env, thread};

  fn init_logger() {
    env::set_var("RUST_LOG", "debug");
    let _ = env_logger::builder().is_test(true).try_init();
  }

  #[derive(Debug)]
  struct QueueingExecutor {
    pending: LoggingMutex<VecDeque<Mailbox>>,
  }

  impl QueueingExecutor {
    fn new() -> Self {
      Self {
        pending: LoggingMutex::new("QueueingExecutor#pending", VecDeque::new()),
      }
    }

    fn run_next(&self) -> bool {
      let next = mutex_lock_with_log!(self.pending, "run_next").pop_front();
      match next {
        Some(mailbox) => {
          mailbox.run();
          true
        }
        None => false,
      }
    }

    fn run_all(&self) -> usize {
      let mut runs = 0;
      while self.run_next() {
        runs += 1;
      }
      runs
    }
  }

  impl ExecutorBehavior for QueueingExecutor {
    fn execute(&self, mailbox: Mailbox) -> Result<(), DispatchError> {
      mutex_lock_with_log!(self.pending, "execute").push_back(mailbox);
      Ok(())
    }
  }

  struct RecordingInvoker {
    received: LoggingMutex<Vec<String>>,
    panics_on: Option<String>,
    invocations: AtomicUsize,
  }

  impl RecordingInvoker {
    fn new(panics_on: Option<&str>) -> Arc<Self> {
      Arc::new(Self {
        received: LoggingMutex::new("RecordingInvoker#received", Vec::new()),
        panics_on: panics_on.map(str::to_owned),
        invocations: AtomicUsize::new(0),
      })
    }

    fn received(&self) -> Vec<String> {
      mutex_lock_with_log!(self.received, "received").clone()
    }
  }

  impl MessageInvoker for RecordingInvoker {
    fn invoke(&self, envelope: Envelope) {
      self.invocations.fetch_add(1, Ordering::SeqCst);
      let text = envelope.typed_message::<String>().unwrap();
      mutex_lock_with_log!(self.received, "invoke").push(text.clone());
      if self.panics_on.as_deref() == Some(text.as_str()) {
        panic!("cannot handle {}", text);
      }
    }

    fn system_invoke(&self, message: SystemMessage) {
      mutex_lock_with_log!(self.received, "system_invoke").push(format!("system:{}", message.name()));
    }

    fn self_ref(&self) -> ActorRef {
      ActorRef::NoSender
    }
  }

  fn new_mailbox(throughput: usize) -> (Mailbox, Arc<QueueingExecutor>, DeadLetters) {
    let executor = Arc::new(QueueingExecutor::new());
    let dispatcher = Dispatcher::new("test-dispatcher", throughput, None, executor.clone());
    let dead_letters = DeadLetters::new();
    let mailbox = Mailbox::new(Arc::new(UnboundedMessageQueue::new()), dispatcher, dead_letters.clone());
    (mailbox, executor, dead_letters)
  }

  fn text(s: &str) -> Envelope {
    Envelope::new(s.to_owned())
  }

  #[test]
  fn test_suspend_nesting() {
    init_logger();
    let (mailbox, _, _) = new_mailbox(1);
    assert!(!mailbox.is_suspended());
    assert!(mailbox.suspend());
    assert!(!mailbox.suspend());
    assert!(!mailbox.suspend());
    assert_eq!(mailbox.suspend_count(), 3);
    assert!(!mailbox.resume());
    assert!(!mailbox.resume());
    assert!(mailbox.is_suspended());
    assert!(mailbox.resume());
    assert!(!mailbox.is_suspended());
    assert!(mailbox.resume());
    assert_eq!(mailbox.suspend_count(), 0);
    assert!(mailbox.should_process_message());
  }

  #[test]
  fn test_closed_absorbs_everything() {
    init_logger();
    let (mailbox, _, _) = new_mailbox(1);
    mailbox.suspend();
    assert!(mailbox.set_as_scheduled());
    assert!(mailbox.become_closed());
    assert!(!mailbox.become_closed());
    assert!(!mailbox.suspend());
    assert!(!mailbox.resume());
    assert!(!mailbox.set_as_scheduled());
    mailbox.set_as_idle();
    assert_eq!(mailbox.status().bits(), MailboxStatus::CLOSED);
    assert!(!mailbox.can_be_scheduled_for_execution(true, true));
  }

  #[test]
  fn test_set_as_scheduled_is_exclusive() {
    init_logger();
    let (mailbox, _, _) = new_mailbox(1);
    assert!(mailbox.set_as_scheduled());
    assert!(!mailbox.set_as_scheduled());
    mailbox.set_as_idle();
    assert!(!mailbox.is_scheduled());
    mailbox.suspend();
    assert!(mailbox.set_as_scheduled());
    assert_eq!(mailbox.suspend_count(), 1);
  }

  #[test]
  fn test_concurrent_become_closed_has_one_winner() {
    init_logger();
    let (mailbox, _, _) = new_mailbox(1);
    let winners = Arc::new(AtomicUsize::new(0));
    let handles = (0..8)
      .map(|_| {
        let mailbox = mailbox.clone();
        let winners = winners.clone();
        thread::spawn(move || {
          mailbox.suspend();
          if mailbox.become_closed() {
            winners.fetch_add(1, Ordering::SeqCst);
          }
        })
      })
      .collect::<Vec<_>>();
    for handle in handles {
      handle.join().unwrap();
    }
    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(mailbox.is_closed());
  }

  #[test]
  fn test_can_be_scheduled_for_execution() {
    init_logger();
    let (mailbox, _, _) = new_mailbox(1);
    assert!(!mailbox.can_be_scheduled_for_execution(false, false));
    assert!(mailbox.can_be_scheduled_for_execution(true, false));
    mailbox.suspend();
    assert!(!mailbox.can_be_scheduled_for_execution(true, false));
    assert!(mailbox.can_be_scheduled_for_execution(false, true));
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::of_resume());
    assert!(mailbox.can_be_scheduled_for_execution(false, false));
  }

  #[test]
  fn test_set_actor_only_once() {
    init_logger();
    let (mailbox, _, _) = new_mailbox(1);
    let invoker = RecordingInvoker::new(None);
    let weak: Weak<dyn MessageInvoker> = Arc::downgrade(&invoker) as Weak<dyn MessageInvoker>;
    assert!(mailbox.set_actor(weak.clone()).is_ok());
    assert!(matches!(mailbox.set_actor(weak), Err(MailboxError::ActorAlreadySet)));
  }

  #[test]
  fn test_run_processes_system_messages_first() {
    init_logger();
    let (mailbox, executor, _) = new_mailbox(10);
    let invoker = RecordingInvoker::new(None);
    mailbox.set_actor(Arc::downgrade(&invoker) as Weak<dyn MessageInvoker>).unwrap();
    mailbox.enqueue(&ActorRef::NoSender, text("a")).unwrap();
    mailbox.enqueue(&ActorRef::NoSender, text("b")).unwrap();
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::of_create());
    mailbox.dispatcher().register_for_execution(&mailbox, true, false);
    assert_eq!(executor.run_all(), 1);
    assert_eq!(invoker.received(), vec!["system:Create", "a", "b"]);
    assert!(!mailbox.is_scheduled());
  }

  #[test]
  fn test_suspended_mailbox_only_processes_system_messages() {
    init_logger();
    let (mailbox, executor, _) = new_mailbox(10);
    let invoker = RecordingInvoker::new(None);
    mailbox.set_actor(Arc::downgrade(&invoker) as Weak<dyn MessageInvoker>).unwrap();
    mailbox.suspend();
    mailbox.enqueue(&ActorRef::NoSender, text("a")).unwrap();
    mailbox.dispatcher().register_for_execution(&mailbox, true, false);
    assert_eq!(executor.run_all(), 0);
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::of_create());
    mailbox.dispatcher().register_for_execution(&mailbox, false, true);
    assert_eq!(executor.run_all(), 1);
    assert_eq!(invoker.received(), vec!["system:Create"]);
    assert_eq!(mailbox.number_of_messages(), 1);
    mailbox.resume();
    mailbox.dispatcher().register_for_execution(&mailbox, false, false);
    assert_eq!(executor.run_all(), 1);
    assert_eq!(invoker.received(), vec!["system:Create", "a"]);
  }

  struct SleepingInvoker {
    nap: Duration,
    invocations: AtomicUsize,
  }

  impl MessageInvoker for SleepingInvoker {
    fn invoke(&self, _envelope: Envelope) {
      thread::sleep(self.nap);
      self.invocations.fetch_add(1, Ordering::SeqCst);
    }

    fn system_invoke(&self, _message: SystemMessage) {}

    fn self_ref(&self) -> ActorRef {
      ActorRef::NoSender
    }
  }

  #[test]
  fn test_throughput_deadline_ends_the_run_early() {
    init_logger();
    let executor = Arc::new(QueueingExecutor::new());
    let dispatcher = Dispatcher::new(
      "deadline-dispatcher",
      100,
      Some(Duration::from_millis(5)),
      executor.clone(),
    );
    let mailbox = Mailbox::new(Arc::new(UnboundedMessageQueue::new()), dispatcher, DeadLetters::new());
    let invoker = Arc::new(SleepingInvoker {
      nap: Duration::from_millis(20),
      invocations: AtomicUsize::new(0),
    });
    mailbox.set_actor(Arc::downgrade(&invoker) as Weak<dyn MessageInvoker>).unwrap();
    for s in ["a", "b", "c"] {
      mailbox.enqueue(&ActorRef::NoSender, text(s)).unwrap();
    }
    mailbox.dispatcher().register_for_execution(&mailbox, true, false);

    assert!(executor.run_next());
    assert_eq!(invoker.invocations.load(Ordering::SeqCst), 1);
    assert_eq!(mailbox.number_of_messages(), 2);
    assert!(mailbox.is_scheduled());
    assert_eq!(mutex_lock_with_log!(executor.pending, "test").len(), 1);

    assert_eq!(executor.run_all(), 2);
    assert_eq!(invoker.invocations.load(Ordering::SeqCst), 3);
    assert!(!mailbox.is_scheduled());
  }

  #[test]
  fn test_panic_in_invoke_does_not_leak_scheduled_bit() {
    init_logger();
    let (mailbox, executor, _) = new_mailbox(10);
    let invoker = RecordingInvoker::new(Some("bad"));
    mailbox.set_actor(Arc::downgrade(&invoker) as Weak<dyn MessageInvoker>).unwrap();
    for s in ["a", "bad", "c"] {
      mailbox.enqueue(&ActorRef::NoSender, text(s)).unwrap();
    }
    mailbox.dispatcher().register_for_execution(&mailbox, true, false);
    assert_eq!(executor.run_all(), 1);
    assert_eq!(invoker.received(), vec!["a", "bad", "c"]);
    assert!(!mailbox.is_scheduled());
    assert!(mailbox.should_process_message());
  }

  #[test]
  fn test_closed_mailbox_redirects_to_dead_letters() {
    init_logger();
    let (mailbox, executor, dead_letters) = new_mailbox(10);
    let invoker = RecordingInvoker::new(None);
    mailbox.set_actor(Arc::downgrade(&invoker) as Weak<dyn MessageInvoker>).unwrap();
    mailbox.enqueue(&ActorRef::NoSender, text("queued")).unwrap();
    mailbox.become_closed();
    mailbox.clean_up();
    assert_eq!(dead_letters.count(), 1);
    mailbox.enqueue(&ActorRef::NoSender, text("late")).unwrap();
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::of_terminate());
    assert_eq!(dead_letters.count(), 3);
    mailbox.dispatcher().register_for_execution(&mailbox, true, true);
    assert_eq!(executor.run_all(), 0);
    assert!(invoker.received().is_empty());
  }

  #[test]
  fn test_run_without_live_invoker_closes_mailbox() {
    init_logger();
    let (mailbox, executor, dead_letters) = new_mailbox(10);
    let invoker = RecordingInvoker::new(None);
    mailbox.set_actor(Arc::downgrade(&invoker) as Weak<dyn MessageInvoker>).unwrap();
    drop(invoker);
    mailbox.enqueue(&ActorRef::NoSender, text("orphan")).unwrap();
    mailbox.dispatcher().register_for_execution(&mailbox, true, false);
    assert_eq!(executor.run_all(), 1);
    assert!(mailbox.is_closed());
    assert_eq!(dead_letters.count(), 1);
  }
}
