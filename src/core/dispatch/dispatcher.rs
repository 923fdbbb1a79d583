use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::dead_letters::DeadLetters;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::executor::ExecutorBehavior;
use crate::core::dispatch::mailbox::mailbox::Mailbox;
use crate::core::dispatch::mailbox::mailbox_type::{MailboxType, MailboxTypeBehavior};
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::system_message::system_message::SystemMessage;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
  #[error("Executor has been shut down")]
  ExecutorShutdown,
  #[error("Execution rejected: {reason}")]
  ExecutionRejected { reason: String },
}

struct DispatcherInner {
  id: String,
  throughput: usize,
  throughput_deadline: Option<Duration>,
  executor: Arc<dyn ExecutorBehavior>,
  inhabitants: AtomicUsize,
}

/// Schedules mailboxes onto an executor. Scheduling state lives in each mailbox, not here.
#[derive(Clone)]
pub struct Dispatcher {
  inner: Arc<DispatcherInner>,
}

impl Debug for Dispatcher {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Dispatcher")
      .field("id", &self.inner.id)
      .field("throughput", &self.inner.throughput)
      .field("throughput_deadline", &self.inner.throughput_deadline)
      .field("executor", &self.inner.executor)
      .field("inhabitants", &self.inhabitants())
      .finish()
  }
}

impl PartialEq for Dispatcher {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

pub trait DispatcherBehavior {
  fn create_mailbox(&self, mailbox_type: &MailboxType, dead_letters: DeadLetters) -> Result<Mailbox, MailboxError>;

  fn attach(&self, mailbox: &Mailbox);
  fn detach(&self, mailbox: &Mailbox);

  fn dispatch(&self, receiver: &ActorRef, mailbox: &Mailbox, envelope: Envelope) -> Result<(), MailboxError>;
  fn system_dispatch(&self, receiver: &ActorRef, mailbox: &Mailbox, message: SystemMessage);

  fn suspend(&self, mailbox: &Mailbox);
  fn resume(&self, mailbox: &Mailbox);

  fn register_for_execution(&self, mailbox: &Mailbox, has_message_hint: bool, has_system_message_hint: bool) -> bool;
}

impl Dispatcher {
  /// `throughput` of zero is treated as one.
  pub fn new(
    id: &str,
    throughput: usize,
    throughput_deadline: Option<Duration>,
    executor: Arc<dyn ExecutorBehavior>,
  ) -> Self {
    Self {
      inner: Arc::new(DispatcherInner {
        id: id.to_owned(),
        throughput: throughput.max(1),
        throughput_deadline: throughput_deadline.filter(|d| !d.is_zero()),
        executor,
        inhabitants: AtomicUsize::new(0),
      }),
    }
  }

  pub fn id(&self) -> &str {
    &self.inner.id
  }

  pub fn throughput(&self) -> usize {
    self.inner.throughput
  }

  pub fn throughput_deadline(&self) -> Option<Duration> {
    self.inner.throughput_deadline
  }

  /// Number of mailboxes currently attached.
  pub fn inhabitants(&self) -> usize {
    self.inner.inhabitants.load(Ordering::Acquire)
  }

  pub fn shutdown(&self) {
    log::debug!("Shutting down dispatcher {}", self.inner.id);
    self.inner.executor.shutdown();
  }

  fn try_execute(&self, mailbox: &Mailbox) -> Result<(), DispatchError> {
    match self.inner.executor.execute(mailbox.clone()) {
      Err(DispatchError::ExecutionRejected { reason }) => {
        log::warn!("Dispatcher {} retrying rejected execution: {}", self.inner.id, reason);
        self.inner.executor.execute(mailbox.clone())
      }
      other => other,
    }
  }
}

impl DispatcherBehavior for Dispatcher {
  fn create_mailbox(&self, mailbox_type: &MailboxType, dead_letters: DeadLetters) -> Result<Mailbox, MailboxError> {
    let message_queue = mailbox_type.create_message_queue()?;
    Ok(Mailbox::new(message_queue, self.clone(), dead_letters))
  }

  /// Counts the mailbox in and schedules it so a pending `Create` gets processed.
  fn attach(&self, mailbox: &Mailbox) {
    self.inner.inhabitants.fetch_add(1, Ordering::AcqRel);
    self.register_for_execution(mailbox, false, true);
  }

  fn detach(&self, mailbox: &Mailbox) {
    mailbox.become_closed();
    mailbox.clean_up();
    let _ = self
      .inner
      .inhabitants
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
  }

  fn dispatch(&self, receiver: &ActorRef, mailbox: &Mailbox, envelope: Envelope) -> Result<(), MailboxError> {
    mailbox.enqueue(receiver, envelope)?;
    self.register_for_execution(mailbox, true, false);
    Ok(())
  }

  fn system_dispatch(&self, receiver: &ActorRef, mailbox: &Mailbox, message: SystemMessage) {
    mailbox.system_enqueue(receiver, message);
    self.register_for_execution(mailbox, false, true);
  }

  fn suspend(&self, mailbox: &Mailbox) {
    mailbox.suspend();
  }

  fn resume(&self, mailbox: &Mailbox) {
    if mailbox.resume() {
      self.register_for_execution(mailbox, false, false);
    }
  }

  fn register_for_execution(&self, mailbox: &Mailbox, has_message_hint: bool, has_system_message_hint: bool) -> bool {
    if !mailbox.can_be_scheduled_for_execution(has_message_hint, has_system_message_hint) {
      return false;
    }
    if !mailbox.set_as_scheduled() {
      return false;
    }
    match self.try_execute(mailbox) {
      Ok(()) => true,
      Err(err) => {
        log::error!("Dispatcher {} failed to schedule a mailbox: {}", self.inner.id, err);
        mailbox.set_as_idle();
        false
      }
    }
  }
}
