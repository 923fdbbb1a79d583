use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::any_message::AnyMessage;
use crate::infrastructure::logging_mutex::LoggingMutex;
use crate::mutex_lock_with_log;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A message that could not be delivered, with who sent it and who it was meant for.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetter {
  message: AnyMessage,
  sender: ActorRef,
  recipient: ActorRef,
}

impl DeadLetter {
  pub fn new(message: AnyMessage, sender: ActorRef, recipient: ActorRef) -> Self {
    Self {
      message,
      sender,
      recipient,
    }
  }

  pub fn message(&self) -> &AnyMessage {
    &self.message
  }

  pub fn sender(&self) -> &ActorRef {
    &self.sender
  }

  pub fn recipient(&self) -> &ActorRef {
    &self.recipient
  }
}

type DeadLetterSubscriber = Arc<dyn Fn(&DeadLetter) + Send + Sync>;

struct DeadLettersInner {
  count: AtomicUsize,
  subscribers: LoggingMutex<Vec<DeadLetterSubscriber>>,
}

/// Terminal sink shared by every mailbox of an actor system.
#[derive(Clone)]
pub struct DeadLetters {
  inner: Arc<DeadLettersInner>,
}

impl Debug for DeadLetters {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DeadLetters").field("count", &self.count()).finish()
  }
}

impl PartialEq for DeadLetters {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl Default for DeadLetters {
  fn default() -> Self {
    Self::new()
  }
}

impl DeadLetters {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(DeadLettersInner {
        count: AtomicUsize::new(0),
        subscribers: LoggingMutex::new("DeadLetters#subscribers", Vec::new()),
      }),
    }
  }

  pub fn publish(&self, dead_letter: DeadLetter) {
    self.inner.count.fetch_add(1, Ordering::AcqRel);
    log::info!(
      "Message [{}] from {} to {} was not delivered.",
      dead_letter.message.type_name(),
      dead_letter.sender,
      dead_letter.recipient
    );
    let subscribers = mutex_lock_with_log!(self.inner.subscribers, "publish").clone();
    for subscriber in subscribers {
      subscriber(&dead_letter);
    }
  }

  pub fn subscribe<F>(&self, f: F)
  where
    F: Fn(&DeadLetter) + Send + Sync + 'static, {
    mutex_lock_with_log!(self.inner.subscribers, "subscribe").push(Arc::new(f));
  }

  pub fn count(&self) -> usize {
    self.inner.count.load(Ordering::Acquire)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  #[test]
  fn test_publish_counts_and_notifies() {
    let dead_letters = DeadLetters::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let cloned = seen.clone();
    dead_letters.subscribe(move |dl| cloned.lock().unwrap().push(dl.message().type_name()));
    dead_letters.publish(DeadLetter::new(
      AnyMessage::new("lost"),
      ActorRef::NoSender,
      ActorRef::NoSender,
    ));
    assert_eq!(dead_letters.count(), 1);
    assert_eq!(*seen.lock().unwrap(), vec!["&str"]);
  }
}
