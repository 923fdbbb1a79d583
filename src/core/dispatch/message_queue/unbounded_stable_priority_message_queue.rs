use crate::core::actor::actor_ref::ActorRef;
use crate::core::dispatch::any_message::AnyMessage;
use crate::core::dispatch::envelope::Envelope;
use crate::core::dispatch::mailbox::MailboxError;
use crate::core::dispatch::message_queue::MessageQueueBehavior;
use crate::infrastructure::logging_mutex::LoggingMutex;
use crate::mutex_lock_with_log;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Maps a message to its priority. Lower values are dequeued first.
#[derive(Clone)]
pub struct PriorityGenerator(Arc<dyn Fn(&AnyMessage) -> i32 + Send + Sync>);

impl PriorityGenerator {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(&AnyMessage) -> i32 + Send + Sync + 'static, {
    Self(Arc::new(f))
  }

  pub fn priority_of(&self, message: &AnyMessage) -> i32 {
    (self.0)(message)
  }
}

impl Debug for PriorityGenerator {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str("PriorityGenerator")
  }
}

impl PartialEq for PriorityGenerator {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

#[derive(Debug)]
struct PrioritizedEnvelope {
  priority: i32,
  sequence: u64,
  envelope: Envelope,
}

impl PartialEq for PrioritizedEnvelope {
  fn eq(&self, other: &Self) -> bool {
    self.priority == other.priority && self.sequence == other.sequence
  }
}

impl Eq for PrioritizedEnvelope {}

impl PartialOrd for PrioritizedEnvelope {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

// BinaryHeap pops the greatest element, so both keys are reversed.
impl Ord for PrioritizedEnvelope {
  fn cmp(&self, other: &Self) -> Ordering {
    other
      .priority
      .cmp(&self.priority)
      .then_with(|| other.sequence.cmp(&self.sequence))
  }
}

#[derive(Debug)]
struct PriorityQueueState {
  heap: BinaryHeap<PrioritizedEnvelope>,
  next_sequence: u64,
}

/// Priority-ordered queue that keeps FIFO order among messages of equal priority.
#[derive(Debug)]
pub struct UnboundedStablePriorityMessageQueue {
  priority: PriorityGenerator,
  state: LoggingMutex<PriorityQueueState>,
}

impl UnboundedStablePriorityMessageQueue {
  pub fn new(priority: PriorityGenerator) -> Self {
    Self {
      priority,
      state: LoggingMutex::new(
        "UnboundedStablePriorityMessageQueue#state",
        PriorityQueueState {
          heap: BinaryHeap::new(),
          next_sequence: 0,
        },
      ),
    }
  }
}

impl MessageQueueBehavior for UnboundedStablePriorityMessageQueue {
  fn enqueue(&self, _receiver: &ActorRef, envelope: Envelope) -> Result<(), MailboxError> {
    let priority = self.priority.priority_of(envelope.message());
    let mut state = mutex_lock_with_log!(self.state, "enqueue");
    let sequence = state.next_sequence;
    state.next_sequence += 1;
    state.heap.push(PrioritizedEnvelope {
      priority,
      sequence,
      envelope,
    });
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    mutex_lock_with_log!(self.state, "dequeue")
      .heap
      .pop()
      .map(|prioritized| prioritized.envelope)
  }

  fn number_of_messages(&self) -> usize {
    mutex_lock_with_log!(self.state, "number_of_messages").heap.len()
  }
}
