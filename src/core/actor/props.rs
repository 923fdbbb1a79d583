use crate::core::actor::actor_context::ActorContext;
use crate::core::actor::{ActorBehavior, ActorResult, FunctionActor, TypedActorAdapter, TypedActorBehavior};
use crate::core::dispatch::any_message::AnyMessage;
use crate::core::dispatch::mailbox::mailbox_type::MailboxType;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub type ActorProducer = Arc<dyn Fn() -> ActorResult<Box<dyn ActorBehavior>> + Send + Sync>;

/// Recipe for an actor: how to build its instances plus optional mailbox and dispatcher selection.
///
/// The constructor picks the actor variant (untyped, typed or closure); every variant ends up behind the
/// same `ActorBehavior` object.
#[derive(Clone)]
pub struct Props {
  producer: ActorProducer,
  mailbox_type: Option<MailboxType>,
  mailbox_id: Option<String>,
  dispatcher_id: Option<String>,
}

impl Debug for Props {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Props")
      .field("mailbox_type", &self.mailbox_type)
      .field("mailbox_id", &self.mailbox_id)
      .field("dispatcher_id", &self.dispatcher_id)
      .finish()
  }
}

impl Props {
  pub fn of_producer(producer: ActorProducer) -> Self {
    Self {
      producer,
      mailbox_type: None,
      mailbox_id: None,
      dispatcher_id: None,
    }
  }

  pub fn new<A, F>(f: F) -> Self
  where
    A: ActorBehavior,
    F: Fn() -> A + Send + Sync + 'static, {
    Self::of_producer(Arc::new(move || Ok(Box::new(f()) as Box<dyn ActorBehavior>)))
  }

  pub fn try_new<A, F>(f: F) -> Self
  where
    A: ActorBehavior,
    F: Fn() -> ActorResult<A> + Send + Sync + 'static, {
    Self::of_producer(Arc::new(move || f().map(|actor| Box::new(actor) as Box<dyn ActorBehavior>)))
  }

  pub fn of_typed<M, A, F>(f: F) -> Self
  where
    M: Any + Send + Sync + Clone,
    A: TypedActorBehavior<M>,
    F: Fn() -> A + Send + Sync + 'static, {
    Self::of_producer(Arc::new(move || {
      Ok(Box::new(TypedActorAdapter::<M, A>::new(f())) as Box<dyn ActorBehavior>)
    }))
  }

  /// Each instance gets its own clone of `f`.
  pub fn from_fn<F>(f: F) -> Self
  where
    F: FnMut(&mut ActorContext, AnyMessage) -> ActorResult<()> + Clone + Send + Sync + 'static, {
    Self::of_producer(Arc::new(move || {
      Ok(Box::new(FunctionActor::new(f.clone())) as Box<dyn ActorBehavior>)
    }))
  }

  pub fn with_mailbox_type(mut self, mailbox_type: MailboxType) -> Self {
    self.mailbox_type = Some(mailbox_type);
    self
  }

  pub fn with_mailbox(mut self, mailbox_id: &str) -> Self {
    self.mailbox_id = Some(mailbox_id.to_owned());
    self
  }

  pub fn with_dispatcher(mut self, dispatcher_id: &str) -> Self {
    self.dispatcher_id = Some(dispatcher_id.to_owned());
    self
  }

  pub fn mailbox_type(&self) -> Option<&MailboxType> {
    self.mailbox_type.as_ref()
  }

  pub fn mailbox_id(&self) -> Option<&str> {
    self.mailbox_id.as_deref()
  }

  pub fn dispatcher_id(&self) -> Option<&str> {
    self.dispatcher_id.as_deref()
  }

  pub fn new_actor(&self) -> ActorResult<Box<dyn ActorBehavior>> {
    (self.producer)()
  }
}
