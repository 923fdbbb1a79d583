pub mod actor_cell;
pub mod actor_context;
pub mod actor_factory_registry;
pub mod actor_path;
pub mod actor_ref;
pub mod actor_system;
pub mod props;

use crate::core::actor::actor_context::ActorContext;
use crate::core::dispatch::any_message::AnyMessage;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use thiserror::Error;

pub type ActorResult<A> = Result<A, ActorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActorError {
  #[error("Actor failed: {message}")]
  ActorFailed { message: String },
  #[error("Actor panicked: {message}")]
  ActorPanicked { message: String },
  #[error("Actor initialization failed: {message}")]
  ActorInitializationFailed { message: String },
  #[error("Actor was killed")]
  ActorKilled,
}

impl ActorError {
  pub fn of_failed(message: impl Into<String>) -> Self {
    ActorError::ActorFailed {
      message: message.into(),
    }
  }

  pub fn of_initialization_failed(message: impl Into<String>) -> Self {
    ActorError::ActorInitializationFailed {
      message: message.into(),
    }
  }
}

/// Untyped actor: receives every message as an `AnyMessage`.
pub trait ActorBehavior: Send + 'static {
  fn around_receive(&mut self, ctx: &mut ActorContext, msg: AnyMessage) -> ActorResult<()> {
    self.receive(ctx, msg)
  }

  fn receive(&mut self, ctx: &mut ActorContext, msg: AnyMessage) -> ActorResult<()>;

  fn around_pre_start(&mut self, ctx: &mut ActorContext) -> ActorResult<()> {
    self.pre_start(ctx)
  }

  fn pre_start(&mut self, _ctx: &mut ActorContext) -> ActorResult<()> {
    Ok(())
  }

  /// Called on the old instance before it is replaced.
  fn pre_restart(&mut self, _ctx: &mut ActorContext, _reason: &ActorError) -> ActorResult<()> {
    Ok(())
  }

  /// Called on the fresh instance after a restart. Runs `pre_start` unless overridden.
  fn post_restart(&mut self, ctx: &mut ActorContext, _reason: &ActorError) -> ActorResult<()> {
    self.pre_start(ctx)
  }

  fn around_post_stop(&mut self, ctx: &mut ActorContext) -> ActorResult<()> {
    self.post_stop(ctx)
  }

  fn post_stop(&mut self, _ctx: &mut ActorContext) -> ActorResult<()> {
    Ok(())
  }
}

/// Actor that only handles messages of type `M`. Anything else is reported as unhandled.
pub trait TypedActorBehavior<M>: Send + 'static {
  fn receive(&mut self, ctx: &mut ActorContext, msg: M) -> ActorResult<()>;

  fn pre_start(&mut self, _ctx: &mut ActorContext) -> ActorResult<()> {
    Ok(())
  }

  fn post_stop(&mut self, _ctx: &mut ActorContext) -> ActorResult<()> {
    Ok(())
  }
}

pub struct TypedActorAdapter<M, A> {
  actor: A,
  _phantom: PhantomData<fn(M)>,
}

impl<M, A> TypedActorAdapter<M, A> {
  pub fn new(actor: A) -> Self {
    Self {
      actor,
      _phantom: PhantomData,
    }
  }
}

impl<M, A> ActorBehavior for TypedActorAdapter<M, A>
where
  M: Any + Send + Sync + Clone,
  A: TypedActorBehavior<M>,
{
  fn receive(&mut self, ctx: &mut ActorContext, msg: AnyMessage) -> ActorResult<()> {
    if !msg.is::<M>() {
      ctx.unhandled(&msg);
      return Ok(());
    }
    let typed_msg = msg
      .take::<M>()
      .map_err(|err| ActorError::of_failed(err.to_string()))?;
    self.actor.receive(ctx, typed_msg)
  }

  fn pre_start(&mut self, ctx: &mut ActorContext) -> ActorResult<()> {
    self.actor.pre_start(ctx)
  }

  fn post_stop(&mut self, ctx: &mut ActorContext) -> ActorResult<()> {
    self.actor.post_stop(ctx)
  }
}

/// Actor whose behavior is a closure over the context and the message.
pub struct FunctionActor<F> {
  f: F,
}

impl<F> FunctionActor<F>
where
  F: FnMut(&mut ActorContext, AnyMessage) -> ActorResult<()> + Send + 'static,
{
  pub fn new(f: F) -> Self {
    Self { f }
  }
}

impl<F> Debug for FunctionActor<F> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str("FunctionActor")
  }
}

impl<F> ActorBehavior for FunctionActor<F>
where
  F: FnMut(&mut ActorContext, AnyMessage) -> ActorResult<()> + Send + 'static,
{
  fn receive(&mut self, ctx: &mut ActorContext, msg: AnyMessage) -> ActorResult<()> {
    (self.f)(ctx, msg)
  }
}
