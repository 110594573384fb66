//! Lifecycle hooks.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;
use thiserror::Error;

/// Failure reported by a hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Synchronous hook function.
pub type SyncHook<C> = Arc<dyn Fn(&C) -> Result<(), HookError> + Send + Sync>;

/// Factory producing a fresh effect per invocation. The effect runs with the
/// hook context as its environment.
pub type AsyncHook<C> = Arc<dyn Fn() -> BoxedEffect<(), HookError, C> + Send + Sync>;

/// An enter or exit hook: synchronous, asynchronous, or absent. Never both.
pub enum Hook<C> {
    Sync(SyncHook<C>),
    Async(AsyncHook<C>),
    Absent,
}

impl<C> Hook<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Hook from a plain closure.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&C) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Hook::Sync(Arc::new(f))
    }

    /// Hook from an async closure receiving an owned copy of the context.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sidetrack::hooks::{EnterContext, Hook};
    ///
    /// let hook: Hook<EnterContext<u8, &'static str>> = Hook::from_async(|ctx: EnterContext<u8, &'static str>| async move {
    ///     ctx.schedule(2);
    ///     Ok(())
    /// });
    /// assert!(hook.is_async());
    /// ```
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        let f = Arc::new(f);
        Hook::Async(Arc::new(move || {
            let f = Arc::clone(&f);
            from_async(move |ctx: &C| f(ctx.clone())).boxed()
        }))
    }

    /// Hook from an effect factory, for callers composing Stillwater effects.
    pub fn effect<F>(factory: F) -> Self
    where
        F: Fn() -> BoxedEffect<(), HookError, C> + Send + Sync + 'static,
    {
        Hook::Async(Arc::new(factory))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Hook::Absent)
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Hook::Async(_))
    }

    /// Run the hook. Sync hooks run inline; async hooks are awaited to
    /// completion with no timeout.
    pub(crate) async fn run(&self, ctx: &C) -> Result<(), HookError> {
        match self {
            Hook::Sync(f) => f(ctx),
            Hook::Async(factory) => factory().run(ctx).await,
            Hook::Absent => Ok(()),
        }
    }
}

impl<C> Default for Hook<C> {
    fn default() -> Self {
        Hook::Absent
    }
}

impl<C> Clone for Hook<C> {
    fn clone(&self) -> Self {
        match self {
            Hook::Sync(f) => Hook::Sync(Arc::clone(f)),
            Hook::Async(factory) => Hook::Async(Arc::clone(factory)),
            Hook::Absent => Hook::Absent,
        }
    }
}

impl<C> fmt::Debug for Hook<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Sync(_) => f.write_str("Hook::Sync"),
            Hook::Async(_) => f.write_str("Hook::Async"),
            Hook::Absent => f.write_str("Hook::Absent"),
        }
    }
}
