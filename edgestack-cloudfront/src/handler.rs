//! Handler models
//!
//! A Lambda@Edge handler comes in one of two calling conventions, and the
//! emulator must drive either without the caller declaring which one it
//! registered. The convention is fixed once at construction as an explicit
//! [`HandlerKind`] rather than probed per call.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::event::OriginRequestEvent;
use crate::response::EdgeResponse;

/// Declared parameter counts the platform accepts.
pub const MIN_ARITY: usize = 1;
pub const MAX_ARITY: usize = 3;

/// Error raised by a handler's own logic.
pub type HandlerFault = Box<dyn std::error::Error + Send + Sync>;

/// Completion callback handed to callback-style handlers.
///
/// Invoked exactly once with `(error, response)`; a non-empty error slot or
/// a missing response fails the transaction.
pub type Completion = Box<dyn FnOnce(Option<HandlerFault>, Option<EdgeResponse>) + Send>;

/// Context argument for callback-style handlers.
///
/// CloudFront invokes origin-request handlers with a null context, so the
/// emulator always passes `None`; the slot exists for signature parity with
/// handlers written against the real platform.
#[derive(Debug, Clone, Default)]
pub struct EdgeContext {
    pub function_name: String,
    pub aws_request_id: String,
}

/// Calling convention of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Invoked as `handler(event, context, completion)`.
    Callback,
    /// Invoked as `handler(event)`; the returned future resolves to the
    /// response.
    Future,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Declared parameter count outside the accepted range.
    #[error("Invalid handler method")]
    InvalidArity(usize),
}

pub(crate) enum HandlerFn {
    Future(
        Arc<
            dyn Fn(OriginRequestEvent) -> BoxFuture<'static, Result<EdgeResponse, HandlerFault>>
                + Send
                + Sync,
        >,
    ),
    Callback(
        Arc<
            dyn Fn(OriginRequestEvent, Option<EdgeContext>, Completion) -> Result<(), HandlerFault>
                + Send
                + Sync,
        >,
    ),
}

/// A registered Lambda@Edge handler.
pub struct EdgeHandler {
    func: HandlerFn,
    arity: usize,
}

impl EdgeHandler {
    /// Register a future-style handler: `handler(event)` resolving to the
    /// response.
    pub fn future<F, Fut>(func: F) -> Self
    where
        F: Fn(OriginRequestEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<EdgeResponse, HandlerFault>> + Send + 'static,
    {
        Self {
            func: HandlerFn::Future(Arc::new(move |event| func(event).boxed())),
            arity: 1,
        }
    }

    /// Register a callback-style handler: `handler(event, context,
    /// completion)`.
    pub fn callback<F>(func: F) -> Self
    where
        F: Fn(OriginRequestEvent, Option<EdgeContext>, Completion) -> Result<(), HandlerFault>
            + Send
            + Sync
            + 'static,
    {
        Self {
            func: HandlerFn::Callback(Arc::new(func)),
            arity: 3,
        }
    }

    /// Override the declared parameter count, emulating handler signatures
    /// that differ from the constructor defaults (e.g. a callback handler
    /// declared without the context argument).
    #[must_use]
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn kind(&self) -> HandlerKind {
        match self.func {
            HandlerFn::Future(_) => HandlerKind::Future,
            HandlerFn::Callback(_) => HandlerKind::Callback,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Check the declared signature before any server starts.
    pub fn validate(&self) -> Result<(), HandlerError> {
        if !(MIN_ARITY..=MAX_ARITY).contains(&self.arity) {
            return Err(HandlerError::InvalidArity(self.arity));
        }
        Ok(())
    }

    pub(crate) fn func(&self) -> &HandlerFn {
        &self.func
    }
}

impl fmt::Debug for EdgeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeHandler")
            .field("kind", &self.kind())
            .field("arity", &self.arity)
            .finish()
    }
}
