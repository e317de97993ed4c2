//! Route handlers and their invocation.
//!
//! A [`RouteHandler`] is a callable plus a [`HandlerSignature`]. Invocation
//! re-derives the parameter names, drops the response slot, binds the rest
//! against the payload, and calls the handler with a [`Responder`] followed
//! by the bound arguments in declaration order.
//!
//! # Example
//!
//! ```ignore
//! use stevie::route_handler;
//!
//! let hello = route_handler!((res, name) => async move {
//!     res.send(&serde_json::json!({ "hello": name }))
//! });
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::binder::{bind_arguments, BoundArg};
use crate::payload::Payload;
use crate::response::{HandlerResult, Responder};
use crate::signature::HandlerSignature;

type HandlerFn =
    dyn Fn(Responder, Vec<BoundArg>) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// An application-supplied handler for one route.
#[derive(Clone)]
pub struct RouteHandler {
    signature: HandlerSignature,
    func: Arc<HandlerFn>,
}

impl RouteHandler {
    pub fn new<F>(signature: HandlerSignature, func: F) -> Self
    where
        F: Fn(Responder, Vec<BoundArg>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static,
    {
        Self {
            signature,
            func: Arc::new(func),
        }
    }

    /// Handler whose parameter names are parsed from arrow-form source text.
    pub fn from_source<F>(source: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(Responder, Vec<BoundArg>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static,
    {
        Self::new(HandlerSignature::Source(source.into()), func)
    }

    /// Handler with an explicit name list. The first name is the response slot.
    pub fn with_parameters<I, S, F>(names: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Responder, Vec<BoundArg>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static,
    {
        let names = names.into_iter().map(Into::into).collect();
        Self::new(HandlerSignature::Declared(names), func)
    }

    /// Handler with nothing to introspect; it never receives bound arguments.
    pub fn opaque<F>(func: F) -> Self
    where
        F: Fn(Responder, Vec<BoundArg>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static,
    {
        Self::new(HandlerSignature::Opaque, func)
    }

    pub fn signature(&self) -> &HandlerSignature {
        &self.signature
    }

    /// Declared parameter names, response slot included. Recomputed per call.
    pub fn parameter_names(&self) -> Vec<String> {
        self.signature.parameter_names()
    }

    /// Call the handler with already-bound arguments.
    ///
    /// A panic while building or polling the handler future is reported as
    /// an ordinary failure carrying the panic message.
    pub async fn call(&self, responder: Responder, args: Vec<BoundArg>) -> HandlerResult {
        let future = match std::panic::catch_unwind(AssertUnwindSafe(|| (self.func)(responder, args))) {
            Ok(future) => future,
            Err(panic) => return Err(anyhow::anyhow!(panic_message(panic))),
        };

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(anyhow::anyhow!(panic_message(panic))),
        }
    }

    /// Derive, bind, and call against a normalized payload.
    pub async fn invoke(&self, payload: &Payload) -> HandlerResult {
        let names = self.parameter_names();
        let bound = bind_arguments(names.get(1..).unwrap_or_default(), payload);
        tracing::debug!(parameters = ?names, bound = bound.len(), "invoking route handler");
        self.call(Responder, bound).await
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Box a handler future. Used by [`route_handler!`](crate::route_handler).
pub fn boxed<F>(future: F) -> BoxFuture<'static, HandlerResult>
where
    F: Future<Output = HandlerResult> + Send + 'static,
{
    Box::pin(future)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Build a [`RouteHandler`] from an arrow-form declaration.
///
/// The declaration text is kept verbatim as the handler's signature source,
/// and each parameter after the first becomes a [`BoundArg`] local inside the
/// body.
#[macro_export]
macro_rules! route_handler {
    (() => $body:expr) => {
        $crate::RouteHandler::from_source(
            stringify!(() => $body),
            move |_: $crate::Responder, _: ::std::vec::Vec<$crate::BoundArg>| {
                $crate::handler::boxed($body)
            },
        )
    };
    (($res:ident $(, $arg:ident)* $(,)?) => $body:expr) => {
        $crate::RouteHandler::from_source(
            stringify!(($res $(, $arg)*) => $body),
            move |$res: $crate::Responder, args: ::std::vec::Vec<$crate::BoundArg>| {
                #[allow(unused_mut, unused_variables)]
                let mut args = args.into_iter();
                $(
                    let $arg = args
                        .next()
                        .unwrap_or_else(|| $crate::BoundArg::absent(stringify!($arg)));
                )*
                $crate::handler::boxed($body)
            },
        )
    };
}
