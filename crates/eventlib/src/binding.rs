//! Handler bindings: a listener paired with one of its handler operations.
//!
//! The invocation mechanism is isolated behind [`HandlerBinding::invoke`]; the
//! dispatcher never needs to know the listener's or the event's concrete type.

use crate::error::BindingError;
use crate::events::{Event, EventKey};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Result type returned by handler operations.
///
/// Handlers may fail with any error; the failure is logged and isolated so the
/// remaining handlers still receive the event.
pub type HandlerResult = anyhow::Result<()>;

/// Type-erased handler operation: `(listener, event) -> outcome`.
pub(crate) type ErasedInvoker =
    Arc<dyn Fn(&dyn Any, &dyn Any) -> Result<(), InvokeError> + Send + Sync>;

/// Outcome of a failed invocation, split by who is at fault.
#[derive(Debug)]
pub enum InvokeError {
    /// The binding mechanism rejected the call (listener or argument type
    /// mismatch). Fatal to the current dispatch.
    Binding(BindingError),
    /// The handler ran and reported an error of its own.
    Handler(anyhow::Error),
}

/// Identity of a registered listener: the address of its shared allocation.
///
/// The registry keeps the listener's `Arc` alive for as long as it is
/// registered, so the address cannot be reused by another listener meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn of<L: ?Sized>(listener: &Arc<L>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A single handler operation discovered on a listener type.
///
/// Cheap to clone; the invoker is shared.
#[derive(Clone)]
pub struct HandlerMethod {
    name: &'static str,
    listener_type: &'static str,
    event: EventKey,
    invoker: ErasedInvoker,
}

impl HandlerMethod {
    pub(crate) fn new(
        name: &'static str,
        listener_type: &'static str,
        event: EventKey,
        invoker: ErasedInvoker,
    ) -> Self {
        Self {
            name,
            listener_type,
            event,
            invoker,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name of the listener this operation was declared on.
    #[inline]
    pub fn listener_type(&self) -> &'static str {
        self.listener_type
    }

    /// The event type this operation accepts.
    #[inline]
    pub fn event_key(&self) -> EventKey {
        self.event
    }
}

impl fmt::Debug for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("name", &self.name)
            .field("listener_type", &self.listener_type)
            .field("event", &self.event)
            .finish()
    }
}

/// Immutable (listener, handler operation) pair ready for invocation.
#[derive(Clone)]
pub struct HandlerBinding {
    listener: Arc<dyn Any + Send + Sync>,
    listener_id: ListenerId,
    method: HandlerMethod,
}

impl HandlerBinding {
    pub(crate) fn new(
        listener: Arc<dyn Any + Send + Sync>,
        listener_id: ListenerId,
        method: HandlerMethod,
    ) -> Self {
        Self {
            listener,
            listener_id,
            method,
        }
    }

    /// Invokes the handler operation on the bound listener.
    #[inline]
    pub fn invoke(&self, event: &dyn Event) -> Result<(), InvokeError> {
        (self.method.invoker)(&*self.listener, event.as_any())
    }

    #[inline]
    pub fn listener_id(&self) -> ListenerId {
        self.listener_id
    }

    #[inline]
    pub fn listener_type(&self) -> &'static str {
        self.method.listener_type
    }

    #[inline]
    pub fn handler_name(&self) -> &'static str {
        self.method.name
    }

    #[inline]
    pub fn method(&self) -> &HandlerMethod {
        &self.method
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("listener", &self.listener_id)
            .field("method", &self.method)
            .finish()
    }
}
