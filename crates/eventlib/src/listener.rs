//! # Listener Declarations
//!
//! Listeners describe their handler operations explicitly by implementing
//! [`Listener::declare_handlers`]. Each declaration is a [`HandlerDescriptor`]
//! carrying the handler name, its marker (current priority subscription or the
//! deprecated legacy mechanism), its declared parameter list and, for
//! well-formed handlers, the typed invoker.
//!
//! Declarations are collected into a [`HandlerSet`], which is what discovery
//! inspects. Most listeners use the [`declare_handlers!`](crate::declare_handlers)
//! macro instead of calling the builder methods directly.
//!
//! ```rust
//! use eventlib::{declare_handlers, HandlerResult, HandlerSet, Listener, Priority};
//!
//! #[derive(Debug)]
//! struct Ping;
//!
//! struct Audit;
//!
//! impl Audit {
//!     fn on_ping(&self, _event: &Ping) -> HandlerResult {
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for Audit {
//!     fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
//!         declare_handlers!(handlers; Priority::High => on_ping(Ping));
//!     }
//! }
//! ```

use crate::binding::{HandlerResult, InvokeError};
use crate::error::BindingError;
use crate::events::EventKey;
use crate::priority::Priority;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An object exposing zero or more handler operations.
///
/// `declare_handlers` receives the instance, so the set of handlers may depend
/// on listener state. It must not block or call back into the bus: it runs
/// during both `register` and `unregister`.
pub trait Listener: Send + Sync + 'static {
    fn declare_handlers(&self, handlers: &mut HandlerSet<Self>)
    where
        Self: Sized;
}

/// Typed invoker of a handler declared on listener type `L`.
pub(crate) type TypedInvoker<L> =
    Arc<dyn Fn(&L, &dyn Any) -> Result<(), InvokeError> + Send + Sync>;

/// How a handler operation was opted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerMarker {
    /// Current mechanism, carrying the dispatch priority.
    Subscribe(Priority),
    /// Deprecated mechanism. A listener declaring one of these is rejected.
    Legacy,
}

/// A declared parameter of a handler operation.
#[derive(Clone, Copy)]
pub struct ParamType {
    key: EventKey,
}

impl ParamType {
    pub fn of<T: Any>() -> Self {
        Self {
            key: EventKey::of::<T>(),
        }
    }

    pub fn key(&self) -> EventKey {
        self.key
    }

    pub fn type_name(&self) -> &'static str {
        self.key.type_name()
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key.type_name())
    }
}

/// One handler operation as declared by a listener.
pub struct HandlerDescriptor<L> {
    pub(crate) name: &'static str,
    pub(crate) marker: HandlerMarker,
    pub(crate) params: SmallVec<[ParamType; 1]>,
    pub(crate) invoker: Option<TypedInvoker<L>>,
}

impl<L> HandlerDescriptor<L> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn marker(&self) -> HandlerMarker {
        self.marker
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl<L> Clone for HandlerDescriptor<L> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            marker: self.marker,
            params: self.params.clone(),
            invoker: self.invoker.clone(),
        }
    }
}

impl<L> fmt::Debug for HandlerDescriptor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("marker", &self.marker)
            .field("params", &self.params)
            .finish()
    }
}

/// Ordered collection of the handler operations a listener declares.
///
/// Names are unique: declaring a name twice replaces the earlier descriptor in
/// place, which is how a listener overrides a handler it inherited.
pub struct HandlerSet<L> {
    descriptors: Vec<HandlerDescriptor<L>>,
}

impl<L: 'static> HandlerSet<L> {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Declares a handler for events of type `E` at the given priority.
    pub fn on<E, F>(&mut self, name: &'static str, priority: Priority, handler: F) -> &mut Self
    where
        E: Any,
        F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let invoker = typed_invoker::<L, E, F>(handler);
        self.declare(HandlerDescriptor {
            name,
            marker: HandlerMarker::Subscribe(priority),
            params: smallvec::smallvec![ParamType::of::<E>()],
            invoker: Some(invoker),
        })
    }

    /// Declares a handler through the deprecated legacy mechanism.
    ///
    /// Kept so that old listeners fail loudly at registration instead of
    /// silently receiving nothing.
    pub fn legacy<E, F>(&mut self, name: &'static str, handler: F) -> &mut Self
    where
        E: Any,
        F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let invoker = typed_invoker::<L, E, F>(handler);
        self.declare(HandlerDescriptor {
            name,
            marker: HandlerMarker::Legacy,
            params: smallvec::smallvec![ParamType::of::<E>()],
            invoker: Some(invoker),
        })
    }

    /// Declares a handler-marked operation whose parameter list is not a
    /// single event. Discovery skips it with a diagnostic.
    pub fn declare_malformed(
        &mut self,
        name: &'static str,
        priority: Priority,
        params: &[ParamType],
    ) -> &mut Self {
        self.declare(HandlerDescriptor {
            name,
            marker: HandlerMarker::Subscribe(priority),
            params: params.iter().copied().collect(),
            invoker: None,
        })
    }

    /// Adds the handlers declared by an embedded listener component.
    ///
    /// The inherited handlers are invoked on `project(listener)`.
    pub fn inherit<P>(&mut self, parent: &P, project: fn(&L) -> &P) -> &mut Self
    where
        P: Listener,
    {
        let mut inherited = HandlerSet::<P>::new();
        parent.declare_handlers(&mut inherited);

        for descriptor in inherited.descriptors {
            let invoker = descriptor.invoker.map(|parent_invoker| {
                let invoker: TypedInvoker<L> = Arc::new(move |listener: &L, event: &dyn Any| {
                    parent_invoker(project(listener), event)
                });
                invoker
            });
            self.declare(HandlerDescriptor {
                name: descriptor.name,
                marker: descriptor.marker,
                params: descriptor.params,
                invoker,
            });
        }
        self
    }

    /// Adds a raw descriptor, replacing any earlier one with the same name.
    pub(crate) fn declare(&mut self, descriptor: HandlerDescriptor<L>) -> &mut Self {
        match self.descriptors.iter_mut().find(|d| d.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
        self
    }

    pub fn descriptors(&self) -> &[HandlerDescriptor<L>] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<L: 'static> Default for HandlerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> fmt::Debug for HandlerSet<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors.iter()).finish()
    }
}

fn typed_invoker<L, E, F>(handler: F) -> TypedInvoker<L>
where
    L: 'static,
    E: Any,
    F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(move |listener: &L, event: &dyn Any| {
        let event = event.downcast_ref::<E>().ok_or(InvokeError::Binding(
            BindingError::ArgumentMismatch {
                expected: std::any::type_name::<E>(),
            },
        ))?;
        handler(listener, event).map_err(InvokeError::Handler)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;

    #[derive(Debug)]
    struct Pong;

    struct Inner;

    impl Inner {
        fn on_ping(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for Inner {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            handlers.on("on_ping", Priority::Low, Inner::on_ping);
            handlers.on("on_pong", Priority::Low, |_: &Inner, _: &Pong| Ok(()));
        }
    }

    struct Outer {
        inner: Inner,
    }

    impl Listener for Outer {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            handlers.inherit(&self.inner, |outer: &Outer| &outer.inner);
            handlers.on("on_ping", Priority::High, |_: &Outer, _: &Ping| {
                anyhow::bail!("overridden")
            });
        }
    }

    #[test]
    fn test_set_records_descriptors_in_order() {
        let mut set = HandlerSet::<Inner>::new();
        Inner.declare_handlers(&mut set);

        let names: Vec<_> = set.descriptors().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["on_ping", "on_pong"]);
        assert!(set.descriptors().iter().all(|d| d.arity() == 1));
    }

    #[test]
    fn test_redeclaring_a_name_replaces_in_place() {
        let outer = Outer { inner: Inner };
        let mut set = HandlerSet::<Outer>::new();
        outer.declare_handlers(&mut set);

        assert_eq!(set.len(), 2);
        let ping = &set.descriptors()[0];
        assert_eq!(ping.name(), "on_ping");
        assert_eq!(ping.marker(), HandlerMarker::Subscribe(Priority::High));

        let invoker = ping.invoker.as_ref().expect("well-formed handler has an invoker");
        assert!(matches!(invoker(&outer, &Ping), Err(InvokeError::Handler(_))));
    }

    #[test]
    fn test_inherited_handler_runs_on_projection() {
        let outer = Outer { inner: Inner };
        let mut set = HandlerSet::<Outer>::new();
        outer.declare_handlers(&mut set);

        let pong = &set.descriptors()[1];
        assert_eq!(pong.marker(), HandlerMarker::Subscribe(Priority::Low));
        let invoker = pong.invoker.as_ref().expect("inherited handler keeps its invoker");
        assert!(invoker(&outer, &Pong).is_ok());
        assert!(matches!(
            invoker(&outer, &Ping),
            Err(InvokeError::Binding(BindingError::ArgumentMismatch { .. }))
        ));
    }

    #[test]
    fn test_malformed_and_legacy_declarations() {
        let mut set = HandlerSet::<Inner>::new();
        set.declare_malformed(
            "on_pair",
            Priority::Normal,
            &[ParamType::of::<Ping>(), ParamType::of::<Pong>()],
        )
        .legacy("on_old", |_: &Inner, _: &Ping| Ok(()));

        assert_eq!(set.descriptors()[0].arity(), 2);
        assert!(set.descriptors()[0].invoker.is_none());
        assert_eq!(set.descriptors()[1].marker(), HandlerMarker::Legacy);
    }
}
