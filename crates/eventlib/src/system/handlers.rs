/// Listener registration methods
use crate::binding::ListenerId;
use crate::discovery::{discover, discover_subscriptions};
use crate::error::RegistrationError;
use crate::listener::Listener;
use super::core::EventBus;
use super::stats::StatsCounters;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info};

impl EventBus {
    /// Registers every valid handler operation declared by `listener`.
    ///
    /// Registering the same listener again replaces its previous handler sets
    /// rather than adding a second copy, so each handler is still invoked once
    /// per post.
    ///
    /// Handler operations with the wrong number of parameters are skipped with
    /// a warning. A listener still using the legacy subscription mechanism is
    /// rejected before any state changes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use eventlib::{declare_handlers, EventBus, HandlerResult, HandlerSet, Listener, Priority};
    /// use std::sync::Arc;
    ///
    /// #[derive(Debug)]
    /// struct Ping;
    ///
    /// struct Pinger;
    ///
    /// impl Pinger {
    ///     fn on_ping(&self, _event: &Ping) -> HandlerResult { Ok(()) }
    /// }
    ///
    /// impl Listener for Pinger {
    ///     fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
    ///         declare_handlers!(handlers; Priority::High => on_ping(Ping));
    ///     }
    /// }
    ///
    /// let bus = EventBus::new();
    /// let pinger = Arc::new(Pinger);
    /// bus.register(&pinger).unwrap();
    /// assert_eq!(bus.handler_count::<Ping>(), 1);
    /// ```
    pub fn register<L: Listener>(&self, listener: &Arc<L>) -> Result<(), RegistrationError> {
        // Discovery runs user code and must stay outside the registry lock.
        let discovery = discover(listener.as_ref()).map_err(|e| {
            error!("❌ Rejected listener registration: {}", e);
            e
        })?;

        let id = ListenerId::of(listener);
        let erased: Arc<dyn Any + Send + Sync> = listener.clone();
        let touched = self.registry.insert(id, erased, &discovery);

        StatsCounters::bump(&self.stats.registrations, 1);
        info!(
            "📝 Registered listener {} ({}) with {} handlers across {} event types",
            discovery.listener_type(),
            id,
            discovery.handler_count(),
            touched
        );
        Ok(())
    }

    /// Removes the handlers `listener` currently declares.
    ///
    /// Idempotent: unregistering a listener that is not registered does
    /// nothing. Returns whether any handler was removed.
    ///
    /// The handlers to remove are re-derived from the listener's current
    /// declarations, with legacy-marked operations ignored. If a listener
    /// changes what it declares after registering, handlers it no longer
    /// declares stay registered.
    pub fn unregister<L: Listener>(&self, listener: &Arc<L>) -> bool {
        let id = ListenerId::of(listener);
        let discovery = discover_subscriptions(listener.as_ref());

        let removed = self.registry.remove(id, &discovery);
        if removed == 0 {
            debug!(
                "Listener {} ({}) was not registered",
                discovery.listener_type(),
                id
            );
            return false;
        }

        StatsCounters::bump(&self.stats.unregistrations, 1);
        info!(
            "🗑️ Unregistered listener {} ({}) from {} priority buckets",
            discovery.listener_type(),
            id,
            removed
        );
        true
    }
}
