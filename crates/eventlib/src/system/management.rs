/// Event bus introspection and maintenance methods
use crate::binding::ListenerId;
use crate::events::{Event, EventKey};
use crate::listener::Listener;
use crate::registry::Plan;
use super::core::EventBus;
use super::stats::EventBusStats;
use std::sync::Arc;
use tracing::info;

impl EventBus {
    /// Number of bindings that a post of `E` would invoke.
    #[inline]
    pub fn handler_count<E: Event>(&self) -> usize {
        self.plan::<E>().map_or(0, |plan| plan.len())
    }

    #[inline]
    pub fn has_handlers<E: Event>(&self) -> bool {
        self.plan::<E>().is_some()
    }

    /// The currently published dispatch plan for `E`, in invocation order.
    #[inline]
    pub fn plan<E: Event>(&self) -> Option<Plan> {
        self.registry.plan(&EventKey::of::<E>())
    }

    /// Event types that currently have at least one handler.
    pub fn registered_event_types(&self) -> Vec<EventKey> {
        self.registry.plans().event_keys().collect()
    }

    /// Number of distinct listeners with at least one registered handler.
    pub fn listener_count(&self) -> usize {
        self.registry.listener_count()
    }

    pub fn is_registered<L: Listener>(&self, listener: &Arc<L>) -> bool {
        self.registry.contains_listener(ListenerId::of(listener))
    }

    /// Unregisters every listener at once.
    pub fn clear(&self) {
        let listeners = self.registry.listener_count();
        self.registry.clear();
        info!("🗑️ Cleared {} listeners from the event bus", listeners);
    }

    /// Gets the current event bus statistics
    pub fn stats(&self) -> EventBusStats {
        let plans = self.registry.plans();
        EventBusStats {
            listeners: self.registry.listener_count(),
            event_types: plans.len(),
            bindings: plans.binding_count(),
            ..self.stats.snapshot()
        }
    }
}
