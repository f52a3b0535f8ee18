//! # Handler Discovery
//!
//! Turns a listener's declarations into the grouping the registry works with:
//! event type → priority → ordered handler operations.
//!
//! Discovery is a pure query. It never touches registry state, so it runs
//! before the registry lock is taken and may run concurrently for any number
//! of registrations.

use crate::binding::{ErasedInvoker, HandlerMethod, InvokeError};
use crate::error::{BindingError, RegistrationError};
use crate::events::EventKey;
use crate::listener::{HandlerMarker, HandlerSet, Listener};
use crate::priority::Priority;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handler operations of one listener, grouped by event type and priority.
#[derive(Debug, Clone)]
pub struct Discovery {
    listener_type: &'static str,
    by_event: IndexMap<EventKey, BTreeMap<Priority, Vec<HandlerMethod>>>,
    skipped: Vec<&'static str>,
}

impl Discovery {
    fn new(listener_type: &'static str) -> Self {
        Self {
            listener_type,
            by_event: IndexMap::new(),
            skipped: Vec::new(),
        }
    }

    pub fn listener_type(&self) -> &'static str {
        self.listener_type
    }

    /// Event types with at least one valid handler, in declaration order.
    pub fn event_keys(&self) -> impl Iterator<Item = EventKey> + '_ {
        self.by_event.keys().copied()
    }

    /// Priority buckets for one event type.
    pub fn handlers_for(&self, event: &EventKey) -> Option<&BTreeMap<Priority, Vec<HandlerMethod>>> {
        self.by_event.get(event)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EventKey, &BTreeMap<Priority, Vec<HandlerMethod>>)> {
        self.by_event.iter()
    }

    /// Total number of valid handler operations.
    pub fn handler_count(&self) -> usize {
        self.by_event
            .values()
            .flat_map(|buckets| buckets.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_event.is_empty()
    }

    /// Names of handler-marked operations skipped for having the wrong arity
    /// or no invoker.
    pub fn skipped(&self) -> &[&'static str] {
        &self.skipped
    }
}

/// Discovers the handler operations declared by `listener`.
///
/// Fails with [`RegistrationError::LegacySubscription`] if any operation still
/// uses the deprecated mechanism. Operations with a parameter count other than
/// one are skipped and logged; the remaining handlers are still returned.
pub fn discover<L: Listener>(listener: &L) -> Result<Discovery, RegistrationError> {
    let declared = declarations(listener);

    if let Some(legacy) = declared
        .descriptors()
        .iter()
        .find(|d| d.marker() == HandlerMarker::Legacy)
    {
        return Err(RegistrationError::LegacySubscription {
            listener: std::any::type_name::<L>(),
            handler: legacy.name(),
        });
    }

    Ok(group(&declared))
}

/// Same grouping as [`discover`], with legacy-marked operations ignored
/// instead of rejected.
///
/// Used to find what to remove on unregister: a listener that registered
/// cleanly and declares a legacy handler later must still be removable.
pub fn discover_subscriptions<L: Listener>(listener: &L) -> Discovery {
    group(&declarations(listener))
}

fn declarations<L: Listener>(listener: &L) -> HandlerSet<L> {
    let mut declared = HandlerSet::<L>::new();
    listener.declare_handlers(&mut declared);
    declared
}

fn group<L: Listener>(declared: &HandlerSet<L>) -> Discovery {
    let listener_type = std::any::type_name::<L>();
    let mut discovery = Discovery::new(listener_type);

    for descriptor in declared.descriptors() {
        let HandlerMarker::Subscribe(priority) = descriptor.marker() else {
            continue;
        };

        let [param] = descriptor.params() else {
            warn!(
                "⚠️ Method {} in {} is declared as an event handler but doesn't have exactly one parameter (found {:?}); skipping it",
                descriptor.name(),
                listener_type,
                descriptor.params()
            );
            discovery.skipped.push(descriptor.name());
            continue;
        };

        let Some(invoker) = descriptor.invoker.clone() else {
            warn!(
                "⚠️ Method {} in {} is declared as an event handler for {} but has no invoker; skipping it",
                descriptor.name(),
                listener_type,
                param.type_name()
            );
            discovery.skipped.push(descriptor.name());
            continue;
        };

        let erased: ErasedInvoker = Arc::new(move |listener: &dyn Any, event: &dyn Any| {
            let listener = listener.downcast_ref::<L>().ok_or(InvokeError::Binding(
                BindingError::ListenerMismatch {
                    expected: listener_type,
                },
            ))?;
            invoker(listener, event)
        });

        let event = param.key();
        discovery
            .by_event
            .entry(event)
            .or_default()
            .entry(priority)
            .or_default()
            .push(HandlerMethod::new(descriptor.name(), listener_type, event, erased));
    }

    debug!(
        "🔍 Discovered {} handlers for {} event types on {}",
        discovery.handler_count(),
        discovery.by_event.len(),
        listener_type
    );

    discovery
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{declare_handlers, HandlerResult, ParamType};

    #[derive(Debug)]
    struct Ping;

    #[derive(Debug)]
    struct Pong;

    struct Mixed;

    impl Mixed {
        fn on_ping(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }

        fn on_ping_late(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }

        fn on_ping_first(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }

        fn on_pong(&self, _event: &Pong) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for Mixed {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            declare_handlers!(handlers;
                on_ping(Ping),
                Priority::Highest => on_ping_late(Ping),
                Priority::Normal => on_ping_first(Ping),
                on_pair(Ping, Pong),
                Priority::Low => on_pong(Pong),
            );
        }
    }

    struct OnlyMalformed;

    impl Listener for OnlyMalformed {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            declare_handlers!(handlers; on_pair(Ping, Pong));
        }
    }

    struct Legacy;

    impl Legacy {
        fn on_ping(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }

        fn on_old(&self, _event: &Pong) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for Legacy {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            declare_handlers!(handlers; on_ping(Ping), @legacy on_old(Pong));
        }
    }

    #[test_log::test]
    fn test_groups_by_event_and_priority() {
        let discovery = discover(&Mixed).unwrap();

        assert_eq!(discovery.handler_count(), 4);
        assert_eq!(
            discovery.event_keys().collect::<Vec<_>>(),
            vec![EventKey::of::<Ping>(), EventKey::of::<Pong>()]
        );

        let ping = discovery.handlers_for(&EventKey::of::<Ping>()).unwrap();
        assert_eq!(ping.keys().copied().collect::<Vec<_>>(), vec![Priority::Normal, Priority::Highest]);
        let normal: Vec<_> = ping[&Priority::Normal].iter().map(|m| m.name()).collect();
        assert_eq!(normal, vec!["on_ping", "on_ping_first"]);

        let pong = discovery.handlers_for(&EventKey::of::<Pong>()).unwrap();
        assert_eq!(pong[&Priority::Low][0].name(), "on_pong");
    }

    #[test_log::test]
    fn test_wrong_arity_is_skipped_not_fatal() {
        let discovery = discover(&Mixed).unwrap();
        assert_eq!(discovery.skipped(), &["on_pair"]);

        let empty = discover(&OnlyMalformed).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.handler_count(), 0);
        assert_eq!(empty.skipped(), &["on_pair"]);
    }

    #[test_log::test]
    fn test_legacy_marker_is_rejected() {
        match discover(&Legacy) {
            Err(RegistrationError::LegacySubscription { listener, handler }) => {
                assert!(listener.ends_with("Legacy"));
                assert_eq!(handler, "on_old");
            }
            other => panic!("expected legacy rejection, got {:?}", other.map(|d| d.handler_count())),
        }
    }

    #[test_log::test]
    fn test_subscriptions_ignore_legacy_marker() {
        let discovery = discover_subscriptions(&Legacy);
        assert_eq!(discovery.handler_count(), 1);
        assert_eq!(
            discovery.event_keys().collect::<Vec<_>>(),
            vec![EventKey::of::<Ping>()]
        );
        assert!(discovery.skipped().is_empty());
    }

    struct Unbound;

    impl Listener for Unbound {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            handlers.declare_malformed("on_ping", Priority::Normal, &[ParamType::of::<Ping>()]);
        }
    }

    #[test_log::test]
    fn test_single_parameter_without_invoker_is_skipped() {
        let discovery = discover(&Unbound).unwrap();
        assert!(discovery.is_empty());
        assert_eq!(discovery.skipped(), &["on_ping"]);
    }

    #[test]
    fn test_discovered_methods_record_declaring_type() {
        let discovery = discover(&Mixed).unwrap();
        let (_, buckets) = discovery.iter().next().unwrap();
        let method = &buckets[&Priority::Normal][0];

        assert!(method.listener_type().ends_with("Mixed"));
        assert_eq!(method.event_key(), EventKey::of::<Ping>());
    }
}
