//! End-to-end scenarios across configuration, declaration and dispatch

#[cfg(test)]
use super::*;
#[cfg(test)]
use std::sync::atomic::{AtomicU32, Ordering};
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
#[derive(Debug)]
struct OrderPlaced {
    total_cents: u64,
}

#[cfg(test)]
#[derive(Debug)]
struct OrderCancelled;

/// Shared accounting behaviour embedded by concrete listeners.
#[cfg(test)]
#[derive(Default)]
struct Ledger {
    placed: AtomicU32,
    cancelled: AtomicU32,
}

#[cfg(test)]
impl Ledger {
    fn on_placed(&self, _event: &OrderPlaced) -> HandlerResult {
        self.placed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_cancelled(&self, _event: &OrderCancelled) -> HandlerResult {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
impl Listener for Ledger {
    fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
        declare_handlers!(handlers;
            Priority::Low => on_placed(OrderPlaced),
            on_cancelled(OrderCancelled),
        );
    }
}

/// Inherits the ledger handlers and overrides `on_placed`.
#[cfg(test)]
#[derive(Default)]
struct FraudCheck {
    ledger: Ledger,
    flagged: AtomicU32,
}

#[cfg(test)]
impl FraudCheck {
    fn on_placed(&self, event: &OrderPlaced) -> HandlerResult {
        if event.total_cents > 100_000 {
            self.flagged.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("order of {} cents needs review", event.total_cents);
        }
        self.ledger.on_placed(event)
    }
}

#[cfg(test)]
impl Listener for FraudCheck {
    fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
        handlers.inherit(&self.ledger, |check: &FraudCheck| &check.ledger);
        declare_handlers!(handlers; Priority::Lowest => on_placed(OrderPlaced));
    }
}

#[test]
fn test_configured_bus_dispatches_inherited_handlers() {
    let config = EventBusConfig::from_toml_str(
        r#"
        [dispatch]
        slow_handler_threshold_ms = 250
        "#,
    )
    .unwrap();
    let bus = create_event_bus(&config);
    assert_eq!(bus.settings().slow_handler_threshold_ms, 250);

    let check = Arc::new(FraudCheck::default());
    bus.register(&check).unwrap();

    let plan = bus.plan::<OrderPlaced>().unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].handler_name(), "on_placed");

    bus.post(&OrderPlaced { total_cents: 4_200 }).unwrap();
    let report = bus.post(&OrderPlaced { total_cents: 250_000 }).unwrap();
    assert_eq!(report.failed, 1);
    bus.post(&OrderCancelled).unwrap();

    assert_eq!(check.ledger.placed.load(Ordering::SeqCst), 1);
    assert_eq!(check.ledger.cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(check.flagged.load(Ordering::SeqCst), 1);
}

#[test]
fn test_override_runs_before_independent_ledger() {
    let bus = EventBus::new();
    let check = Arc::new(FraudCheck::default());
    let ledger = Arc::new(Ledger::default());

    // Registered in reverse of dispatch order.
    bus.register(&ledger).unwrap();
    bus.register(&check).unwrap();

    let order: Vec<_> = bus
        .plan::<OrderPlaced>()
        .unwrap()
        .iter()
        .map(|binding| binding.listener_id())
        .collect();
    assert_eq!(order, vec![ListenerId::of(&check), ListenerId::of(&ledger)]);
}

#[test]
fn test_discovery_is_usable_on_its_own() {
    let discovery = discover(&FraudCheck::default()).unwrap();
    assert_eq!(discovery.handler_count(), 2);
    assert!(discovery.skipped().is_empty());

    let placed = discovery.handlers_for(&EventKey::of::<OrderPlaced>()).unwrap();
    assert_eq!(placed.keys().copied().collect::<Vec<_>>(), vec![Priority::Lowest]);
}

#[test]
fn test_priority_round_trips_through_config_text() {
    let priority: Priority = "HIGHEST".parse().unwrap();
    assert_eq!(priority, Priority::Highest);
    assert!("urgent".parse::<Priority>().is_err());
}
