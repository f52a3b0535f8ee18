//! # Registration Map and Baked Plans
//!
//! Two structures back the bus:
//!
//! - the durable registration map, `event type → priority → (listener →
//!   handler operations)`, mutated only while holding the registry mutex;
//! - the baked plan table, `event type → [HandlerBinding]`, an immutable
//!   snapshot published through [`ArcSwap`] and read without locking.
//!
//! Every mutation re-bakes the plan of each event type it touched before the
//! mutex is released, so a published plan always reflects a fully applied
//! mutation. Plans are replaced whole; a reader holding an old plan keeps a
//! consistent view until it drops it.

use crate::binding::{HandlerBinding, HandlerMethod, ListenerId};
use crate::discovery::Discovery;
use crate::events::EventKey;
use crate::priority::Priority;
use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Immutable, priority-ordered dispatch plan for one event type.
pub type Plan = Arc<[HandlerBinding]>;

/// One listener's handler operations within a single priority bucket.
#[derive(Clone)]
struct ListenerEntry {
    listener: Arc<dyn Any + Send + Sync>,
    methods: Arc<[HandlerMethod]>,
}

/// Listeners of one priority level, in registration order.
type Bucket = IndexMap<ListenerId, ListenerEntry>;

/// Priority buckets of one event type, ascending by weight.
type PriorityBuckets = BTreeMap<Priority, Bucket>;

/// Snapshot of every baked plan, keyed by event type.
#[derive(Clone, Default)]
pub struct PlanTable {
    plans: HashMap<EventKey, Plan>,
}

impl PlanTable {
    #[inline]
    pub fn get(&self, event: &EventKey) -> Option<&Plan> {
        self.plans.get(event)
    }

    pub fn event_keys(&self) -> impl Iterator<Item = EventKey> + '_ {
        self.plans.keys().copied()
    }

    /// Number of event types with a published plan.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Total bindings across all plans.
    pub fn binding_count(&self) -> usize {
        self.plans.values().map(|plan| plan.len()).sum()
    }
}

/// Compiles the buckets of one event type into a flat plan.
///
/// Order: priority weight ascending, then listener registration order within a
/// bucket, then declaration order within a listener. Returns `None` when there
/// is nothing left to dispatch to.
fn bake(buckets: Option<&PriorityBuckets>) -> Option<Plan> {
    let buckets = buckets?;
    let plan: Vec<HandlerBinding> = buckets
        .values()
        .flat_map(|bucket| bucket.iter())
        .flat_map(|(id, entry)| {
            entry
                .methods
                .iter()
                .map(move |method| HandlerBinding::new(entry.listener.clone(), *id, method.clone()))
        })
        .collect();

    if plan.is_empty() {
        None
    } else {
        Some(plan.into())
    }
}

/// Registry of listeners and their baked plans.
pub struct Registry {
    registrations: Mutex<HashMap<EventKey, PriorityBuckets>>,
    plans: ArcSwap<PlanTable>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(HashMap::new()),
            plans: ArcSwap::from_pointee(PlanTable::default()),
        }
    }

    /// Records every handler in `discovery` for `listener`, replacing any
    /// earlier entry of the same listener at the same event type and priority,
    /// then re-bakes the touched event types.
    ///
    /// Returns the number of event types touched.
    pub fn insert(
        &self,
        id: ListenerId,
        listener: Arc<dyn Any + Send + Sync>,
        discovery: &Discovery,
    ) -> usize {
        let mut retired = Retired::default();
        let mut registrations = self.registrations.lock();
        let mut touched = 0;

        for (event, by_priority) in discovery.iter() {
            let buckets = registrations.entry(*event).or_default();
            for (priority, methods) in by_priority {
                let entry = ListenerEntry {
                    listener: listener.clone(),
                    methods: methods.as_slice().into(),
                };
                retired.entries.extend(buckets.entry(*priority).or_default().insert(id, entry));
            }

            let plan = bake(registrations.get(event));
            retired.tables.push(self.publish(*event, plan));
            touched += 1;
        }

        drop(registrations);
        retired.release();
        touched
    }

    /// Removes `listener` from every (event type, priority) named by
    /// `discovery`, pruning empty buckets and event types, then re-bakes the
    /// touched event types.
    ///
    /// Returns the number of listener entries removed.
    pub fn remove(&self, id: ListenerId, discovery: &Discovery) -> usize {
        let mut retired = Retired::default();
        let mut registrations = self.registrations.lock();
        let mut removed = 0;

        for (event, by_priority) in discovery.iter() {
            let Some(buckets) = registrations.get_mut(event) else {
                continue;
            };

            for priority in by_priority.keys() {
                if let Some(bucket) = buckets.get_mut(priority) {
                    if let Some(entry) = bucket.shift_remove(&id) {
                        retired.entries.push(entry);
                        removed += 1;
                    }
                    if bucket.is_empty() {
                        buckets.remove(priority);
                    }
                }
            }

            if buckets.is_empty() {
                registrations.remove(event);
            }

            let plan = bake(registrations.get(event));
            retired.tables.push(self.publish(*event, plan));
        }

        drop(registrations);
        retired.release();
        removed
    }

    /// Drops every registration and every published plan.
    ///
    /// Listeners whose last reference was held by the registry are dropped
    /// after the lock is released, so their `Drop` may call back into the bus.
    pub fn clear(&self) {
        let mut registrations = self.registrations.lock();
        let cleared = std::mem::take(&mut *registrations);
        let table = self.plans.swap(Arc::new(PlanTable::default()));
        drop(registrations);

        debug!("🗑️ Cleared registrations for {} event types", cleared.len());
        drop(cleared);
        drop(table);
    }

    /// Current plan for `event`. Lock-free.
    #[inline]
    pub fn plan(&self, event: &EventKey) -> Option<Plan> {
        self.plans.load().get(event).cloned()
    }

    /// Current snapshot of the whole plan table. Lock-free.
    #[inline]
    pub fn plans(&self) -> Arc<PlanTable> {
        self.plans.load_full()
    }

    /// Whether any handler of `id` is currently registered.
    pub fn contains_listener(&self, id: ListenerId) -> bool {
        self.registrations
            .lock()
            .values()
            .flat_map(|buckets| buckets.values())
            .any(|bucket| bucket.contains_key(&id))
    }

    /// Number of distinct listeners with at least one registered handler.
    pub fn listener_count(&self) -> usize {
        self.registrations
            .lock()
            .values()
            .flat_map(|buckets| buckets.values())
            .flat_map(|bucket| bucket.keys().copied())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Replaces the plan of one event type and hands back the previous table.
    /// Callers hold the registrations lock, so table updates never race with
    /// each other, and drop the returned table only after releasing it.
    fn publish(&self, event: EventKey, plan: Option<Plan>) -> Arc<PlanTable> {
        let mut table = PlanTable::clone(&self.plans.load());
        match plan {
            Some(plan) => {
                trace!("🔥 Baked {} bindings for {}", plan.len(), event);
                table.plans.insert(event, plan);
            }
            None => {
                trace!("🔥 Removed plan for {}", event);
                table.plans.remove(&event);
            }
        }
        self.plans.swap(Arc::new(table))
    }
}

/// Listener references displaced by a mutation, released once the
/// registrations lock is gone. A listener whose last reference lands here runs
/// its `Drop` unlocked.
#[derive(Default)]
struct Retired {
    entries: Vec<ListenerEntry>,
    tables: Vec<Arc<PlanTable>>,
}

impl Retired {
    fn release(self) {
        trace!(
            "Released {} listener entries and {} plan tables",
            self.entries.len(),
            self.tables.len()
        );
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plans = self.plans.load();
        f.debug_struct("Registry")
            .field("event_types", &plans.len())
            .field("bindings", &plans.binding_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover;
    use crate::{declare_handlers, HandlerResult, HandlerSet, Listener};

    #[derive(Debug)]
    struct Ping;

    #[derive(Debug)]
    struct Pong;

    struct Early;

    impl Early {
        fn on_ping(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for Early {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            declare_handlers!(handlers; Priority::Lowest => on_ping(Ping));
        }
    }

    struct Both;

    impl Both {
        fn on_ping(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }

        fn on_ping_again(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }

        fn on_pong(&self, _event: &Pong) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for Both {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            declare_handlers!(handlers;
                Priority::High => on_ping(Ping),
                Priority::High => on_ping_again(Ping),
                on_pong(Pong),
            );
        }
    }

    fn register<L: Listener>(registry: &Registry, listener: &Arc<L>) {
        let discovery = discover(listener.as_ref()).unwrap();
        registry.insert(ListenerId::of(listener), listener.clone(), &discovery);
    }

    fn unregister<L: Listener>(registry: &Registry, listener: &Arc<L>) -> usize {
        let discovery = discover(listener.as_ref()).unwrap();
        registry.remove(ListenerId::of(listener), &discovery)
    }

    fn plan_names(registry: &Registry, event: EventKey) -> Vec<&'static str> {
        registry
            .plan(&event)
            .map(|plan| plan.iter().map(|b| b.handler_name()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_bake_orders_by_priority_then_declaration() {
        let registry = Registry::new();
        let both = Arc::new(Both);
        let early = Arc::new(Early);
        register(&registry, &both);
        register(&registry, &early);

        assert_eq!(
            plan_names(&registry, EventKey::of::<Ping>()),
            vec!["on_ping", "on_ping", "on_ping_again"]
        );
        let plan = registry.plan(&EventKey::of::<Ping>()).unwrap();
        assert_eq!(plan[0].listener_id(), ListenerId::of(&early));
        assert_eq!(plan[1].listener_id(), ListenerId::of(&both));
    }

    #[test]
    fn test_reinsert_overwrites_instead_of_accumulating() {
        let registry = Registry::new();
        let both = Arc::new(Both);
        register(&registry, &both);
        register(&registry, &both);

        assert_eq!(registry.plans().binding_count(), 3);
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn test_remove_prunes_and_drops_plans() {
        let registry = Registry::new();
        let both = Arc::new(Both);
        let early = Arc::new(Early);
        register(&registry, &both);
        register(&registry, &early);

        assert_eq!(unregister(&registry, &both), 2);
        assert_eq!(plan_names(&registry, EventKey::of::<Ping>()), vec!["on_ping"]);
        assert!(registry.plan(&EventKey::of::<Pong>()).is_none());
        assert!(!registry.contains_listener(ListenerId::of(&both)));

        assert_eq!(unregister(&registry, &early), 1);
        assert!(registry.plans().is_empty());
        assert!(registry.registrations.lock().is_empty());
    }

    #[test]
    fn test_remove_of_unknown_listener_is_noop() {
        let registry = Registry::new();
        let both = Arc::new(Both);

        assert_eq!(unregister(&registry, &both), 0);
        assert!(registry.plans().is_empty());
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let registry = Registry::new();
        let early = Arc::new(Early);
        register(&registry, &early);

        let before = registry.plan(&EventKey::of::<Ping>()).unwrap();
        unregister(&registry, &early);

        assert_eq!(before.len(), 1);
        assert!(registry.plan(&EventKey::of::<Ping>()).is_none());
    }

    #[test]
    fn test_clear() {
        let registry = Registry::new();
        register(&registry, &Arc::new(Both));
        registry.clear();

        assert!(registry.plans().is_empty());
        assert_eq!(registry.listener_count(), 0);
    }
}
