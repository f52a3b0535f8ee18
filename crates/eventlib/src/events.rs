//! # Event Trait and Routing Keys
//!
//! Events are plain Rust values. Routing uses the concrete runtime type of the
//! posted value and nothing else: there is no supertype or trait-object
//! matching, so a handler for `Ping` never sees a `LoudPing` even when the two
//! types are related.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Core trait that all events implement.
///
/// Any `Send + Sync + Debug + 'static` type is an event through the blanket
/// implementation below, so there is nothing to derive:
///
/// ```rust
/// #[derive(Debug)]
/// struct Ping {
///     sequence: u64,
/// }
/// // Ping is now an Event.
/// ```
///
/// `Debug` is required because handler failures and slow invocations are
/// logged together with the event that triggered them.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// Returns the type name of this event for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Returns a reference to this event as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the routing key for the runtime type of this value.
    fn event_key(&self) -> EventKey {
        EventKey {
            id: self.as_any().type_id(),
            name: self.type_name(),
        }
    }
}

impl<T> Event for T
where
    T: Any + Send + Sync + fmt::Debug,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Runtime type identity of an event, used as the primary index into the
/// registration map and the baked plan table.
///
/// Equality and hashing consider the `TypeId` only; the name is carried for
/// log messages.
#[derive(Clone, Copy)]
pub struct EventKey {
    id: TypeId,
    name: &'static str,
}

impl EventKey {
    /// Key for the static type `E`.
    #[inline]
    pub fn of<E: Any>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKey {}

impl Hash for EventKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKey").field(&self.name).finish()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Tests module
mod tests;
