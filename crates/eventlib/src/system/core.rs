/// Core EventBus implementation
use crate::config::{DispatchSettings, EventBusConfig};
use crate::registry::Registry;
use super::stats::StatsCounters;

/// The central hub that binds listeners to event types and delivers events.
///
/// Registration-side operations (`register`, `unregister`) are serialized by
/// the registry's mutex. Dispatch (`post`) never takes that lock: it reads the
/// baked plan table through a single atomic load, so any number of threads may
/// post while registrations change.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct EventBus {
    pub(super) registry: Registry,
    pub(super) settings: DispatchSettings,
    pub(super) stats: StatsCounters,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish()
    }
}

impl EventBus {
    /// Creates an event bus with default dispatch settings.
    pub fn new() -> Self {
        Self::with_settings(DispatchSettings::default())
    }

    /// Creates an event bus from a loaded configuration.
    pub fn with_config(config: &EventBusConfig) -> Self {
        Self::with_settings(config.dispatch.clone())
    }

    pub fn with_settings(settings: DispatchSettings) -> Self {
        Self {
            registry: Registry::new(),
            settings,
            stats: StatsCounters::default(),
        }
    }

    /// Gets the dispatch settings this bus was created with
    #[inline]
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
