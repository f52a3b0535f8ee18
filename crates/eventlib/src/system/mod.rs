/// Event bus module - broken down into registration, dispatch and management
mod callback;
mod core;
mod emitters;
mod handlers;
mod management;
mod stats;

pub use callback::AsyncCallback;
pub use self::core::EventBus;
pub use emitters::DispatchReport;
pub use stats::EventBusStats;

use crate::config::EventBusConfig;
use std::sync::Arc;

/// Helper function to create a shareable event bus from configuration
pub fn create_event_bus(config: &EventBusConfig) -> Arc<EventBus> {
    Arc::new(EventBus::with_config(config))
}
