//! # eventlib
//!
//! A priority-ordered, in-process event dispatcher. Listeners declare which
//! event types they handle and at which priority; posting an event delivers it
//! synchronously to every registered handler for that exact type.
//!
//! ## Core Features
//!
//! - **Exact-Type Routing**: An event reaches the handlers whose parameter type
//!   is the event's concrete type, and nothing else
//! - **Priority Ordering**: Handlers run in ascending priority weight, from
//!   `Lowest` to `Highest`; ties keep listener registration order and then
//!   declaration order
//! - **Baked Plans**: Registration precomputes an immutable, ordered binding
//!   list per event type, so `post` is a single lock-free read plus a loop
//! - **Failure Isolation**: A failing or panicking handler is logged and the
//!   remaining handlers still run
//! - **Slow Handler Detection**: Invocations exceeding a configurable threshold
//!   are logged
//!
//! ## Architecture Overview
//!
//! - [`priority`]: the five dispatch priorities and their weights
//! - [`listener`] / [`macros`]: how a listener declares its handlers
//! - [`discovery`]: turns declarations into grouped, type-erased handler methods
//! - [`binding`]: a handler method bound to a live listener instance
//! - [`registry`]: durable registrations and the published plan table
//! - [`system`]: the [`EventBus`] with registration, dispatch and introspection
//! - [`config`] / [`logging`]: TOML settings and tracing setup
//!
//! ## Quick Start Example
//!
//! ```rust
//! use eventlib::{declare_handlers, EventBus, HandlerResult, HandlerSet, Listener, Priority};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct PlayerJoined {
//!     name: String,
//! }
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     fn on_joined(&self, event: &PlayerJoined) -> HandlerResult {
//!         println!("Welcome, {}!", event.name);
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for Greeter {
//!     fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
//!         declare_handlers!(handlers; Priority::High => on_joined(PlayerJoined));
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let greeter = Arc::new(Greeter);
//! bus.register(&greeter).unwrap();
//!
//! let report = bus.post(&PlayerJoined { name: "ada".into() }).unwrap();
//! assert_eq!(report.invoked, 1);
//!
//! bus.unregister(&greeter);
//! assert!(!bus.post(&PlayerJoined { name: "bob".into() }).unwrap().delivered());
//! ```

// tests
mod test_integration;

// Core modules
pub mod binding;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod listener;
pub mod logging;
pub mod macros;
pub mod priority;
pub mod registry;
pub mod system;

// Re-export commonly used items for convenience
pub use binding::{HandlerBinding, HandlerMethod, HandlerResult, InvokeError, ListenerId};
pub use config::{DispatchSettings, EventBusConfig, LoggingSettings};
pub use discovery::{discover, discover_subscriptions, Discovery};
pub use error::{BindingError, ConfigError, DispatchError, LoggingError, RegistrationError};
pub use events::{Event, EventKey};
pub use listener::{HandlerDescriptor, HandlerMarker, HandlerSet, Listener, ParamType};
pub use logging::setup_logging;
pub use priority::{ParsePriorityError, Priority};
pub use registry::{Plan, PlanTable, Registry};
pub use system::{create_event_bus, AsyncCallback, DispatchReport, EventBus, EventBusStats};
