//! Error types for the event bus

/// Raised by `register` before any registration state is touched.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The listener still declares a handler through the deprecated legacy
    /// subscription mechanism and was never migrated.
    #[error("Listener {listener} is using deprecated legacy subscription on '{handler}'! Please update it to a priority subscription.")]
    LegacySubscription {
        listener: &'static str,
        handler: &'static str,
    },
}

/// Failure reported by the invocation mechanism of a binding itself.
///
/// These never originate in handler code: they mean a binding was assembled
/// with a listener or event of the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// The bound listener is not of the type the handler was declared on.
    #[error("listener is not a {expected}")]
    ListenerMismatch { expected: &'static str },

    /// The event passed to the binding is not the handler's parameter type.
    #[error("event is not a {expected}")]
    ArgumentMismatch { expected: &'static str },
}

/// Errors that terminate a single `post` call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A binding could not be invoked. This indicates a bug in the bus, not in
    /// the listener, and aborts delivery to the remaining bindings.
    #[error("Error invoking handler '{handler}' on {listener} for event {event}: {source}")]
    BindingIntegrity {
        event: String,
        listener: &'static str,
        handler: &'static str,
        #[source]
        source: BindingError,
    },

    /// The dispatch task of `post_async` panicked or was cancelled.
    #[error("Async dispatch task failed: {0}")]
    TaskFailed(String),
}

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error while reading a configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document could not be parsed
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is outside its allowed range
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failures while installing the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}
