/// Event dispatch methods
use crate::binding::{HandlerBinding, InvokeError};
use crate::error::{BindingError, DispatchError};
use crate::events::Event;
use super::core::EventBus;
use super::stats::StatsCounters;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{error, trace, warn};

/// Outcome of a single `post` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Bindings invoked
    pub invoked: usize,
    /// Invocations whose handler returned an error or panicked
    pub failed: usize,
    /// Invocations slower than the configured threshold
    pub slow: usize,
}

impl DispatchReport {
    /// Whether at least one handler received the event.
    #[inline]
    pub fn delivered(&self) -> bool {
        self.invoked > 0
    }
}

/// A handler failure that does not stop dispatch.
enum HandlerFailure {
    Error(anyhow::Error),
    Panic(String),
}

impl EventBus {
    /// Delivers `event` to every handler registered for its exact type, in
    /// ascending priority order, on the calling thread.
    ///
    /// Handler failures are logged and isolated; the remaining handlers still
    /// run. The only error returned is [`DispatchError::BindingIntegrity`],
    /// which means a binding was assembled incorrectly and aborts this post.
    ///
    /// Routing uses the static type `E`. A `Box<dyn Event>` or `Arc<E>` is an
    /// event type of its own and reaches no handler of the inner type; pass
    /// such values through [`post_dyn`](Self::post_dyn) as
    /// `bus.post_dyn(boxed.as_ref())`.
    #[inline]
    pub fn post<E: Event>(&self, event: &E) -> Result<DispatchReport, DispatchError> {
        self.post_dyn(event)
    }

    /// Same as [`post`](Self::post) for an event whose type is only known at
    /// runtime. Routing uses the concrete type behind the trait object.
    pub fn post_dyn(&self, event: &dyn Event) -> Result<DispatchReport, DispatchError> {
        let key = event.event_key();
        StatsCounters::bump(&self.stats.events_posted, 1);

        // Single lock-free read; registrations may swap the table meanwhile.
        let Some(plan) = self.registry.plan(&key) else {
            StatsCounters::bump(&self.stats.events_unhandled, 1);
            if is_smart_pointer(key.type_name()) {
                warn!(
                    "⚠️ Posted a {} with no handlers; pass the inner event to post_dyn to route on its own type",
                    key
                );
            } else {
                trace!("No handlers for event: {}", key);
            }
            return Ok(DispatchReport::default());
        };

        let threshold = self.settings.slow_handler_threshold();
        let mut report = DispatchReport::default();

        for binding in plan.iter() {
            let start = Instant::now();
            let outcome = self.invoke(binding, event);
            let elapsed = start.elapsed();
            report.invoked += 1;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => {
                    report.failed += 1;
                    log_failure(binding, event, failure);
                }
                Err(source) => {
                    self.record(&report);
                    error!(
                        "💥 Binding integrity failure invoking {} on {} for event {:?}: {}",
                        binding.handler_name(),
                        binding.listener_type(),
                        event,
                        source
                    );
                    return Err(DispatchError::BindingIntegrity {
                        event: format!("{:?}", event),
                        listener: binding.listener_type(),
                        handler: binding.handler_name(),
                        source,
                    });
                }
            }

            if elapsed > threshold {
                report.slow += 1;
                log_slow(binding, event, elapsed);
            }
        }

        self.record(&report);
        Ok(report)
    }

    /// Invokes one binding. The outer error is a binding integrity failure,
    /// the inner one a failure of the handler itself.
    fn invoke(
        &self,
        binding: &HandlerBinding,
        event: &dyn Event,
    ) -> Result<Result<(), HandlerFailure>, BindingError> {
        let result = if self.settings.catch_panics {
            match catch_unwind(AssertUnwindSafe(|| binding.invoke(event))) {
                Ok(result) => result,
                Err(panic) => return Ok(Err(HandlerFailure::Panic(panic_message(&*panic)))),
            }
        } else {
            binding.invoke(event)
        };

        match result {
            Ok(()) => Ok(Ok(())),
            Err(InvokeError::Handler(e)) => Ok(Err(HandlerFailure::Error(e))),
            Err(InvokeError::Binding(e)) => Err(e),
        }
    }

    fn record(&self, report: &DispatchReport) {
        StatsCounters::bump(&self.stats.handler_invocations, report.invoked as u64);
        StatsCounters::bump(&self.stats.handler_failures, report.failed as u64);
        StatsCounters::bump(&self.stats.slow_invocations, report.slow as u64);
    }
}

fn log_failure(binding: &HandlerBinding, event: &dyn Event, failure: HandlerFailure) {
    match failure {
        HandlerFailure::Error(e) => error!(
            "❌ Error dispatching event {:?} to listener {} ({}) in {}: {:#}",
            event,
            binding.listener_type(),
            binding.listener_id(),
            binding.handler_name(),
            e
        ),
        HandlerFailure::Panic(message) => error!(
            "❌ Listener {} ({}) panicked in {} while handling event {:?}: {}",
            binding.listener_type(),
            binding.listener_id(),
            binding.handler_name(),
            event,
            message
        ),
    }
}

fn log_slow(binding: &HandlerBinding, event: &dyn Event, elapsed: Duration) {
    error!(
        "🐌 Listener {} took {}ms to process event {:?}!",
        binding.listener_type(),
        elapsed.as_millis(),
        event
    );
}

/// Whether an event type is a standard wrapper around another value.
fn is_smart_pointer(type_name: &str) -> bool {
    ["alloc::boxed::Box<", "alloc::sync::Arc<"]
        .iter()
        .any(|prefix| type_name.starts_with(prefix))
}

/// Extracts a readable message from a panic payload.
pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
