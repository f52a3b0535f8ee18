/// Off-thread dispatch with completion callbacks
use crate::error::DispatchError;
use crate::events::Event;
use super::core::EventBus;
use super::emitters::panic_message;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Receives the outcome of [`EventBus::post_async`].
///
/// `on_success` means every binding was invoked; individual handler failures
/// are isolated and logged as usual and do not turn into `on_failure`.
pub trait AsyncCallback<V>: Send + 'static {
    fn on_success(&self, result: V);

    fn on_failure(&self, result: V, error: DispatchError);
}

impl EventBus {
    /// Posts `event` on tokio's blocking pool and reports the outcome to
    /// `callback`.
    ///
    /// Dispatch itself is unchanged: handlers still run one after another on a
    /// single thread, just not on the caller's. Must be called from within a
    /// tokio runtime.
    pub fn post_async<E, C>(self: &Arc<Self>, event: E, callback: C) -> JoinHandle<()>
    where
        E: Event,
        C: AsyncCallback<E>,
    {
        let bus = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| bus.post(&event)));
            match outcome {
                Ok(Ok(report)) => {
                    debug!(
                        "📤 Async dispatch of {} reached {} handlers",
                        event.type_name(),
                        report.invoked
                    );
                    callback.on_success(event);
                }
                Ok(Err(error)) => callback.on_failure(event, error),
                Err(panic) => {
                    let error = DispatchError::TaskFailed(panic_message(&*panic));
                    callback.on_failure(event, error);
                }
            }
        })
    }
}
