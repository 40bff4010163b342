//! Async runtime bridge for running extraction requests behind egui.

use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use snapcal_core::EventCandidate;

/// Completion of one extraction request, tagged with the generation token
/// the session handed out when the request started. The app forwards the
/// outcome to the session, which drops stale generations on its own.
#[derive(Clone, Debug)]
pub struct ExtractionOutcome {
    pub generation: u64,
    pub result: Result<Vec<EventCandidate>, String>,
}

/// Bridge between the tokio runtime and egui's frame loop.
pub struct AsyncBridge {
    /// Tokio runtime for async operations (wrapped in Option for clean shutdown)
    runtime: Option<Runtime>,

    /// Channel for receiving extraction outcomes
    outcome_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<ExtractionOutcome>>>>,
}

impl AsyncBridge {
    pub fn new() -> Self {
        let runtime = Runtime::new().expect("Failed to create tokio runtime");

        Self {
            runtime: Some(runtime),
            outcome_rx: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the runtime handle for spawning tasks
    pub fn runtime(&self) -> &Runtime {
        self.runtime.as_ref().expect("Runtime has been shut down")
    }

    /// Register the receiver for the in-flight request.
    pub fn register_outcome_receiver(&self, rx: mpsc::UnboundedReceiver<ExtractionOutcome>) {
        let mut guard = self.outcome_rx.lock().unwrap();
        *guard = Some(rx);
    }

    /// Poll for completed extractions and call the handler.
    pub fn poll_outcomes<F>(&self, mut handler: F)
    where
        F: FnMut(ExtractionOutcome),
    {
        let mut guard = self.outcome_rx.lock().unwrap();
        if let Some(rx) = guard.as_mut() {
            while let Ok(outcome) = rx.try_recv() {
                handler(outcome);
            }
        }
    }
}

impl Default for AsyncBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AsyncBridge {
    fn drop(&mut self) {
        // Shutdown the runtime without blocking
        // This prevents the "Cannot drop a runtime in a context where blocking is not allowed" panic
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
