use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop request shared between a running simulation and its owner.
///
/// The simulation polls the token once per molecule; a molecule already being
/// grown is always finished before the batch stops.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stop: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}
