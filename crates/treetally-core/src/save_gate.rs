use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight guard around the persistence call.
#[derive(Debug, Clone, Default)]
pub struct SaveGate {
    busy: Arc<AtomicBool>,
}

/// Holding a ticket means a save is in flight. Dropping it clears the busy flag.
#[derive(Debug)]
pub struct SaveTicket {
    busy: Arc<AtomicBool>,
}

impl SaveGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<SaveTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(SaveTicket {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for SaveTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
