//! State shared between the foreground interpreter and the background event
//! source.
//!
//! Exactly two structures cross threads: the global variable table and the
//! pending-event list with its binary signal.  Both live in [`Shared`] behind
//! one [`parking_lot::Mutex`]; every access from either side takes the lock.
//!
//! ```text
//!   background (driver)                foreground (interpreter)
//!   ───────────────────                ────────────────────────
//!   post("DEVICE_ARRIVAL") ──┐
//!                            ├──► [ pending | signaled | globals ] ◄── wait(500ms, Take)
//!   post("DATA_READY")    ───┘              Condvar                    set/get globals
//! ```

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::script::vars::{VarEntry, VarTable};

/// Whether a successful wait consumes the pending events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Snapshot the list, clear it and lower the signal.
    #[default]
    Take,
    /// Snapshot the list and leave it (and the signal) in place.
    Peek,
}

/// Result of [`Shared::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The signal was raised; these events were pending, oldest first.
    Events(Vec<String>),
    Timeout,
}

impl WaitOutcome {
    /// The text a script sees: comma-joined event names or `timeout`.
    pub fn to_ret(&self) -> String {
        match self {
            WaitOutcome::Events(names) => names.join(","),
            WaitOutcome::Timeout => "timeout".to_owned(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    globals: VarTable,
    pending: Vec<String>,
    signaled: bool,
}

/// Process-wide state guarded by a single lock.
#[derive(Debug, Default)]
pub struct Shared {
    inner: Mutex<Inner>,
    signal: Condvar,
}

impl Shared {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Events ────────────────────────────────────────────────────────────────

    /// Append an event and raise the signal.  Safe to call from any thread.
    pub fn post(&self, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!(event = %name, "event posted");
        let mut inner = self.inner.lock();
        inner.pending.push(name);
        inner.signaled = true;
        self.signal.notify_all();
    }

    /// Block until the signal is raised or `timeout` expires.
    ///
    /// A zero timeout polls once without blocking.
    pub fn wait(&self, timeout: Duration, mode: WaitMode) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while !inner.signaled {
            if timeout.is_zero() || self.signal.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }
        if !inner.signaled {
            return WaitOutcome::Timeout;
        }
        let names = match mode {
            WaitMode::Take => {
                inner.signaled = false;
                std::mem::take(&mut inner.pending)
            }
            WaitMode::Peek => inner.pending.clone(),
        };
        WaitOutcome::Events(names)
    }

    /// Drop all pending events and lower the signal.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.pending.clear();
        inner.signaled = false;
    }

    /// Number of events currently pending.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    // ── Globals ───────────────────────────────────────────────────────────────

    pub fn set_global(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.lock().globals.set(name, value);
    }

    pub fn global(&self, name: &str) -> Option<VarEntry> {
        self.inner.lock().globals.get(name).cloned()
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.inner.lock().globals.contains(name)
    }

    pub fn unset_global(&self, name: &str) -> bool {
        self.inner.lock().globals.unset(name)
    }

    pub fn set_global_byte_len(&self, name: &str, len: usize) -> bool {
        self.inner.lock().globals.set_byte_len(name, len)
    }

    /// Copy of the global table, for listing.
    pub fn globals_snapshot(&self) -> VarTable {
        self.inner.lock().globals.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
