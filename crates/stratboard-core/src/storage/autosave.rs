//! Debounced auto-save.
//!
//! Every board mutation restarts a short timer; the board is written once
//! the timer runs out without further changes.

use super::StorageError;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default debounce delay in milliseconds.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 1000;

/// Persistence state shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    /// A change is waiting to be written.
    Saving,
    /// The last write failed; the board is still dirty.
    Failed(String),
}

impl SaveStatus {
    pub fn label(&self) -> &str {
        match self {
            SaveStatus::Saved => "Saved",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Failed(_) => "Save failed",
        }
    }
}

/// Tracks when a debounced save is due.
#[derive(Debug, Clone)]
pub struct AutoSaveScheduler {
    delay: Duration,
    last_change: Option<Instant>,
    dirty: bool,
    status: SaveStatus,
}

impl Default for AutoSaveScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_AUTOSAVE_DELAY_MS))
    }
}

impl AutoSaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_change: None,
            dirty: false,
            status: SaveStatus::Saved,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record a mutation, restarting the debounce timer.
    pub fn note_change(&mut self, now: Instant) {
        self.dirty = true;
        self.last_change = Some(now);
        self.status = SaveStatus::Saving;
    }

    /// Whether the debounce delay has elapsed since the last change.
    pub fn due(&self, now: Instant) -> bool {
        match self.last_change {
            Some(last) if self.dirty => now.saturating_duration_since(last) >= self.delay,
            _ => false,
        }
    }

    /// Like [`due`](Self::due), but stops the timer when it fires so the
    /// same change is written once.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.due(now) {
            self.last_change = None;
            true
        } else {
            false
        }
    }

    pub fn on_saved(&mut self) {
        self.dirty = false;
        self.last_change = None;
        self.status = SaveStatus::Saved;
    }

    /// Keep the board dirty; the next change or an explicit flush retries.
    pub fn on_failed(&mut self, error: &StorageError) {
        log::error!("Auto-save failed: {}", error);
        self.last_change = None;
        self.status = SaveStatus::Failed(error.to_string());
    }
}
