//! Rest stopwatch for one entry.
//!
//! The stopwatch is a wall-clock-based accumulator. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically while it runs. Elapsed time is flushed from the timestamp
//! of the last flush, so tick granularity only affects how fresh
//! `elapsed_secs()` is, never its correctness.

use serde::{Deserialize, Serialize};

use super::now_ms;

/// Count-up rest timer with start/pause/reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestTimer {
    /// Accumulated elapsed time in milliseconds.
    elapsed_ms: u64,
    /// Timestamp (ms since epoch) of the last flush while running.
    /// `Some` is the single running marker: a second `start()` finds it
    /// set and leaves it alone, so there is never a second accumulation
    /// source.
    #[serde(default)]
    last_flush_epoch_ms: Option<u64>,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(&self) -> bool {
        self.last_flush_epoch_ms.is_some()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_ms / 1000
    }

    /// Begin accumulating. Idempotent while already running.
    pub fn start(&mut self) -> bool {
        self.start_at(now_ms())
    }

    pub fn start_at(&mut self, now_ms: u64) -> bool {
        if self.last_flush_epoch_ms.is_some() {
            return false;
        }
        self.last_flush_epoch_ms = Some(now_ms);
        true
    }

    /// Stop accumulating, retaining the elapsed time.
    /// No-op when not running.
    pub fn pause(&mut self) -> bool {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now_ms: u64) -> bool {
        if self.last_flush_epoch_ms.is_none() {
            return false;
        }
        self.flush(now_ms);
        self.last_flush_epoch_ms = None;
        true
    }

    /// Stop and zero the elapsed time.
    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
        self.last_flush_epoch_ms = None;
    }

    /// Call periodically while running to keep `elapsed_secs()` fresh.
    pub fn tick(&mut self) {
        self.tick_at(now_ms());
    }

    pub fn tick_at(&mut self, now_ms: u64) {
        if self.last_flush_epoch_ms.is_some() {
            self.flush(now_ms);
        }
    }

    fn flush(&mut self, now_ms: u64) {
        if let Some(last) = self.last_flush_epoch_ms {
            self.elapsed_ms += now_ms.saturating_sub(last);
            self.last_flush_epoch_ms = Some(now_ms);
        }
    }
}
