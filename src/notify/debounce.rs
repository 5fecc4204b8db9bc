//! Cooldown-window debouncing for write events.

use std::time::{Duration, Instant};

/// Default minimum interval between accepted dispatch cycles.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Rejects events that arrive within `window` of the last accepted one.
///
/// There is no trailing fire: a rejected event is dropped, not deferred.
/// Checking and recording are separate so the caller can decline to record
/// an event whose reload failed.
///
/// # Examples
///
/// ```rust
/// use hotswap_configurator::notify::Debouncer;
/// use std::time::{Duration, Instant};
///
/// let mut debouncer = Debouncer::new(Duration::from_secs(1));
/// let start = Instant::now();
///
/// assert!(debouncer.is_ready(start));
/// debouncer.record(start);
///
/// assert!(!debouncer.is_ready(start + Duration::from_millis(100)));
/// assert!(debouncer.is_ready(start + Duration::from_millis(1500)));
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer that has not accepted anything yet.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Whether an event at `now` falls outside the cooldown window.
    ///
    /// An event stamped before the last accepted one counts as inside it.
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_accepted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        }
    }

    /// Mark an event at `now` as accepted.
    pub fn record(&mut self, now: Instant) {
        self.last_accepted = Some(now);
    }

    /// Check and record in one step. Returns whether the event was accepted.
    pub fn accept(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.record(now);
            true
        } else {
            false
        }
    }

    /// The cooldown window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// When the last accepted event happened, if any.
    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
