//! Core types and constants for the liveness engine.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Number of per-tick outcomes retained for each probe.
pub const HISTORY_SIZE: usize = 60;

/// Verdict/render cadence. Slightly longer than the probe's one-second
/// reply interval so a single delayed reply does not read as a failure.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1100);

/// Upper bound on a single multiplexer wait. Keeps exit detection and
/// tick scheduling responsive when no probe output arrives.
pub const MUX_WAIT: Duration = Duration::from_millis(100);

/// Identifier for a probe within one monitor run.
pub type ProbeId = u32;

/// Address family of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrFamily {
    V4,
    V6,
}

impl fmt::Display for AddrFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrFamily::V4 => write!(f, "v4"),
            AddrFamily::V6 => write!(f, "v6"),
        }
    }
}

/// Outcome of one tick for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// No verdict yet (history padding before the first tick).
    Unknown,
    /// A success line was seen within the staleness threshold.
    Up,
    /// No recent success line.
    Down,
}

/// Fixed-length FIFO of per-tick outcomes.
///
/// Always exactly [`HISTORY_SIZE`] entries long: a new outcome evicts
/// the oldest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<Outcome>,
}

impl History {
    /// Create a history padded with [`Outcome::Unknown`].
    pub fn new() -> Self {
        let mut entries = VecDeque::with_capacity(HISTORY_SIZE);
        entries.resize(HISTORY_SIZE, Outcome::Unknown);
        Self { entries }
    }

    /// Append an outcome, evicting the oldest entry.
    pub fn push(&mut self, outcome: Outcome) {
        self.entries.pop_front();
        self.entries.push_back(outcome);
    }

    /// Outcomes from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.entries.iter().copied()
    }

    /// The most recent outcome.
    pub fn latest(&self) -> Outcome {
        self.entries.back().copied().unwrap_or(Outcome::Unknown)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_length_is_constant() {
        let mut history = History::new();
        assert_eq!(history.len(), HISTORY_SIZE);

        for _ in 0..HISTORY_SIZE * 2 {
            history.push(Outcome::Up);
            assert_eq!(history.len(), HISTORY_SIZE);
        }
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut history = History::new();
        history.push(Outcome::Down);
        history.push(Outcome::Up);

        assert_eq!(history.latest(), Outcome::Up);
        // The padding shifted out from the front, not the appended entries.
        assert_eq!(history.iter().next(), Some(Outcome::Unknown));

        for _ in 0..HISTORY_SIZE {
            history.push(Outcome::Up);
        }
        assert!(history.iter().all(|o| o == Outcome::Up));
    }

    #[test]
    fn addr_family_display() {
        assert_eq!(AddrFamily::V4.to_string(), "v4");
        assert_eq!(AddrFamily::V6.to_string(), "v6");
    }
}
