use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change produces an Event. The CLI prints these as JSON
/// lines in `--json` mode; a GUI front end would subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// The countdown rolled over into the other phase.
    PhaseChanged {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        remaining_secs: u32,
        total_secs: u32,
        progress: f64,
        running: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn timer_started(duration_secs: u32) -> Self {
        Event::TimerStarted {
            duration_secs,
            at: Utc::now(),
        }
    }

    pub fn timer_paused(remaining_secs: u32) -> Self {
        Event::TimerPaused {
            remaining_secs,
            at: Utc::now(),
        }
    }

    pub fn timer_resumed(remaining_secs: u32) -> Self {
        Event::TimerResumed {
            remaining_secs,
            at: Utc::now(),
        }
    }

    pub fn phase_changed(phase: Phase, remaining_secs: u32) -> Self {
        Event::PhaseChanged {
            phase,
            remaining_secs,
            at: Utc::now(),
        }
    }

    pub fn timer_reset() -> Self {
        Event::TimerReset { at: Utc::now() }
    }
}
