//! # Cadence Core Library
//!
//! Core logic for Cadence, an interval timer with audio cues. The heart of
//! the crate is [`IntervalTimerEngine`], a tick-driven state machine: an
//! external 1-second clock drives `tick()`, and every transition returns a
//! snapshot plus the side-effect [`Command`]s the caller must enact (play a
//! cue, acquire the keep-awake lock, start or cancel a trigger). The engine
//! performs no I/O of its own, which keeps it testable without real timers
//! or audio.
//!
//! ## Key Components
//!
//! - [`IntervalTimerEngine`]: countdown, phase transitions, cue selection
//! - [`Command`] / [`CommandRunner`]: side effects as data, dispatched to
//!   the [`CuePlayer`] and [`KeepAwake`] collaborators
//! - [`BreakPulse`]: the 0.5-second break-phase color toggle
//! - [`Config`]: TOML configuration management

pub mod config;
pub mod error;
pub mod events;
pub mod timer;

pub use config::Config;
pub use error::{ConfigError, CoreError};
pub use events::Event;
pub use timer::{
    BreakCuePolicy, BreakPulse, Command, CommandRunner, Cue, CuePlayer, IntervalTimerEngine,
    KeepAwake, Phase, PulseColor, Snapshot, TickOutcome, TimerConfig,
};
