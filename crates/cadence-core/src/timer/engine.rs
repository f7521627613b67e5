//! Interval timer engine.
//!
//! The engine is a tick-driven state machine. It does not own a clock -- the
//! caller schedules a 1-second interval while the timer is running and calls
//! `tick()` once per firing. Every mutation returns the side-effect
//! [`Command`]s the caller must enact (audio, keep-awake, trigger
//! start/cancel), so the machine itself performs no I/O.
//!
//! ## Phase cycle
//!
//! ```text
//! Active (active_secs) -> Break (break_secs) -> Active -> ...
//! ```
//!
//! The alternation is periodic and never terminates on its own.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::command::Command;
use super::cue::{active_cue, BreakCuePolicy, Cue};
use crate::error::CoreError;
use crate::events::Event;

/// Seconds before the end of the active phase at which the bell fires.
const BELL_LEAD_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Active,
    Break,
}

/// Immutable per-session timer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Length of one active cycle in seconds.
    pub active_secs: u32,
    /// Fixed length of the break cycle in seconds.
    pub break_secs: u32,
    /// Whether the break phase plays a heartbeat cue or stays silent.
    #[serde(default)]
    pub break_cue: BreakCuePolicy,
}

impl TimerConfig {
    pub fn new(active_secs: u32, break_secs: u32) -> Self {
        Self {
            active_secs,
            break_secs,
            break_cue: BreakCuePolicy::Silent,
        }
    }
}

/// Read-only view of the timer state after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub remaining_secs: u32,
    /// Total length of the current phase.
    pub total_secs: u32,
    /// Arc fraction for the circular indicator, 0.0 ..= 1.0.
    pub progress: f64,
    pub running: bool,
}

/// Result of one clock firing.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub snapshot: Snapshot,
    /// The phase entered on this tick, if it changed.
    pub phase_changed: Option<Phase>,
    pub commands: Vec<Command>,
}

/// Progress fraction for the circular indicator.
///
/// Full circle at the top of the active phase, empty at the instant the
/// countdown reaches zero. The break phase always shows a full circle;
/// that is an intentional visual choice.
pub fn progress(phase: Phase, remaining_secs: u32, active_secs: u32) -> f64 {
    match phase {
        Phase::Active => f64::from(remaining_secs) / f64::from(active_secs),
        Phase::Break => 1.0,
    }
}

/// Core interval timer state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalTimerEngine {
    config: TimerConfig,
    phase: Phase,
    remaining: u32,
    running: bool,
    /// Whether the keep-awake lock is currently held on our behalf.
    keep_awake_held: bool,
}

impl IntervalTimerEngine {
    /// Create an engine in the stopped state, full active phase ahead.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfiguration`] if either duration is zero.
    pub fn new(config: TimerConfig) -> Result<Self, CoreError> {
        if config.active_secs == 0 {
            return Err(CoreError::InvalidConfiguration {
                field: "active_secs",
                message: "active duration must be a positive number of seconds".into(),
            });
        }
        if config.break_secs == 0 {
            return Err(CoreError::InvalidConfiguration {
                field: "break_secs",
                message: "break duration must be a positive number of seconds".into(),
            });
        }
        Ok(Self {
            config,
            phase: Phase::Active,
            remaining: config.active_secs,
            running: false,
            keep_awake_held: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn total_secs(&self) -> u32 {
        match self.phase {
            Phase::Active => self.config.active_secs,
            Phase::Break => self.config.break_secs,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            remaining_secs: self.remaining,
            total_secs: self.total_secs(),
            progress: progress(self.phase, self.remaining, self.config.active_secs),
            running: self.running,
        }
    }

    /// Build a full state snapshot event, timestamped now.
    pub fn snapshot_event(&self) -> Event {
        let snap = self.snapshot();
        Event::StateSnapshot {
            phase: snap.phase,
            remaining_secs: snap.remaining_secs,
            total_secs: snap.total_secs,
            progress: snap.progress,
            running: snap.running,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or pause the countdown.
    ///
    /// Idempotent: setting the current value emits nothing, so a caller
    /// that stops twice produces no duplicate release or cancel commands.
    pub fn set_running(&mut self, running: bool) -> Vec<Command> {
        if self.running == running {
            return Vec::new();
        }
        self.running = running;
        if running {
            self.keep_awake_held = true;
            // StartClock replaces any live clock; the caller must cancel
            // the old interval before arming the new one.
            vec![Command::StartClock, Command::AcquireKeepAwake]
        } else {
            self.keep_awake_held = false;
            vec![Command::StopClock, Command::ReleaseKeepAwake]
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `None` while not running: the clock source is expected to be
    /// cancelled on pause, but a callback racing the cancellation must not
    /// move the countdown.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.running {
            return None;
        }

        self.remaining -= 1;
        let mut commands = Vec::new();
        let mut phase_changed = None;

        // Cue selection runs against the phase the second was spent in, so
        // the final second of an active phase still sounds its tock
        // (elapsed == active_secs at the boundary).
        let mut cues = Vec::new();
        match self.phase {
            Phase::Active => {
                if self.remaining == BELL_LEAD_SECS {
                    cues.push(Cue::Bell);
                }
                let elapsed = self.config.active_secs - self.remaining;
                if let Some(cue) = active_cue(elapsed) {
                    cues.push(cue);
                }
            }
            Phase::Break => {
                if self.config.break_cue == BreakCuePolicy::Heartbeat {
                    cues.push(Cue::Heartbeat);
                }
            }
        }

        if self.remaining == 0 {
            // In-flight cues stop across the boundary.
            commands.push(Command::StopCues);
            match self.phase {
                Phase::Active => {
                    self.phase = Phase::Break;
                    self.remaining = self.config.break_secs;
                    commands.push(Command::StartBreakPulse);
                }
                Phase::Break => {
                    self.phase = Phase::Active;
                    self.remaining = self.config.active_secs;
                    commands.push(Command::StopBreakPulse);
                }
            }
            phase_changed = Some(self.phase);
        }

        commands.extend(cues.into_iter().map(|cue| Command::PlayCue { cue }));

        Some(TickOutcome {
            snapshot: self.snapshot(),
            phase_changed,
            commands,
        })
    }

    /// Return to the freshly created state and cancel everything.
    pub fn reset(&mut self) -> Vec<Command> {
        if self.is_pristine() {
            return Vec::new();
        }
        let mut commands = vec![Command::StopCues];
        if self.running {
            commands.push(Command::StopClock);
        }
        if self.phase == Phase::Break {
            commands.push(Command::StopBreakPulse);
        }
        if self.keep_awake_held {
            commands.push(Command::ReleaseKeepAwake);
        }
        self.phase = Phase::Active;
        self.remaining = self.config.active_secs;
        self.running = false;
        self.keep_awake_held = false;
        commands
    }

    /// Tear down on exit: cancels all triggers and releases keep-awake
    /// regardless of running state. Safe to call more than once.
    pub fn teardown(&mut self) -> Vec<Command> {
        self.reset()
    }

    fn is_pristine(&self) -> bool {
        self.phase == Phase::Active
            && self.remaining == self.config.active_secs
            && !self.running
            && !self.keep_awake_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine(active: u32, brk: u32) -> IntervalTimerEngine {
        IntervalTimerEngine::new(TimerConfig::new(active, brk)).unwrap()
    }

    fn cues(outcome: &TickOutcome) -> Vec<Cue> {
        outcome
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::PlayCue { cue } => Some(*cue),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_engine_starts_stopped_and_full() {
        let e = engine(30, 6);
        assert_eq!(e.phase(), Phase::Active);
        assert_eq!(e.remaining_secs(), 30);
        assert!(!e.is_running());
        assert_eq!(e.snapshot().progress, 1.0);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = IntervalTimerEngine::new(TimerConfig::new(0, 6)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidConfiguration { field: "active_secs", .. }
        ));
        let err = IntervalTimerEngine::new(TimerConfig::new(30, 0)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidConfiguration { field: "break_secs", .. }
        ));
    }

    #[test]
    fn tick_while_stopped_is_a_no_op() {
        let mut e = engine(30, 6);
        assert!(e.tick().is_none());
        assert_eq!(e.remaining_secs(), 30);
    }

    #[test]
    fn start_acquires_keep_awake_and_clock() {
        let mut e = engine(30, 6);
        assert_eq!(
            e.set_running(true),
            vec![Command::StartClock, Command::AcquireKeepAwake]
        );
        assert_eq!(
            e.set_running(false),
            vec![Command::StopClock, Command::ReleaseKeepAwake]
        );
    }

    #[test]
    fn stop_is_idempotent() {
        let mut e = engine(30, 6);
        e.set_running(true);
        assert!(!e.set_running(false).is_empty());
        assert!(e.set_running(false).is_empty());
    }

    #[test]
    fn active_and_break_alternate_forever() {
        let mut e = engine(30, 6);
        e.set_running(true);
        for _ in 0..30 {
            e.tick().unwrap();
        }
        assert_eq!(e.phase(), Phase::Break);
        assert_eq!(e.remaining_secs(), 6);
        for _ in 0..6 {
            e.tick().unwrap();
        }
        assert_eq!(e.phase(), Phase::Active);
        assert_eq!(e.remaining_secs(), 30);
        // A second full cycle behaves the same.
        for _ in 0..36 {
            e.tick().unwrap();
        }
        assert_eq!(e.phase(), Phase::Active);
        assert_eq!(e.remaining_secs(), 30);
    }

    #[test]
    fn phase_transition_stops_cues_and_runs_pulse() {
        let mut e = engine(3, 2);
        e.set_running(true);
        e.tick().unwrap();
        e.tick().unwrap();
        let into_break = e.tick().unwrap();
        assert_eq!(into_break.phase_changed, Some(Phase::Break));
        assert_eq!(into_break.commands[0], Command::StopCues);
        assert!(into_break.commands.contains(&Command::StartBreakPulse));

        e.tick().unwrap();
        let into_active = e.tick().unwrap();
        assert_eq!(into_active.phase_changed, Some(Phase::Active));
        assert_eq!(into_active.commands[0], Command::StopCues);
        assert!(into_active.commands.contains(&Command::StopBreakPulse));
    }

    #[test]
    fn cue_pattern_for_ten_second_interval() {
        let mut e = engine(10, 6);
        e.set_running(true);
        let mut pattern = Vec::new();
        let mut bell_at = Vec::new();
        for elapsed in 1..=10 {
            let outcome = e.tick().unwrap();
            let fired = cues(&outcome);
            if fired.contains(&Cue::Bell) {
                bell_at.push(elapsed);
            }
            pattern.extend(fired.into_iter().filter(|c| *c != Cue::Bell));
        }
        use Cue::{Tick, Tock};
        assert_eq!(
            pattern,
            vec![Tick, Tick, Tock, Tock, Tock, Tick, Tick, Tock, Tock, Tock]
        );
        // Bell fires exactly once, 5 seconds before the phase ends.
        assert_eq!(bell_at, vec![5]);
    }

    #[test]
    fn bell_precedes_the_regular_cue_on_its_tick() {
        let mut e = engine(10, 6);
        e.set_running(true);
        for _ in 0..4 {
            e.tick().unwrap();
        }
        let outcome = e.tick().unwrap();
        assert_eq!(
            cues(&outcome),
            vec![Cue::Bell, Cue::Tock],
            "bell then the elapsed-5 tock"
        );
    }

    #[test]
    fn break_is_silent_by_default() {
        let mut e = engine(2, 3);
        e.set_running(true);
        e.tick().unwrap();
        let into_break = e.tick().unwrap();
        assert_eq!(into_break.snapshot.phase, Phase::Break);
        // The boundary tick still carries the finishing second's cue.
        assert_eq!(cues(&into_break), vec![Cue::Tick]);
        let mid_break = e.tick().unwrap();
        assert!(cues(&mid_break).is_empty());
        let end_break = e.tick().unwrap();
        assert!(cues(&end_break).is_empty());
    }

    #[test]
    fn heartbeat_policy_fires_every_break_tick() {
        let mut config = TimerConfig::new(2, 3);
        config.break_cue = BreakCuePolicy::Heartbeat;
        let mut e = IntervalTimerEngine::new(config).unwrap();
        e.set_running(true);
        e.tick().unwrap();
        e.tick().unwrap();
        assert_eq!(e.phase(), Phase::Break);
        let mid_break = e.tick().unwrap();
        assert_eq!(cues(&mid_break), vec![Cue::Heartbeat]);
        let later = e.tick().unwrap();
        assert_eq!(cues(&later), vec![Cue::Heartbeat]);
    }

    #[test]
    fn progress_is_full_at_start_empty_at_zero_full_in_break() {
        assert_eq!(progress(Phase::Active, 30, 30), 1.0);
        assert_eq!(progress(Phase::Active, 0, 30), 0.0);
        assert_eq!(progress(Phase::Break, 4, 30), 1.0);

        let mut e = engine(4, 2);
        e.set_running(true);
        let snap = e.tick().unwrap().snapshot;
        assert_eq!(snap.progress, 0.75);
        e.tick().unwrap();
        e.tick().unwrap();
        let in_break = e.tick().unwrap().snapshot;
        assert_eq!(in_break.phase, Phase::Break);
        assert_eq!(in_break.progress, 1.0);
    }

    #[test]
    fn reset_restores_the_created_state() {
        let mut e = engine(30, 6);
        let fresh = e.snapshot();
        e.set_running(true);
        for _ in 0..17 {
            e.tick().unwrap();
        }
        let commands = e.reset();
        assert!(commands.contains(&Command::StopClock));
        assert!(commands.contains(&Command::ReleaseKeepAwake));
        assert_eq!(e.snapshot(), fresh);
        // Second reset finds nothing left to cancel.
        assert!(e.reset().is_empty());
    }

    #[test]
    fn teardown_mid_break_cancels_all_triggers() {
        let mut e = engine(2, 5);
        e.set_running(true);
        e.tick().unwrap();
        e.tick().unwrap();
        assert_eq!(e.phase(), Phase::Break);
        let commands = e.teardown();
        assert!(commands.contains(&Command::StopClock));
        assert!(commands.contains(&Command::StopBreakPulse));
        assert!(commands.contains(&Command::ReleaseKeepAwake));
        assert!(e.teardown().is_empty());
    }

    #[test]
    fn teardown_while_paused_still_stops_cues_only_once() {
        let mut e = engine(10, 6);
        e.set_running(true);
        e.tick().unwrap();
        e.set_running(false);
        let commands = e.teardown();
        // Keep-awake was already released on pause.
        assert!(!commands.contains(&Command::ReleaseKeepAwake));
        assert!(commands.contains(&Command::StopCues));
        assert!(e.teardown().is_empty());
    }

    proptest! {
        #[test]
        fn remaining_stays_in_bounds(
            active in 1u32..120,
            brk in 1u32..30,
            ops in proptest::collection::vec(0u8..3, 0..400),
        ) {
            let mut e = engine(active, brk);
            let cap = active.max(brk);
            for op in ops {
                match op {
                    0 => { e.set_running(true); }
                    1 => { e.set_running(false); }
                    _ => { e.tick(); }
                }
                let snap = e.snapshot();
                prop_assert!(snap.remaining_secs >= 1);
                prop_assert!(snap.remaining_secs <= cap);
                match snap.phase {
                    Phase::Active => prop_assert!(snap.remaining_secs <= active),
                    Phase::Break => prop_assert!(snap.remaining_secs <= brk),
                }
                prop_assert!((0.0..=1.0).contains(&snap.progress));
            }
        }

        #[test]
        fn reset_always_returns_to_created_state(
            active in 1u32..120,
            brk in 1u32..30,
            ticks in 0usize..300,
        ) {
            let mut e = engine(active, brk);
            let fresh = e.snapshot();
            e.set_running(true);
            for _ in 0..ticks {
                e.tick();
            }
            e.reset();
            prop_assert_eq!(e.snapshot(), fresh);
        }
    }
}
