//! Side-effect commands emitted by the engine.
//!
//! The engine never performs effects itself. Every mutation returns a list
//! of [`Command`]s describing what the caller must enact: play or stop audio,
//! acquire or release the keep-awake lock, start or cancel the periodic
//! triggers. This keeps the state machine free of timers and I/O and makes
//! it unit-testable without either.

use serde::{Deserialize, Serialize};

use super::cue::Cue;

/// A side effect the caller must execute after a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Play the given cue from the start.
    PlayCue { cue: Cue },
    /// Stop any in-flight cues. Emitted before a phase transition's cues.
    StopCues,
    /// Prevent the display from sleeping.
    AcquireKeepAwake,
    /// Allow the display to sleep again.
    ReleaseKeepAwake,
    /// Start the 1-second countdown clock.
    StartClock,
    /// Cancel the countdown clock.
    StopClock,
    /// Start the 0.5-second break color pulse.
    StartBreakPulse,
    /// Cancel the break color pulse and revert the color.
    StopBreakPulse,
}

/// Audio collaborator. Play failures are non-fatal to the countdown.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue) -> std::io::Result<()>;
    fn stop_all(&mut self);
}

/// Keep-awake collaborator, backed by whatever the platform offers.
pub trait KeepAwake {
    fn acquire(&mut self) -> std::io::Result<()>;
    fn release(&mut self);
}

impl<K: KeepAwake + ?Sized> KeepAwake for Box<K> {
    fn acquire(&mut self) -> std::io::Result<()> {
        (**self).acquire()
    }
    fn release(&mut self) {
        (**self).release()
    }
}

/// Dispatches audio and keep-awake commands to the collaborators.
///
/// Trigger commands (`StartClock`, `StopClock`, `StartBreakPulse`,
/// `StopBreakPulse`) are left to the caller, which owns the interval
/// sources; [`CommandRunner::apply`] returns them untouched.
pub struct CommandRunner<P, K> {
    player: P,
    keep_awake: K,
}

impl<P: CuePlayer, K: KeepAwake> CommandRunner<P, K> {
    pub fn new(player: P, keep_awake: K) -> Self {
        Self { player, keep_awake }
    }

    /// Execute one command. Returns `Some(command)` if it is a trigger
    /// command the caller must handle itself.
    pub fn apply(&mut self, command: Command) -> Option<Command> {
        match command {
            Command::PlayCue { cue } => {
                if let Err(e) = self.player.play(cue) {
                    tracing::warn!(cue = cue.as_str(), error = %e, "cue playback failed");
                }
                None
            }
            Command::StopCues => {
                self.player.stop_all();
                None
            }
            Command::AcquireKeepAwake => {
                if let Err(e) = self.keep_awake.acquire() {
                    tracing::warn!(error = %e, "keep-awake acquire failed");
                }
                None
            }
            Command::ReleaseKeepAwake => {
                self.keep_awake.release();
                None
            }
            other => Some(other),
        }
    }
}
