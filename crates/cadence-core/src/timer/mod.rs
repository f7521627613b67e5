mod command;
mod cue;
mod engine;
mod pulse;

pub use command::{Command, CommandRunner, CuePlayer, KeepAwake};
pub use cue::{active_cue, BreakCuePolicy, Cue};
pub use engine::{progress, IntervalTimerEngine, Phase, Snapshot, TickOutcome, TimerConfig};
pub use pulse::{BreakPulse, PulseColor};
