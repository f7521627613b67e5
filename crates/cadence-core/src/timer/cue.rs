use serde::{Deserialize, Serialize};

/// A short audio cue signaling progress within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    /// Short cue, first two seconds of each 5-second group.
    Tick,
    /// Longer cue, last three seconds of each 5-second group.
    Tock,
    /// Singing-bowl cue fired once, 5 seconds before the active phase ends.
    Bell,
    /// Optional repeating cue during the break phase.
    Heartbeat,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Tick => "tick",
            Cue::Tock => "tock",
            Cue::Bell => "bell",
            Cue::Heartbeat => "heartbeat",
        }
    }
}

/// What the break phase sounds like.
///
/// The break phase either stays silent (only the visual pulse runs) or plays
/// a heartbeat cue on every tick. Both behaviors shipped at different points;
/// `Silent` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakCuePolicy {
    #[default]
    Silent,
    Heartbeat,
}

/// Tick/tock selection for the active phase.
///
/// Elapsed seconds are partitioned into consecutive 5-second groups; the
/// first two seconds of a group are `Tick`, the remaining three `Tock`,
/// giving a short-short-long-long-long pattern. No cue at `elapsed == 0`.
pub fn active_cue(elapsed: u32) -> Option<Cue> {
    if elapsed == 0 {
        return None;
    }
    if (elapsed - 1) % 5 < 2 {
        Some(Cue::Tick)
    } else {
        Some(Cue::Tock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cue_before_first_second() {
        assert_eq!(active_cue(0), None);
    }

    #[test]
    fn five_second_group_pattern() {
        let cues: Vec<_> = (1..=10).map(|e| active_cue(e).unwrap()).collect();
        use Cue::{Tick, Tock};
        assert_eq!(
            cues,
            vec![Tick, Tick, Tock, Tock, Tock, Tick, Tick, Tock, Tock, Tock]
        );
    }

    #[test]
    fn pattern_repeats_past_first_minute() {
        assert_eq!(active_cue(61), Some(Cue::Tick));
        assert_eq!(active_cue(65), Some(Cue::Tock));
    }
}
