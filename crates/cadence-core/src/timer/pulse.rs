use serde::{Deserialize, Serialize};

/// Color shown for the countdown digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseColor {
    #[default]
    Primary,
    Alternate,
}

/// Break-phase visual pulse.
///
/// While the break phase is on, the countdown text alternates between two
/// colors every 0.5 seconds, on a trigger independent of the 1-second clock.
/// The caller drives [`BreakPulse::toggle`] from its 500 ms interval and
/// calls [`BreakPulse::reset`] when the break ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakPulse {
    color: PulseColor,
}

impl BreakPulse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> PulseColor {
        self.color
    }

    /// Flip to the other color. Returns the new color.
    pub fn toggle(&mut self) -> PulseColor {
        self.color = match self.color {
            PulseColor::Primary => PulseColor::Alternate,
            PulseColor::Alternate => PulseColor::Primary,
        };
        self.color
    }

    /// Revert to the default color when leaving the break phase.
    pub fn reset(&mut self) {
        self.color = PulseColor::Primary;
    }
}
