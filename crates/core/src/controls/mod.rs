use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{timeline::Timer, FlickerError};

/// One of the four adjustment controls next to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Adjustment {
    SpeedUp,
    SpeedDown,
    ZoomIn,
    ZoomOut,
}

impl Adjustment {
    pub const ALL: [Adjustment; 4] = [
        Adjustment::SpeedUp,
        Adjustment::SpeedDown,
        Adjustment::ZoomIn,
        Adjustment::ZoomOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Adjustment::SpeedUp => "speed-up",
            Adjustment::SpeedDown => "speed-down",
            Adjustment::ZoomIn => "zoom-in",
            Adjustment::ZoomOut => "zoom-out",
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Adjustment {
    type Err = FlickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Adjustment::ALL
            .into_iter()
            .find(|adjustment| adjustment.as_str() == s)
            .ok_or_else(|| FlickerError::msg(format!("unknown adjustment `{s}`")))
    }
}

/// Signals a control emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlInput {
    Press,
    Release,
    Click,
}

/// Arbitrates between plain clicks and press-and-hold repeats.
///
/// Only one control repeats at a time; pressing another one replaces the
/// running repeat. `repeat_fired` is cleared when a press starts and when a
/// click consumes it, so a click that ends a hold is swallowed while a quick
/// click still applies exactly once.
#[derive(Debug, Default)]
pub struct HoldRepeat {
    held: Option<(Adjustment, Timer)>,
    repeat_fired: bool,
}

impl HoldRepeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, adjustment: Adjustment, now_ms: f64, cadence_ms: f64) {
        self.repeat_fired = false;
        self.held = Some((adjustment, Timer::repeating(now_ms, cadence_ms)));
    }

    /// Stops the repeat if `adjustment` is the control being held.
    pub fn release(&mut self, adjustment: Adjustment) {
        if self.held() == Some(adjustment) {
            self.held = None;
        }
    }

    /// Whether a click should apply its adjustment.
    pub fn click(&mut self) -> bool {
        let apply = !self.repeat_fired;
        self.repeat_fired = false;
        apply
    }

    pub fn held(&self) -> Option<Adjustment> {
        self.held.as_ref().map(|(adjustment, _)| *adjustment)
    }

    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.held.as_ref().map(|(_, timer)| timer.due_ms())
    }

    /// Fires the held control's repeat if it is due.
    pub fn poll(&mut self, now_ms: f64) -> Option<Adjustment> {
        let (adjustment, timer) = self.held.as_mut()?;
        timer.poll(now_ms)?;
        self.repeat_fired = true;
        Some(*adjustment)
    }
}
