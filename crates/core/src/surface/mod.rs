use crate::StateCode;

/// Rendering target for one flicker stream.
///
/// How a state code turns into light (styled bars, pixels, LEDs) is up to the
/// implementation.
pub trait Surface {
    /// Scale the surface is mounted with. Zoom steps are relative to it.
    fn base_scale_px(&self) -> f64;

    fn apply_state(&mut self, code: StateCode);

    fn apply_scale(&mut self, scale_px: f64);

    fn set_play_indicator(&mut self, running: bool);
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn base_scale_px(&self) -> f64 {
        (**self).base_scale_px()
    }

    fn apply_state(&mut self, code: StateCode) {
        (**self).apply_state(code)
    }

    fn apply_scale(&mut self, scale_px: f64) {
        (**self).apply_scale(scale_px)
    }

    fn set_play_indicator(&mut self, running: bool) {
        (**self).set_play_indicator(running)
    }
}

/// Surface that records every update it receives. Used by headless hosts and
/// tests.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    base_scale_px: f64,
    scale_px: f64,
    states: Vec<StateCode>,
    playing: Option<bool>,
}

impl MemorySurface {
    pub fn new(base_scale_px: f64) -> Self {
        Self {
            base_scale_px,
            scale_px: base_scale_px,
            states: Vec::new(),
            playing: None,
        }
    }

    pub fn current(&self) -> Option<StateCode> {
        self.states.last().copied()
    }

    /// Every state applied so far, oldest first.
    pub fn history(&self) -> &[StateCode] {
        &self.states
    }

    pub fn scale_px(&self) -> f64 {
        self.scale_px
    }

    /// Last value pushed to the play/pause indicator, if any.
    pub fn play_indicator(&self) -> Option<bool> {
        self.playing
    }
}

impl Surface for MemorySurface {
    fn base_scale_px(&self) -> f64 {
        self.base_scale_px
    }

    fn apply_state(&mut self, code: StateCode) {
        self.states.push(code);
    }

    fn apply_scale(&mut self, scale_px: f64) {
        self.scale_px = scale_px;
    }

    fn set_play_indicator(&mut self, running: bool) {
        self.playing = Some(running);
    }
}
