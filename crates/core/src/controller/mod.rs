use serde::{Deserialize, Serialize};

use crate::{
    controls::{Adjustment, ControlInput, HoldRepeat},
    encoder::{self, EncodedStream},
    storage::{Preferences, StoredPreference},
    surface::Surface,
    timeline::Timer,
    FlickerError, PlaybackConfig, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Stopped,
    Running,
}

/// Plays one encoded stream on one surface.
///
/// The controller is driven by [`PlaybackController::advance`]: the host calls
/// it with the current time and the timers that came due since the last call
/// fire in deadline order. Nothing here blocks or spawns.
#[derive(Debug)]
pub struct PlaybackController<S: Surface> {
    stream: EncodedStream,
    surface: S,
    config: PlaybackConfig,
    preferences: Option<Preferences>,
    index: usize,
    interval_ms: f64,
    scale_px: f64,
    base_scale_px: f64,
    state: PlaybackState,
    tick: Option<Timer>,
    controls: HoldRepeat,
}

impl<S: Surface> PlaybackController<S> {
    /// Encodes `payload`, restores stored preferences and, if configured to,
    /// starts playing at `now_ms`.
    pub fn new(
        payload: &str,
        surface: S,
        config: PlaybackConfig,
        preferences: Option<Preferences>,
        now_ms: f64,
    ) -> Result<Self> {
        config.validate()?;
        let stream = encoder::encode(payload)?;

        let base_scale_px = surface.base_scale_px();
        if !base_scale_px.is_finite() || base_scale_px <= 0.0 {
            return Err(FlickerError::InvalidConfig(format!(
                "surface base scale must be positive, got {base_scale_px}"
            )));
        }

        let preferences = preferences.filter(|_| config.features.persistence);
        let mut controller = Self {
            stream,
            surface,
            interval_ms: config.initial_interval_ms,
            scale_px: base_scale_px,
            base_scale_px,
            config,
            preferences,
            index: 0,
            state: PlaybackState::Stopped,
            tick: None,
            controls: HoldRepeat::new(),
        };

        if let Some(restored) = controller.preferences.as_ref().and_then(Preferences::restore) {
            tracing::debug!(
                interval_ms = restored.interval_ms,
                scale_px = restored.scale_px,
                "restored playback preference"
            );
            // Stored values come from outside; hold them to the same bounds
            // the adjustment laws keep.
            controller.interval_ms = restored.interval_ms.clamp(
                controller.config.min_interval_ms,
                controller.config.max_interval_ms,
            );
            controller.scale_px = restored.scale_px.max(controller.min_scale_px());
            controller.surface.apply_scale(controller.scale_px);
        }

        if controller.config.features.autostart {
            controller.play(now_ms);
        } else {
            controller.surface.set_play_indicator(false);
        }
        Ok(controller)
    }

    pub fn stream(&self) -> &EncodedStream {
        &self.stream
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn scale_px(&self) -> f64 {
        self.scale_px
    }

    pub fn base_scale_px(&self) -> f64 {
        self.base_scale_px
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    /// Starts playback. The current state is shown immediately.
    pub fn play(&mut self, now_ms: f64) {
        if self.is_running() {
            return;
        }
        self.state = PlaybackState::Running;
        self.tick = Some(Timer::once(now_ms, 0.0));
        self.surface.set_play_indicator(true);
        tracing::info!(index = self.index, interval_ms = self.interval_ms, "playback started");
    }

    /// Stops playback. The surface keeps showing its last state.
    pub fn pause(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state = PlaybackState::Stopped;
        self.tick = None;
        self.surface.set_play_indicator(false);
        tracing::info!(index = self.index, "playback paused");
    }

    pub fn toggle(&mut self, now_ms: f64) {
        match self.state {
            PlaybackState::Running => self.pause(),
            PlaybackState::Stopped => self.play(now_ms),
        }
    }

    /// Earliest pending tick or repeat deadline.
    pub fn next_deadline_ms(&self) -> Option<f64> {
        let tick = self.tick.as_ref().map(Timer::due_ms);
        let repeat = self.controls.next_deadline_ms();
        match (tick, repeat) {
            (Some(tick), Some(repeat)) => Some(tick.min(repeat)),
            (tick, repeat) => tick.or(repeat),
        }
    }

    /// Fires every timer due at or before `now_ms`, earliest first. Returns the
    /// number of timers fired.
    ///
    /// A tick fires at most once per call: missed ticks are not replayed, the
    /// next one is scheduled `interval_ms` after `now_ms`.
    pub fn advance(&mut self, now_ms: f64) -> usize {
        let mut fired = 0;
        loop {
            let tick = self
                .tick
                .as_ref()
                .map(Timer::due_ms)
                .filter(|&due| due <= now_ms);
            let repeat = self
                .controls
                .next_deadline_ms()
                .filter(|&due| due <= now_ms);

            match (tick, repeat) {
                (None, None) => break,
                (Some(tick), Some(repeat)) if repeat < tick => self.fire_repeat(repeat),
                (Some(tick), _) => self.fire_tick(tick, now_ms),
                (None, Some(repeat)) => self.fire_repeat(repeat),
            }
            fired += 1;
        }
        fired
    }

    /// Feeds one control signal. Ignored when controls are disabled.
    pub fn control(&mut self, adjustment: Adjustment, input: ControlInput, now_ms: f64) {
        if !self.config.features.controls {
            return;
        }
        match input {
            ControlInput::Press => {
                self.controls
                    .press(adjustment, now_ms, self.config.repeat_cadence_ms);
            }
            ControlInput::Release => self.controls.release(adjustment),
            ControlInput::Click => {
                if self.controls.click() {
                    self.adjust(adjustment);
                }
            }
        }
    }

    /// Applies one adjustment step. Returns whether it changed anything;
    /// only changes are persisted.
    pub fn adjust(&mut self, adjustment: Adjustment) -> bool {
        let changed = match adjustment {
            Adjustment::SpeedUp => self.speed_up(),
            Adjustment::SpeedDown => self.speed_down(),
            Adjustment::ZoomIn => self.zoom_in(),
            Adjustment::ZoomOut => self.zoom_out(),
        };
        if changed {
            tracing::debug!(
                %adjustment,
                interval_ms = self.interval_ms,
                scale_px = self.scale_px,
                "adjusted playback"
            );
            self.persist();
        }
        changed
    }

    fn speed_up(&mut self) -> bool {
        if self.interval_ms <= self.config.min_interval_ms {
            return false;
        }
        let frequency = 1000.0 / self.interval_ms + self.config.speed_step_hz;
        self.set_frequency(frequency);
        true
    }

    fn speed_down(&mut self) -> bool {
        if self.interval_ms >= self.config.max_interval_ms {
            return false;
        }
        let frequency = 1000.0 / self.interval_ms - self.config.speed_step_hz;
        self.set_frequency(frequency);
        true
    }

    fn set_frequency(&mut self, frequency: f64) {
        let interval_ms = if frequency > 0.0 {
            1000.0 / frequency
        } else {
            self.config.max_interval_ms
        };
        self.interval_ms =
            interval_ms.clamp(self.config.min_interval_ms, self.config.max_interval_ms);
    }

    fn zoom_in(&mut self) -> bool {
        self.set_scale(self.scale_px + self.zoom_step_px())
    }

    fn zoom_out(&mut self) -> bool {
        self.set_scale((self.scale_px - self.zoom_step_px()).max(self.min_scale_px()))
    }

    fn min_scale_px(&self) -> f64 {
        self.base_scale_px * self.config.min_scale_fraction
    }

    fn zoom_step_px(&self) -> f64 {
        self.base_scale_px * self.config.zoom_step_fraction
    }

    fn set_scale(&mut self, scale_px: f64) -> bool {
        if scale_px == self.scale_px {
            return false;
        }
        self.scale_px = scale_px;
        self.surface.apply_scale(scale_px);
        true
    }

    fn persist(&self) {
        if let Some(preferences) = &self.preferences {
            preferences.save(StoredPreference {
                interval_ms: self.interval_ms,
                scale_px: self.scale_px,
            });
        }
    }

    fn fire_tick(&mut self, due_ms: f64, now_ms: f64) {
        self.tick = None;
        let code = self.stream[self.index];
        self.surface.apply_state(code);
        tracing::trace!(index = self.index, %code, "tick");
        self.index = self.stream.next_index(self.index);

        if self.is_running() {
            self.tick = Some(Timer::once(due_ms.max(now_ms), self.interval_ms));
        }
    }

    fn fire_repeat(&mut self, due_ms: f64) {
        if let Some(adjustment) = self.controls.poll(due_ms) {
            self.adjust(adjustment);
        }
    }
}
