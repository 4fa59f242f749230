use crate::{
    controller::PlaybackController, storage::Preferences, surface::Surface, FlickerError,
    PlaybackConfig, Result,
};

/// Outcome of mounting a batch of surfaces.
#[derive(Debug, Default)]
pub struct MountReport {
    /// Controller indices of the surfaces that mounted.
    pub mounted: Vec<usize>,
    /// Position in the batch and reason of every surface that did not.
    pub failed: Vec<(usize, FlickerError)>,
}

/// All flicker surfaces of one page, each with its own controller.
///
/// Controllers never share timers or streams; the only shared piece is the
/// preference store.
#[derive(Debug)]
pub struct FlickerPage<S: Surface> {
    config: PlaybackConfig,
    preferences: Option<Preferences>,
    controllers: Vec<PlaybackController<S>>,
}

impl<S: Surface> FlickerPage<S> {
    pub fn new(config: PlaybackConfig, preferences: Option<Preferences>) -> Self {
        Self {
            config,
            preferences,
            controllers: Vec::new(),
        }
    }

    pub fn mount(&mut self, payload: &str, surface: S, now_ms: f64) -> Result<usize> {
        let controller = PlaybackController::new(
            payload,
            surface,
            self.config.clone(),
            self.preferences.clone(),
            now_ms,
        )?;
        self.controllers.push(controller);
        Ok(self.controllers.len() - 1)
    }

    /// Mounts every surface it can. A surface that fails is logged and
    /// skipped; the others are unaffected.
    pub fn mount_all<P, I>(&mut self, surfaces: I, now_ms: f64) -> MountReport
    where
        P: AsRef<str>,
        I: IntoIterator<Item = (P, S)>,
    {
        let mut report = MountReport::default();
        for (position, (payload, surface)) in surfaces.into_iter().enumerate() {
            match self.mount(payload.as_ref(), surface, now_ms) {
                Ok(index) => report.mounted.push(index),
                Err(err) => {
                    tracing::warn!(position, %err, "surface not mounted");
                    report.failed.push((position, err));
                }
            }
        }
        report
    }

    pub fn controllers(&self) -> &[PlaybackController<S>] {
        &self.controllers
    }

    pub fn controller_mut(&mut self, index: usize) -> Option<&mut PlaybackController<S>> {
        self.controllers.get_mut(index)
    }

    pub fn advance(&mut self, now_ms: f64) -> usize {
        self.controllers
            .iter_mut()
            .map(|controller| controller.advance(now_ms))
            .sum()
    }

    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.controllers
            .iter()
            .filter_map(PlaybackController::next_deadline_ms)
            .min_by(|a, b| a.total_cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controls::Adjustment,
        storage::{shared, MemoryStore},
        surface::MemorySurface,
    };

    #[test]
    fn bad_payload_does_not_block_other_surfaces() {
        let mut page = FlickerPage::new(PlaybackConfig::default(), None);
        let report = page.mount_all(
            [
                ("0a1b", MemorySurface::new(20.0)),
                ("nothex", MemorySurface::new(20.0)),
                ("", MemorySurface::new(20.0)),
            ],
            0.0,
        );

        assert_eq!(report.mounted, vec![0, 1]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 1);
        assert!(report.failed[0].1.is_invalid_payload());

        assert_eq!(page.advance(0.0), 2);
        assert!(page
            .controllers()
            .iter()
            .all(|controller| controller.surface().current().is_some()));
    }

    #[test]
    fn surfaces_run_independently() {
        let mut page = FlickerPage::new(PlaybackConfig::default(), None);
        page.mount("00", MemorySurface::new(20.0), 0.0).unwrap();
        page.mount("ff", MemorySurface::new(20.0), 0.0).unwrap();
        page.advance(0.0);

        let slow = page.controller_mut(1).unwrap();
        slow.adjust(Adjustment::SpeedDown);
        slow.pause();

        page.advance(100.0);
        assert_eq!(page.controllers()[0].surface().history().len(), 2);
        assert_eq!(page.controllers()[1].surface().history().len(), 1);
        assert_eq!(page.next_deadline_ms(), Some(125.0));
    }

    #[test]
    fn controllers_share_the_preference_store() {
        let store = shared(MemoryStore::new());
        let preferences = Preferences::new(store, "flicker", 1024);
        let mut page = FlickerPage::new(PlaybackConfig::default(), Some(preferences));

        page.mount("00", MemorySurface::new(20.0), 0.0).unwrap();
        page.controller_mut(0).unwrap().adjust(Adjustment::ZoomIn);
        page.mount("11", MemorySurface::new(20.0), 0.0).unwrap();

        assert_eq!(page.controllers()[1].scale_px(), 20.5);
    }
}
