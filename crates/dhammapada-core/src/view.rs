use std::time::Duration;

use dhammapada_platform::{
    HostInput, Result, Rgb, ScreenRect, ScreenSaverView, Surface, TextStyle,
};
use tracing::{debug, info};

use crate::engine::{Scene, VerseEngine};
use crate::timer::CycleTimer;

/// Ticks applied per frame at most; a host that stalls for a long time
/// gets one large step instead of a burst.
const MAX_TICKS_PER_FRAME: u32 = 8;

/// The verse screensaver as a host-driven view.
pub struct VerseSaver {
    engine: VerseEngine,
    bounds: ScreenRect,
    timer: Option<CycleTimer>,
    frames: u64,
}

impl VerseSaver {
    pub fn new(engine: VerseEngine) -> Self {
        Self {
            engine,
            bounds: ScreenRect::new(0, 0),
            timer: None,
            frames: 0,
        }
    }

    pub fn engine(&self) -> &VerseEngine {
        &self.engine
    }

    /// Area the saver lays out into, as last given by `start_animation`
    /// or `resize`.
    pub fn bounds(&self) -> ScreenRect {
        self.bounds
    }

    pub fn is_animating(&self) -> bool {
        self.timer.as_ref().is_some_and(CycleTimer::is_active)
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Applies every pending timer tick to the engine. Returns the number
    /// of ticks consumed.
    pub fn apply_pending_ticks(&mut self) -> u32 {
        let Some(timer) = self.timer.as_ref() else {
            return 0;
        };
        let pending = timer.drain();
        if pending == 0 {
            return 0;
        }
        let step = timer.interval().as_secs_f32();
        if pending > MAX_TICKS_PER_FRAME {
            debug!("{pending} ticks pending, collapsing into one step");
            self.engine.tick(step * pending as f32);
        } else {
            for _ in 0..pending {
                self.engine.tick(step);
            }
        }
        pending
    }

    fn draw(&self, scene: &Scene, bounds: ScreenRect, surface: &mut dyn Surface) -> Result<()> {
        let palette = &self.engine.config().palette;
        surface.begin_frame(palette.background)?;

        for p in &scene.particles {
            surface.draw_point(p.x, p.y, palette.particle, p.brightness)?;
        }

        let (_, center_y) = bounds.center();
        // Header, blank line, verse lines.
        let block_height = scene.lines.len() as i32 + if scene.header.is_some() { 2 } else { 0 };
        let mut y = center_y - block_height / 2;

        let text_color = palette.text.blend(Rgb::WHITE, scene.glow * 0.15);
        if let Some(header) = &scene.header {
            let style = TextStyle::new(palette.header, scene.text_alpha * 0.8);
            surface.draw_text(centered_x(bounds, header), y, header, style)?;
            y += 2;
        }
        for line in &scene.lines {
            let style = TextStyle::new(text_color, scene.text_alpha).bold();
            surface.draw_text(centered_x(bounds, line), y, line, style)?;
            y += 1;
        }

        surface.end_frame()
    }
}

fn centered_x(bounds: ScreenRect, text: &str) -> i32 {
    let len = text.chars().count() as i32;
    bounds.x + (bounds.width as i32 - len).max(0) / 2
}

impl ScreenSaverView for VerseSaver {
    fn start_animation(&mut self, bounds: ScreenRect) -> Result<()> {
        if let Some(mut previous) = self.timer.take() {
            previous.cancel();
        }
        self.bounds = bounds;
        let interval = self.animation_interval();
        self.timer = Some(CycleTimer::start(interval)?);
        info!(
            "animation started: {}x{}, {} verses, tick {:?}",
            bounds.width,
            bounds.height,
            self.engine.store().len(),
            interval
        );
        Ok(())
    }

    fn animate_one_frame(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.apply_pending_ticks();
        // Before the first start or resize there is nothing stored yet.
        let bounds = if self.bounds.is_empty() {
            surface.bounds()
        } else {
            self.bounds
        };
        let scene = self.engine.scene(bounds);
        self.draw(&scene, bounds, surface)?;
        self.frames += 1;
        Ok(())
    }

    fn stop_animation(&mut self) -> Result<bool> {
        let released = match self.timer.take() {
            Some(mut timer) => timer.cancel(),
            None => false,
        };
        if released {
            info!("animation stopped after {} frames", self.frames);
        }
        Ok(released)
    }

    fn resize(&mut self, bounds: ScreenRect) -> Result<()> {
        debug!("resized to {}x{}", bounds.width, bounds.height);
        self.bounds = bounds;
        Ok(())
    }

    fn handle_input(&mut self, input: HostInput) -> bool {
        match input {
            HostInput::Advance => {
                self.engine.skip_to_next();
                true
            }
            HostInput::Activity => false,
        }
    }

    fn animation_interval(&self) -> Duration {
        self.engine.config().timing.tick_interval()
    }
}

impl Drop for VerseSaver {
    fn drop(&mut self) {
        let _ = self.stop_animation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SaverConfig;
    use crate::verse::{Verse, VerseStore};
    use crossbeam_channel::RecvTimeoutError;

    fn saver() -> VerseSaver {
        let config = SaverConfig {
            seed: Some(3),
            ..SaverConfig::default()
        };
        let store = VerseStore::new(vec![Verse::new("c", "v", "p")]);
        VerseSaver::new(VerseEngine::new(config, store))
    }

    #[test]
    fn dropping_a_running_saver_joins_its_timer() {
        let mut saver = saver();
        saver.start_animation(ScreenRect::new(40, 12)).unwrap();
        let ticks = saver.timer.as_ref().unwrap().tick_receiver();
        drop(saver);
        assert_eq!(
            ticks.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn restart_releases_previous_timer() {
        let mut saver = saver();
        saver.start_animation(ScreenRect::new(40, 12)).unwrap();
        let first = saver.timer.as_ref().unwrap().tick_receiver();
        saver.start_animation(ScreenRect::new(40, 12)).unwrap();
        assert_eq!(
            first.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Disconnected)
        );
        assert!(saver.is_animating());
    }
}
