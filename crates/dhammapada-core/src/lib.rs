//! Dhammapada screensaver core: runtime-agnostic verse cycling, fades and
//! particles.
//!
//! A host drives [`VerseSaver`] through the
//! [`ScreenSaverView`](dhammapada_platform::ScreenSaverView) lifecycle. The
//! saver owns a [`CycleTimer`] between `start_animation` and
//! `stop_animation`; every tick steps the [`DisplayState`] fade machine and
//! the [`ParticleField`], and each frame is rendered from a [`Scene`].

pub mod config;
pub mod display;
pub mod engine;
mod error;
pub mod particles;
pub mod prepare;
pub mod timer;
pub mod verse;
pub mod view;

pub use config::{Palette, ParticlePreset, SaverConfig, TimingConfig};
pub use display::{DisplayState, StepOutcome, TransitionPhase};
pub use engine::{Scene, ScenePoint, VerseEngine};
pub use error::{Error, Result};
pub use particles::{Particle, ParticleField};
pub use prepare::{parse_text, PreparedText};
pub use timer::CycleTimer;
pub use verse::{Language, Verse, VerseStore};
pub use view::VerseSaver;

/// Loads the verse store named by `config`, or the bundled verses.
pub fn load_store(config: &SaverConfig) -> Result<VerseStore> {
    let store = match &config.verses {
        Some(path) => VerseStore::load(path)?,
        None => VerseStore::bundled(),
    };
    if store.is_empty() {
        tracing::warn!("verse store is empty; only particles will be shown");
    }
    Ok(store)
}
