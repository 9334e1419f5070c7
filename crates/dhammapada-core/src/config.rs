use std::path::{Path, PathBuf};
use std::time::Duration;

use dhammapada_platform::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::verse::Language;

/// Accepted cycle timer frequencies, in Hz.
pub const TICK_HZ_RANGE: std::ops::RangeInclusive<f32> = 0.1..=1000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Cycle timer frequency.
    pub tick_hz: f32,
    pub fade_in_seconds: f32,
    pub hold_seconds: f32,
    pub fade_out_seconds: f32,
    /// Period of the ambient animation phase (glow and particle drift).
    pub cycle_seconds: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_hz: 30.0,
            fade_in_seconds: 2.0,
            hold_seconds: 12.0,
            fade_out_seconds: 2.0,
            cycle_seconds: 8.0,
        }
    }
}

impl TimingConfig {
    /// Never panics: rates outside [`TICK_HZ_RANGE`] are clamped into it.
    pub fn tick_interval(&self) -> Duration {
        let (min, max) = (*TICK_HZ_RANGE.start(), *TICK_HZ_RANGE.end());
        let hz = if self.tick_hz.is_nan() {
            TimingConfig::default().tick_hz
        } else {
            self.tick_hz.clamp(min, max)
        };
        Duration::try_from_secs_f64(1.0 / hz as f64)
            .unwrap_or_else(|_| Duration::from_secs_f64(1.0 / min as f64))
    }

    /// Seconds one verse occupies the screen, fades included.
    pub fn verse_seconds(&self) -> f32 {
        self.fade_in_seconds + self.hold_seconds + self.fade_out_seconds
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlePreset {
    pub count: usize,
    /// Initial speed bound, in screen fractions per second.
    pub speed: f32,
    pub max_speed: f32,
    /// Amplitude of the phase-driven sway.
    pub drift: f32,
    /// Lifetime range in seconds `[min, max]`.
    pub lifetime: [f32; 2],
    /// Impulse applied to every particle when the verse changes.
    pub perturb_strength: f32,
}

impl Default for ParticlePreset {
    fn default() -> Self {
        Self {
            count: 120,
            speed: 0.02,
            max_speed: 0.06,
            drift: 0.01,
            lifetime: [6.0, 18.0],
            perturb_strength: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Rgb,
    pub text: Rgb,
    pub header: Rgb,
    pub particle: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb(8, 6, 20),
            text: Rgb(245, 222, 160),
            header: Rgb(190, 150, 90),
            particle: Rgb(255, 236, 190),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaverConfig {
    pub language: Language,
    /// Verse database; the bundled verses are used when absent.
    pub verses: Option<PathBuf>,
    pub random_start: bool,
    pub seed: Option<u64>,
    pub timing: TimingConfig,
    pub particles: ParticlePreset,
    pub palette: Palette,
}

impl Default for SaverConfig {
    fn default() -> Self {
        Self {
            language: Language::Pali,
            verses: None,
            random_start: false,
            seed: None,
            timing: TimingConfig::default(),
            particles: ParticlePreset::default(),
            palette: Palette::default(),
        }
    }
}

impl SaverConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SaverConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::from_toml_str(&text)?;
        // Relative verse paths are resolved against the config file.
        if let (Some(verses), Some(dir)) = (config.verses.as_ref(), path.parent()) {
            if verses.is_relative() {
                config.verses = Some(dir.join(verses));
            }
        }
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if !TICK_HZ_RANGE.contains(&t.tick_hz) {
            return Err(invalid(format!(
                "timing.tick_hz must be within {}..={} Hz, got {}",
                TICK_HZ_RANGE.start(),
                TICK_HZ_RANGE.end(),
                t.tick_hz
            )));
        }
        for (name, value) in [
            ("timing.fade_in_seconds", t.fade_in_seconds),
            ("timing.fade_out_seconds", t.fade_out_seconds),
            ("timing.cycle_seconds", t.cycle_seconds),
        ] {
            if !(value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(t.hold_seconds >= 0.0) {
            return Err(invalid(format!(
                "timing.hold_seconds must not be negative, got {}",
                t.hold_seconds
            )));
        }

        let p = &self.particles;
        if p.speed < 0.0 || p.max_speed < 0.0 || p.drift < 0.0 || p.perturb_strength < 0.0 {
            return Err(invalid("particle speeds must not be negative".into()));
        }
        let [min, max] = p.lifetime;
        if !(min > 0.0) || min > max {
            return Err(invalid(format!(
                "particles.lifetime must be a positive [min, max] range, got [{min}, {max}]"
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig(message)
}
