use std::f32::consts::TAU;

use dhammapada_platform::ScreenRect;
use glam::Vec2;
use rand::Rng;
use tracing::info;

use crate::config::SaverConfig;
use crate::display::{DisplayState, StepOutcome};
use crate::particles::{sanitize_step, ParticleField};
use crate::verse::{Verse, VerseStore};

/// Host-independent description of one frame, in the host's units.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub header: Option<String>,
    pub lines: Vec<String>,
    pub text_alpha: f32,
    /// Slow breathing in `[0, 1]` derived from the animation phase.
    pub glow: f32,
    pub particles: Vec<ScenePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenePoint {
    pub x: i32,
    pub y: i32,
    pub brightness: f32,
}

pub struct VerseEngine {
    config: SaverConfig,
    store: VerseStore,
    display: DisplayState,
    particles: ParticleField,
}

impl VerseEngine {
    pub fn new(config: SaverConfig, store: VerseStore) -> Self {
        let start = if config.random_start && !store.is_empty() {
            rand::rng().random_range(0..store.len())
        } else {
            0
        };
        let particles = ParticleField::new(config.particles.clone(), config.seed);
        Self {
            display: DisplayState::starting_at(start, store.len()),
            config,
            store,
            particles,
        }
    }

    pub fn config(&self) -> &SaverConfig {
        &self.config
    }

    pub fn store(&self) -> &VerseStore {
        &self.store
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn current_verse(&self) -> Option<&Verse> {
        self.store.get(self.display.current_verse_index())
    }

    pub fn tick(&mut self, dt: f32) -> StepOutcome {
        let dt = sanitize_step(dt);
        let outcome = self
            .display
            .advance(dt, &self.config.timing, self.store.len());
        self.particles.update(dt, self.display.animation_phase());
        self.on_outcome(outcome);
        outcome
    }

    pub fn skip_to_next(&mut self) -> StepOutcome {
        let outcome = self.display.skip_to_next(self.store.len());
        self.on_outcome(outcome);
        outcome
    }

    fn on_outcome(&mut self, outcome: StepOutcome) {
        if let StepOutcome::VerseChanged { to, .. } = outcome {
            self.particles.perturb(self.config.particles.perturb_strength);
            if let Some(verse) = self.store.get(to) {
                info!("showing {}", verse.heading());
            }
        }
    }

    pub fn scene(&self, bounds: ScreenRect) -> Scene {
        let phase = self.display.animation_phase();
        let glow = 0.5 + 0.5 * (phase * TAU).sin();

        let (header, lines) = match self.current_verse() {
            Some(verse) => {
                // Leave a margin of a tenth of the width on each side.
                let width = (bounds.width as usize * 4 / 5).max(1);
                let lines = verse
                    .text(self.config.language)
                    .lines()
                    .flat_map(|line| wrap_words(line.trim(), width))
                    .collect();
                (Some(verse.heading()), lines)
            }
            None => (None, Vec::new()),
        };

        let size = Vec2::new(bounds.width as f32, bounds.height as f32);
        let particles = self
            .particles
            .particles()
            .iter()
            .map(|p| {
                let at = p.pos * size;
                ScenePoint {
                    x: bounds.x + at.x as i32,
                    y: bounds.y + at.y as i32,
                    brightness: p.brightness(phase),
                }
            })
            .collect();

        Scene {
            header,
            lines,
            text_alpha: self.display.fade_alpha(),
            glow,
            particles,
        }
    }
}

/// Greedy word wrap by character count. Words longer than `width` are
/// split.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        if current_len > 0 && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += word_len;
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticlePreset;
    use crate::verse::{Language, Verse};

    fn engine(verses: Vec<Verse>) -> VerseEngine {
        let config = SaverConfig {
            seed: Some(11),
            particles: ParticlePreset {
                count: 16,
                ..ParticlePreset::default()
            },
            ..SaverConfig::default()
        };
        VerseEngine::new(config, VerseStore::new(verses))
    }

    #[test]
    fn wrap_words_respects_width() {
        assert_eq!(wrap_words("a bb ccc dddd", 6), ["a bb", "ccc", "dddd"]);
        assert_eq!(wrap_words("abcdefgh", 3), ["abc", "def", "gh"]);
        assert_eq!(wrap_words("", 10), [""]);
        assert_eq!(wrap_words("saṃ saṃ", 3), ["saṃ", "saṃ"]);
    }

    #[test]
    fn scene_for_empty_store_is_blank() {
        let e = engine(Vec::new());
        let scene = e.scene(ScreenRect::new(80, 24));
        assert!(scene.header.is_none());
        assert!(scene.lines.is_empty());
        assert_eq!(scene.text_alpha, 0.0);
        assert_eq!(scene.particles.len(), 16);
    }

    #[test]
    fn scene_shows_current_verse_in_language() {
        let mut verse = Verse::new("Chapter 1: Yamakavaggo", "Verse 1", "first\nsecond");
        verse.entrans = Some("english".into());
        let mut e = engine(vec![verse]);
        e.tick(1.0);

        let scene = e.scene(ScreenRect::new(80, 24));
        assert_eq!(scene.header.as_deref(), Some("Chapter 1: Yamakavaggo \u{b7} Verse 1"));
        assert_eq!(scene.lines, ["first", "second"]);
        assert!(scene.text_alpha > 0.0);

        e.config.language = Language::English;
        assert_eq!(e.scene(ScreenRect::new(80, 24)).lines, ["english"]);
    }

    #[test]
    fn particles_land_inside_bounds() {
        let mut e = engine(vec![Verse::new("c", "v", "p")]);
        let bounds = ScreenRect {
            x: 5,
            y: 3,
            width: 40,
            height: 10,
        };
        for _ in 0..50 {
            e.tick(0.25);
            for p in e.scene(bounds).particles {
                assert!((5..45).contains(&p.x));
                assert!((3..13).contains(&p.y));
            }
        }
    }

    #[test]
    fn bad_tick_does_not_poison_particles() {
        let mut e = engine(vec![Verse::new("c", "v", "p")]);
        e.tick(f32::NAN);
        e.tick(f32::NEG_INFINITY);
        for _ in 0..100 {
            e.tick(0.1);
        }
        let unit = 0.0..1.0;
        for p in e.particles().particles() {
            assert!(unit.contains(&p.pos.x) && unit.contains(&p.pos.y));
            assert!(p.age.is_finite());
        }
        assert!((0.0..=1.0).contains(&e.display().fade_alpha()));
    }

    #[test]
    fn verse_change_advances_current_verse() {
        let mut e = engine(vec![Verse::new("c", "1", "a"), Verse::new("c", "2", "b")]);
        let cycle = e.config().timing.verse_seconds();
        assert_eq!(e.current_verse().unwrap().verse, "1");
        let outcome = e.tick(cycle);
        assert_eq!(outcome, StepOutcome::VerseChanged { from: 0, to: 1 });
        assert_eq!(e.current_verse().unwrap().verse, "2");
        e.skip_to_next();
        assert_eq!(e.current_verse().unwrap().verse, "1");
    }
}
