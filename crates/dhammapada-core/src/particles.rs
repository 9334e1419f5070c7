use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ParticlePreset;

/// A drifting point in normalized screen space, `[0, 1)` on both axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age: f32,
    pub lifetime: f32,
}

impl Particle {
    /// Twinkle in `[0, 1]`: fades in and out over the particle's life and
    /// shimmers with the global animation phase.
    pub fn brightness(&self, phase: f32) -> f32 {
        let life = (self.age / self.lifetime).clamp(0.0, 1.0);
        let envelope = (life * std::f32::consts::PI).sin();
        let offset = (self.pos.x + self.pos.y) * TAU;
        let shimmer = 0.75 + 0.25 * (phase * TAU * 3.0 + offset).sin();
        (envelope * shimmer).clamp(0.0, 1.0)
    }
}

pub struct ParticleField {
    preset: ParticlePreset,
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(preset: ParticlePreset, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut field = Self {
            particles: Vec::with_capacity(preset.count),
            preset,
            rng,
        };
        for _ in 0..field.preset.count {
            let mut particle = field.spawn();
            // Stagger ages so the field does not pulse in unison.
            if particle.lifetime > 0.0 {
                particle.age = field.rng.random_range(0.0..particle.lifetime);
            }
            field.particles.push(particle);
        }
        field
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Moves every particle by `dt` seconds. `phase` is the display's
    /// animation phase in `[0, 1)` and drives a slow sideways sway.
    pub fn update(&mut self, dt: f32, phase: f32) {
        let dt = sanitize_step(dt);
        let phase = if phase.is_finite() { phase } else { 0.0 };
        let drift = self.preset.drift;
        for i in 0..self.particles.len() {
            let p = self.particles[i];
            let sway = Vec2::new(
                (phase * TAU + p.pos.y * TAU).sin(),
                (phase * TAU + p.pos.x * TAU).cos() * 0.5,
            ) * drift;
            let mut next = p;
            next.pos = wrap_unit(p.pos + (p.vel + sway) * dt);
            next.age += dt;
            if next.age >= next.lifetime {
                next = self.spawn();
            }
            self.particles[i] = next;
        }
    }

    /// Random impulse on every velocity, capped at `max_speed`.
    pub fn perturb(&mut self, strength: f32) {
        let max_speed = self.preset.max_speed;
        for i in 0..self.particles.len() {
            let kick = self.random_velocity(strength);
            let p = &mut self.particles[i];
            p.vel = (p.vel + kick).clamp_length_max(max_speed);
        }
    }

    fn spawn(&mut self) -> Particle {
        let [min, max] = self.preset.lifetime;
        let lifetime = if max > min {
            self.rng.random_range(min..max)
        } else {
            min
        };
        Particle {
            pos: Vec2::new(self.rng.random::<f32>(), self.rng.random::<f32>()),
            vel: self.random_velocity(self.preset.speed),
            age: 0.0,
            lifetime,
        }
    }

    fn random_velocity(&mut self, bound: f32) -> Vec2 {
        if bound <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.rng.random_range(-bound..=bound),
            self.rng.random_range(-bound..=bound),
        )
    }
}

/// Non-finite or negative steps become zero.
pub(crate) fn sanitize_step(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(0.0)
    } else {
        0.0
    }
}

fn wrap_unit(v: Vec2) -> Vec2 {
    Vec2::new(wrap01(v.x), wrap01(v.y))
}

fn wrap01(x: f32) -> f32 {
    let w = x.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}
