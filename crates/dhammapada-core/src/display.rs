use crate::config::TimingConfig;
use crate::particles::sanitize_step;

/// Shortest fade we will animate; keeps the phase loop finite when a
/// caller builds a `TimingConfig` by hand.
const MIN_FADE_SECONDS: f32 = 1e-3;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransitionPhase {
    FadingIn,  // Verse text is appearing
    Holding,   // Fully visible
    FadingOut, // Disappearing; the index advances when alpha reaches 0
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StepOutcome {
    /// Nothing to show.
    Idle,
    Animating,
    VerseChanged { from: usize, to: usize },
}

#[derive(Debug, Clone)]
pub struct DisplayState {
    current_verse_index: usize,
    fade_alpha: f32,
    animation_phase: f32,
    phase: TransitionPhase,
    phase_elapsed: f32,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            current_verse_index: 0,
            fade_alpha: 0.0,
            animation_phase: 0.0,
            phase: TransitionPhase::FadingIn,
            phase_elapsed: 0.0,
        }
    }
}

impl DisplayState {
    pub fn starting_at(index: usize, verse_count: usize) -> Self {
        let mut state = Self::default();
        if verse_count > 0 {
            state.current_verse_index = index % verse_count;
        }
        state
    }

    pub fn current_verse_index(&self) -> usize {
        self.current_verse_index
    }

    /// Text opacity, always within `[0, 1]`.
    pub fn fade_alpha(&self) -> f32 {
        self.fade_alpha
    }

    /// Ambient cycle position in `[0, 1)`.
    pub fn animation_phase(&self) -> f32 {
        self.animation_phase
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Steps the fade state machine by `dt` seconds. Steps longer than a
    /// phase carry over into the following phases.
    pub fn advance(&mut self, dt: f32, timing: &TimingConfig, verse_count: usize) -> StepOutcome {
        let dt = sanitize_step(dt);
        if timing.cycle_seconds > 0.0 {
            self.animation_phase = (self.animation_phase + dt / timing.cycle_seconds).fract();
        }

        if verse_count == 0 {
            self.reset_fade();
            self.current_verse_index = 0;
            return StepOutcome::Idle;
        }
        self.current_verse_index %= verse_count;

        let from = self.current_verse_index;
        let durations = PhaseDurations::from(timing);
        let mut remaining = dt;
        let mut advanced = 0usize;

        let whole_cycles = (remaining / durations.total()).floor();
        if whole_cycles >= 1.0 {
            remaining -= whole_cycles * durations.total();
            advanced += (whole_cycles as u64 % verse_count as u64) as usize;
            // A full cycle always passes through at least one verse change.
            if advanced == 0 {
                advanced = verse_count;
            }
        }

        loop {
            let left = durations.of(self.phase) - self.phase_elapsed;
            if remaining < left {
                self.phase_elapsed += remaining;
                break;
            }
            remaining -= left;
            self.phase_elapsed = 0.0;
            self.phase = match self.phase {
                TransitionPhase::FadingIn => TransitionPhase::Holding,
                TransitionPhase::Holding => TransitionPhase::FadingOut,
                TransitionPhase::FadingOut => {
                    advanced += 1;
                    TransitionPhase::FadingIn
                }
            };
        }

        self.fade_alpha = match self.phase {
            TransitionPhase::FadingIn => self.phase_elapsed / durations.fade_in,
            TransitionPhase::Holding => 1.0,
            TransitionPhase::FadingOut => 1.0 - self.phase_elapsed / durations.fade_out,
        }
        .clamp(0.0, 1.0);

        if advanced == 0 {
            return StepOutcome::Animating;
        }
        self.current_verse_index = (from + advanced % verse_count) % verse_count;
        StepOutcome::VerseChanged {
            from,
            to: self.current_verse_index,
        }
    }

    /// Cuts straight to the following verse, which then fades in.
    pub fn skip_to_next(&mut self, verse_count: usize) -> StepOutcome {
        if verse_count == 0 {
            return StepOutcome::Idle;
        }
        let from = self.current_verse_index % verse_count;
        self.jump_to(from + 1, verse_count);
        StepOutcome::VerseChanged {
            from,
            to: self.current_verse_index,
        }
    }

    /// Index wraps modulo `verse_count`.
    pub fn jump_to(&mut self, index: usize, verse_count: usize) {
        if verse_count == 0 {
            return;
        }
        self.current_verse_index = index % verse_count;
        self.reset_fade();
    }

    fn reset_fade(&mut self) {
        self.phase = TransitionPhase::FadingIn;
        self.phase_elapsed = 0.0;
        self.fade_alpha = 0.0;
    }
}

struct PhaseDurations {
    fade_in: f32,
    hold: f32,
    fade_out: f32,
}

impl PhaseDurations {
    fn of(&self, phase: TransitionPhase) -> f32 {
        match phase {
            TransitionPhase::FadingIn => self.fade_in,
            TransitionPhase::Holding => self.hold,
            TransitionPhase::FadingOut => self.fade_out,
        }
    }

    fn total(&self) -> f32 {
        self.fade_in + self.hold + self.fade_out
    }
}

impl From<&TimingConfig> for PhaseDurations {
    fn from(t: &TimingConfig) -> Self {
        Self {
            fade_in: t.fade_in_seconds.max(MIN_FADE_SECONDS),
            hold: t.hold_seconds.max(0.0),
            fade_out: t.fade_out_seconds.max(MIN_FADE_SECONDS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn timing() -> TimingConfig {
        TimingConfig {
            tick_hz: 10.0,
            fade_in_seconds: 1.0,
            hold_seconds: 2.0,
            fade_out_seconds: 1.0,
            cycle_seconds: 4.0,
        }
    }

    #[test]
    fn fades_in_holds_and_fades_out() {
        let t = timing();
        let mut s = DisplayState::default();

        assert_eq!(s.advance(0.5, &t, 3), StepOutcome::Animating);
        assert_eq!(s.phase(), TransitionPhase::FadingIn);
        assert_relative_eq!(s.fade_alpha(), 0.5);

        s.advance(0.5, &t, 3);
        assert_eq!(s.phase(), TransitionPhase::Holding);
        assert_relative_eq!(s.fade_alpha(), 1.0);

        s.advance(2.25, &t, 3);
        assert_eq!(s.phase(), TransitionPhase::FadingOut);
        assert_relative_eq!(s.fade_alpha(), 0.75);
        assert_eq!(s.current_verse_index(), 0);

        assert_eq!(
            s.advance(0.75, &t, 3),
            StepOutcome::VerseChanged { from: 0, to: 1 }
        );
        assert_eq!(s.phase(), TransitionPhase::FadingIn);
        assert_relative_eq!(s.fade_alpha(), 0.0);
    }

    #[test]
    fn wraps_past_last_verse() {
        let t = timing();
        let mut s = DisplayState::starting_at(2, 3);
        assert_eq!(
            s.advance(4.0, &t, 3),
            StepOutcome::VerseChanged { from: 2, to: 0 }
        );
        assert_eq!(s.current_verse_index(), 0);
    }

    #[test]
    fn long_steps_skip_several_verses() {
        let t = timing();
        let mut s = DisplayState::default();
        // Two and a half cycles.
        let outcome = s.advance(10.0, &t, 5);
        assert_eq!(outcome, StepOutcome::VerseChanged { from: 0, to: 2 });
        assert_eq!(s.phase(), TransitionPhase::Holding);
    }

    #[test]
    fn index_and_alpha_stay_in_bounds() {
        let t = timing();
        for count in 1..6 {
            let mut s = DisplayState::default();
            for step in 0..400 {
                let dt = [0.033, 0.2, 1.7, 0.0, 5.3][step % 5];
                s.advance(dt, &t, count);
                assert!(s.current_verse_index() < count);
                assert!((0.0..=1.0).contains(&s.fade_alpha()));
                assert!((0.0..1.0).contains(&s.animation_phase()));
            }
        }
    }

    #[test]
    fn empty_store_holds_blank() {
        let t = timing();
        let mut s = DisplayState::default();
        for _ in 0..10 {
            assert_eq!(s.advance(1.3, &t, 0), StepOutcome::Idle);
            assert_eq!(s.current_verse_index(), 0);
            assert_eq!(s.fade_alpha(), 0.0);
        }
        assert_eq!(s.skip_to_next(0), StepOutcome::Idle);
    }

    #[test]
    fn skip_and_jump_wrap() {
        let mut s = DisplayState::default();
        s.advance(1.5, &timing(), 2);
        assert_eq!(s.skip_to_next(2), StepOutcome::VerseChanged { from: 0, to: 1 });
        assert_eq!(s.fade_alpha(), 0.0);
        assert_eq!(s.skip_to_next(2), StepOutcome::VerseChanged { from: 1, to: 0 });
        s.jump_to(7, 3);
        assert_eq!(s.current_verse_index(), 1);
    }

    #[test]
    fn bad_dt_is_ignored() {
        let mut s = DisplayState::default();
        s.advance(f32::NAN, &timing(), 2);
        s.advance(-3.0, &timing(), 2);
        assert_eq!(s.fade_alpha(), 0.0);
        assert_eq!(s.current_verse_index(), 0);
    }
}
