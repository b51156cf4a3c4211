//! Stuck recovery.
//!
//! A character wedged in a concave corner or on a micro-ledge can end up
//! airborne with no motion at all while the solver fights itself every tick.
//! After a short time in that condition the body gets kicked down and away.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::LocomotionConfig;

/// Tracks how long the character has been pinned and produces the kick.
#[derive(Debug, Clone)]
pub struct StuckRecovery {
    rng: ChaCha8Rng,
}

impl StuckRecovery {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Advance the stuck timer and return the kick velocity when it fires.
    ///
    /// `displacement` is the movement since the previous tick and
    /// `vertical_velocity` the measured vertical speed. `heading` is the
    /// velocity the character is trying to move with; the kick pushes away
    /// from it. Grounded characters are never considered stuck.
    #[allow(clippy::too_many_arguments)]
    pub fn check(
        &mut self,
        timer: &mut f32,
        grounded: bool,
        displacement: Vec3,
        vertical_velocity: f32,
        heading: Vec3,
        config: &LocomotionConfig,
        dt: f32,
    ) -> Option<Vec3> {
        if grounded || !is_pinned(displacement, vertical_velocity, config) {
            *timer = 0.0;
            return None;
        }

        *timer += dt;
        if *timer < config.stuck_duration {
            return None;
        }

        *timer = 0.0;
        Some(self.kick(heading, config))
    }

    /// Downward kick plus a horizontal push away from the current motion.
    fn kick(&mut self, heading: Vec3, config: &LocomotionConfig) -> Vec3 {
        let horizontal = Vec3::new(heading.x, 0.0, heading.z);
        let away = if horizontal.length_squared() > 1e-8 {
            -horizontal.normalize()
        } else {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            Vec3::new(angle.cos(), 0.0, angle.sin())
        };
        away * config.stuck_kick_out - Vec3::Y * config.stuck_kick_down
    }
}

fn is_pinned(displacement: Vec3, vertical_velocity: f32, config: &LocomotionConfig) -> bool {
    let horizontal = Vec2::new(displacement.x, displacement.z).length();
    horizontal < config.stuck_position_epsilon
        && displacement.y.abs() < config.stuck_position_epsilon
        && vertical_velocity.abs() < config.stuck_velocity_epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn fires_after_duration_when_pinned() {
        let config = LocomotionConfig::default();
        let mut recovery = StuckRecovery::new(1);
        let mut timer = 0.0;

        let mut fired_at = None;
        for tick in 1..=30 {
            if let Some(kick) =
                recovery.check(&mut timer, false, Vec3::ZERO, 0.0, Vec3::ZERO, &config, DT)
            {
                fired_at = Some(tick);
                assert!(kick.y < 0.0);
                let horizontal = Vec2::new(kick.x, kick.z).length();
                assert!((horizontal - config.stuck_kick_out).abs() < 1e-4);
                break;
            }
        }
        let fired_at = fired_at.expect("recovery should fire");
        assert!(fired_at as f32 * DT >= config.stuck_duration - 1e-4);
        assert_eq!(timer, 0.0);
    }

    #[test]
    fn never_fires_when_grounded() {
        let config = LocomotionConfig::default();
        let mut recovery = StuckRecovery::new(1);
        let mut timer = 0.0;
        for _ in 0..120 {
            assert!(recovery
                .check(&mut timer, true, Vec3::ZERO, 0.0, Vec3::ZERO, &config, DT)
                .is_none());
        }
        assert_eq!(timer, 0.0);
    }

    #[test]
    fn movement_resets_timer() {
        let config = LocomotionConfig::default();
        let mut recovery = StuckRecovery::new(1);
        let mut timer = 0.0;
        for _ in 0..5 {
            recovery.check(&mut timer, false, Vec3::ZERO, 0.0, Vec3::ZERO, &config, DT);
        }
        assert!(timer > 0.0);
        recovery.check(
            &mut timer,
            false,
            Vec3::new(0.0, -0.2, 0.0),
            0.0,
            Vec3::ZERO,
            &config,
            DT,
        );
        assert_eq!(timer, 0.0);
    }

    #[test]
    fn kick_points_away_from_motion() {
        let config = LocomotionConfig::default();
        let mut recovery = StuckRecovery::new(1);
        let kick = recovery.kick(Vec3::new(0.05, 0.0, 0.0), &config);
        assert!(kick.x < 0.0);
        assert!(kick.z.abs() < 1e-6);
    }

    #[test]
    fn random_direction_is_seeded() {
        let config = LocomotionConfig::default();
        let a = StuckRecovery::new(9).kick(Vec3::ZERO, &config);
        let b = StuckRecovery::new(9).kick(Vec3::ZERO, &config);
        assert_eq!(a, b);
    }
}
