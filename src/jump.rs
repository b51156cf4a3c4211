//! Jump state machine: coyote grace, jump start, variable height, landing.
//!
//! All functions here are pure transitions of [`JumpPhase`]. The controller
//! applies the resulting velocity and force commands to the body.

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::ground::GroundQueryResult;
use crate::state::JumpPhase;

/// Advance the grace timers from this tick's ground result.
///
/// * On jumpable ground the coyote timer is refilled.
/// * On ground too steep to jump from it is forced to zero.
/// * In the air it counts down.
/// * Landing (grounded with vertical velocity at or below
///   `landing_velocity_threshold`) clears any jump in progress. Ground
///   reported while a jump is still rising does not count as landing.
pub fn update_grace(
    phase: JumpPhase,
    ground: &GroundQueryResult,
    vertical_velocity: f32,
    config: &LocomotionConfig,
    dt: f32,
) -> JumpPhase {
    if ground.grounded {
        if phase.jump_in_progress() && vertical_velocity > config.landing_velocity_threshold {
            return phase;
        }
        return if ground.can_jump {
            JumpPhase::Grounded
        } else {
            JumpPhase::Airborne
        };
    }

    match phase {
        JumpPhase::Grounded => count_down(config.coyote_time, dt),
        JumpPhase::CoyoteWindow { remaining } => count_down(remaining, dt),
        other => other,
    }
}

fn count_down(remaining: f32, dt: f32) -> JumpPhase {
    let remaining = remaining - dt;
    if remaining > 0.0 {
        JumpPhase::CoyoteWindow { remaining }
    } else {
        JumpPhase::Airborne
    }
}

/// Drop any remaining coyote time. Used by the wall guard.
pub fn veto(phase: JumpPhase) -> JumpPhase {
    match phase {
        JumpPhase::Grounded | JumpPhase::CoyoteWindow { .. } => JumpPhase::Airborne,
        other => other,
    }
}

/// Velocity at the instant a jump starts.
///
/// Vertical velocity is replaced by the jump impulse; horizontal velocity is
/// carried over unchanged.
pub fn start_velocity(velocity: Vec3, config: &LocomotionConfig) -> Vec3 {
    Vec3::new(velocity.x, config.min_jump_force, velocity.z)
}

/// Result of one tick of jump hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldStep {
    pub phase: JumpPhase,
    /// Upward acceleration to apply this tick, if any.
    pub acceleration: Option<f32>,
}

/// Variable jump height: keep pushing up while the button is held, up to
/// `max_jump_time`. Releasing early or running out of time hands the
/// character over to gravity; the jump stays in progress until it lands.
pub fn hold(phase: JumpPhase, held: bool, config: &LocomotionConfig, dt: f32) -> HoldStep {
    match phase {
        JumpPhase::Ascending { elapsed } if held && elapsed < config.max_jump_time => HoldStep {
            phase: JumpPhase::Ascending {
                elapsed: elapsed + dt,
            },
            acceleration: Some(config.jump_hold_force),
        },
        JumpPhase::Ascending { .. } => HoldStep {
            phase: JumpPhase::Falling,
            acceleration: None,
        },
        other => HoldStep {
            phase: other,
            acceleration: None,
        },
    }
}
