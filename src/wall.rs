//! Wall contact guard.
//!
//! When an airborne character is pressed against a wall, the contact solver
//! pushes it out of the wall every tick, and part of that push-out shows up as
//! a small upward velocity. Left alone, the character slowly "climbs" the
//! wall. The guard clamps that residual rise and vetoes jumps so coyote
//! refills against a wall cannot be chained into wall-assisted jumps.
//!
//! Wall contact is recomputed from the current contact set every tick.

use bevy::prelude::*;

use crate::collision::ContactData;
use crate::config::LocomotionConfig;

/// Normal of the first wall-like contact, if any.
pub fn detect(contacts: &[ContactData], config: &LocomotionConfig) -> Option<Vec3> {
    contacts
        .iter()
        .find(|c| c.normal.is_finite() && c.is_wall_like(config.wall_normal_max_y))
        .map(|c| c.normal)
}

/// Outcome of the guard for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallGuard {
    /// Jumps are not allowed this tick.
    pub veto_jump: bool,
    /// Replacement vertical velocity, if the residual rise was clamped.
    pub clamped_vertical: Option<f32>,
}

impl WallGuard {
    pub const INACTIVE: Self = Self {
        veto_jump: false,
        clamped_vertical: None,
    };
}

/// Evaluate the guard.
///
/// Only active while airborne and touching a wall. Upward velocities in
/// `(0, wall_residual_rise_limit)` are clamped to zero; anything at or above
/// the limit is a real jump and left alone.
pub fn guard(
    grounded: bool,
    wall_contact: Option<Vec3>,
    vertical_velocity: f32,
    config: &LocomotionConfig,
) -> WallGuard {
    if grounded || wall_contact.is_none() {
        return WallGuard::INACTIVE;
    }

    let residual =
        vertical_velocity > 0.0 && vertical_velocity < config.wall_residual_rise_limit;
    WallGuard {
        veto_jump: true,
        clamped_vertical: residual.then_some(0.0),
    }
}
