//! Controller configuration.
//!
//! [`LocomotionConfig`] holds every tuning value the controller uses. It can be
//! built in code with the `with_*` builders, or loaded from RON:
//!
//! ```rust
//! use platformer_locomotion::prelude::*;
//!
//! let config = LocomotionConfig::from_ron("(coyote_time: 0.1, move_speed: 7.5)").unwrap();
//! assert_eq!(config.coyote_time, 0.1);
//! assert_eq!(config.move_speed, 7.5);
//! // Unspecified fields keep their defaults
//! assert_eq!(config.max_jump_time, LocomotionConfig::default().max_jump_time);
//! ```

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ground::ProbeParams;

/// Configuration parameters for the locomotion controller.
///
/// Per-tick values (`ice_max_delta`, `ice_decay`, `air_control`) are defined
/// for one fixed physics step.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct LocomotionConfig {
    // === Body Geometry ===
    /// Distance from the body origin down to the soles of the feet.
    pub foot_offset: f32,
    /// Horizontal radius of the character's collider.
    pub body_radius: f32,
    /// Full height of the character, feet to head.
    pub body_height: f32,

    // === Movement ===
    /// Target horizontal speed with full input (units/second).
    pub move_speed: f32,
    /// Speed multiplier while sprinting.
    pub sprint_multiplier: f32,
    /// Hard cap on horizontal speed written to the body.
    pub max_horizontal_speed: f32,
    /// Fraction of the gap to the target velocity closed per tick while airborne (0.0-1.0).
    pub air_control: f32,
    /// Horizontal speed above which the character counts as running.
    pub run_speed_threshold: f32,

    // === Ice ===
    /// Largest horizontal velocity change per tick on ice.
    pub ice_max_delta: f32,
    /// Horizontal velocity multiplier per tick on ice with no input (0.0-1.0).
    pub ice_decay: f32,
    /// Downhill acceleration on ice slopes per radian of tilt (units/second^2).
    pub ice_slope_acceleration: f32,
    /// How long ice movement stays active after leaving ice (seconds).
    pub ice_grace_time: f32,

    // === Jump ===
    /// Vertical velocity set when a jump starts.
    pub min_jump_force: f32,
    /// Upward acceleration while the jump input is held (units/second^2).
    pub jump_hold_force: f32,
    /// Longest time the hold force is applied (seconds).
    pub max_jump_time: f32,
    /// Grace period after leaving ground during which a jump is still honored (seconds).
    pub coyote_time: f32,
    /// Vertical velocity at or below which a grounded character counts as landed.
    pub landing_velocity_threshold: f32,

    // === Ground Probe ===
    /// Minimum Y component of a contact normal for it to count as floor.
    pub ground_normal_min_y: f32,
    /// How far above the feet a contact point may lie and still count as floor.
    pub foot_contact_margin: f32,
    /// Height above the feet the fallback ray starts at.
    pub ground_ray_start_offset: f32,
    /// Distance below the feet the fallback ray reaches.
    pub ground_ray_length: f32,
    /// Ray hits up to this far above the feet are accepted.
    pub ground_accept_above: f32,
    /// Ray hits up to this far below the feet are accepted.
    pub ground_accept_below: f32,
    /// Upward speed above which ray hits are ignored (edge climb guard).
    pub max_grounded_rise_speed: f32,
    /// Steepest slope a jump can start from (radians).
    pub max_jumpable_slope: f32,

    // === Wall Guard ===
    /// Contacts whose normal has |Y| below this count as walls.
    pub wall_normal_max_y: f32,
    /// Upward speeds below this are treated as solver push-out against walls.
    pub wall_residual_rise_limit: f32,
    /// Extra reach of the airborne wall-slide rays beyond the body radius.
    pub wall_probe_margin: f32,

    // === Stuck Recovery ===
    /// Time pinned in the air before the body is nudged (seconds).
    pub stuck_duration: f32,
    /// Per-tick displacement below which the character counts as not moving.
    pub stuck_position_epsilon: f32,
    /// Vertical speed below which the character counts as not moving.
    pub stuck_velocity_epsilon: f32,
    /// Downward speed of the recovery kick.
    pub stuck_kick_down: f32,
    /// Horizontal speed of the recovery kick.
    pub stuck_kick_out: f32,

    // === Lifecycle ===
    /// Falling below this height kills the character.
    pub kill_plane_y: f32,
    /// How long an external launch overrides movement (seconds).
    pub launch_lock_time: f32,
    /// Longest timestep accepted by `update`. Larger steps are clamped.
    pub max_dt: f32,
    /// Seed for the stuck recovery direction when the character has no velocity.
    pub rng_seed: u64,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            // Body geometry (capsule, 1.8 tall)
            foot_offset: 0.9,
            body_radius: 0.4,
            body_height: 1.8,

            // Movement
            move_speed: 6.0,
            sprint_multiplier: 1.6,
            max_horizontal_speed: 30.0,
            air_control: 0.12,
            run_speed_threshold: 0.5,

            // Ice
            ice_max_delta: 0.25,
            ice_decay: 0.98,
            ice_slope_acceleration: 20.0,
            ice_grace_time: 0.12,

            // Jump
            min_jump_force: 8.0,
            jump_hold_force: 30.0,
            max_jump_time: 0.25,
            coyote_time: 0.12,
            landing_velocity_threshold: 0.5,

            // Ground probe
            ground_normal_min_y: 0.6, // ~53 degrees
            foot_contact_margin: 0.15,
            ground_ray_start_offset: 0.1,
            ground_ray_length: 0.5,
            ground_accept_above: 0.1,
            ground_accept_below: 0.2,
            max_grounded_rise_speed: 1.5,
            max_jumpable_slope: 0.87, // ~50 degrees

            // Wall guard
            wall_normal_max_y: 0.3,
            wall_residual_rise_limit: 2.5,
            wall_probe_margin: 0.15,

            // Stuck recovery
            stuck_duration: 0.15,
            stuck_position_epsilon: 0.005,
            stuck_velocity_epsilon: 0.2,
            stuck_kick_down: 3.0,
            stuck_kick_out: 2.0,

            // Lifecycle
            kill_plane_y: -30.0,
            launch_lock_time: 1.0,
            max_dt: 0.1,
            rng_seed: 0x1ce_51de,
        }
    }
}

impl LocomotionConfig {
    /// Create a config optimized for responsive player control.
    pub fn player() -> Self {
        Self {
            air_control: 0.15,
            jump_hold_force: 35.0,
            ..default()
        }
    }

    /// Create a config for AI-controlled characters.
    pub fn ai() -> Self {
        Self {
            move_speed: 4.5,
            air_control: 0.08,
            sprint_multiplier: 1.0,
            ..default()
        }
    }

    /// Parse a config from RON text and validate it.
    ///
    /// Missing fields fall back to [`LocomotionConfig::default`].
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable by the controller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("foot_offset", self.foot_offset),
            ("body_radius", self.body_radius),
            ("body_height", self.body_height),
            ("move_speed", self.move_speed),
            ("sprint_multiplier", self.sprint_multiplier),
            ("max_horizontal_speed", self.max_horizontal_speed),
            ("ice_max_delta", self.ice_max_delta),
            ("min_jump_force", self.min_jump_force),
            ("max_jump_time", self.max_jump_time),
            ("coyote_time", self.coyote_time),
            ("ground_ray_length", self.ground_ray_length),
            ("stuck_duration", self.stuck_duration),
            ("launch_lock_time", self.launch_lock_time),
            ("max_dt", self.max_dt),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        let ranged = [
            ("air_control", self.air_control, 0.0, 1.0),
            ("ice_decay", self.ice_decay, 0.0, 1.0),
            ("ground_normal_min_y", self.ground_normal_min_y, 0.0, 1.0),
            ("wall_normal_max_y", self.wall_normal_max_y, 0.0, 1.0),
            ("max_jumpable_slope", self.max_jumpable_slope, 0.0, FRAC_PI_2),
        ];
        for (field, value, min, max) in ranged {
            if !(value.is_finite() && value >= min && value <= max) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }

        if self.min_jump_force <= self.wall_residual_rise_limit {
            return Err(ConfigError::JumpWithinWallClamp {
                jump: self.min_jump_force,
                limit: self.wall_residual_rise_limit,
            });
        }

        Ok(())
    }

    /// Ground probe parameters derived from this config.
    pub fn probe_params(&self) -> ProbeParams {
        ProbeParams {
            foot_offset: self.foot_offset,
            normal_min_y: self.ground_normal_min_y,
            foot_contact_margin: self.foot_contact_margin,
            ray_start_offset: self.ground_ray_start_offset,
            ray_length: self.ground_ray_length,
            accept_above: self.ground_accept_above,
            accept_below: self.ground_accept_below,
            max_rise_speed: self.max_grounded_rise_speed,
            max_jumpable_slope: self.max_jumpable_slope,
        }
    }

    /// Builder: set movement speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set coyote time.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.coyote_time = time;
        self
    }

    /// Builder: set jump parameters.
    pub fn with_jump(mut self, min_force: f32, hold_force: f32, max_time: f32) -> Self {
        self.min_jump_force = min_force;
        self.jump_hold_force = hold_force;
        self.max_jump_time = max_time;
        self
    }

    /// Builder: set ice response.
    pub fn with_ice(mut self, max_delta: f32, decay: f32) -> Self {
        self.ice_max_delta = max_delta;
        self.ice_decay = decay;
        self
    }

    /// Builder: set air control.
    pub fn with_air_control(mut self, air_control: f32) -> Self {
        self.air_control = air_control;
        self
    }

    /// Builder: set the kill plane height.
    pub fn with_kill_plane(mut self, y: f32) -> Self {
        self.kill_plane_y = y;
        self
    }

    /// Builder: set stuck recovery timing.
    pub fn with_stuck_duration(mut self, duration: f32) -> Self {
        self.stuck_duration = duration;
        self
    }

    /// Builder: set the stuck recovery seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }
}
