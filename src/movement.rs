//! Movement integrator.
//!
//! Converts input and the ground classification into the horizontal velocity
//! written to the body each tick. The vertical component belongs to gravity and
//! the jump controller; nothing here touches it.
//!
//! | Mode | Behaviour |
//! | --- | --- |
//! | Ground | velocity set directly to the target (instant start/stop) |
//! | Ice | velocity rate-limited toward the target, coasting decay without input |
//! | Ice slope | ice, plus a constant downhill pull |
//! | Air | smoothed steering, into-wall component removed |
//!
//! Riders of moving platforms use the platform's horizontal velocity as the
//! baseline for every grounded mode.

use bevy::prelude::*;

use crate::backend::PhysicsWorld;
use crate::config::LocomotionConfig;
use crate::ground::GroundQueryResult;
use crate::state::IceMemory;
use crate::surface::SurfaceKind;

/// How horizontal velocity is integrated this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementMode {
    Ground { platform: Vec3 },
    Ice {
        surface: SurfaceKind,
        platform: Vec3,
        grounded: bool,
    },
    Air,
}

/// Pick the movement mode.
///
/// Ice grace keeps ice semantics for a short time after leaving ice, both in
/// the air and when stepping onto normal ground.
pub fn select_mode(ground: &GroundQueryResult, ice_grace: Option<IceMemory>) -> MovementMode {
    let platform = ground.ground_body_velocity;
    if ground.grounded && ground.surface.is_ice() {
        return MovementMode::Ice {
            surface: ground.surface,
            platform,
            grounded: true,
        };
    }

    if let Some(memory) = ice_grace.filter(|m| m.remaining > 0.0) {
        return MovementMode::Ice {
            surface: memory.surface,
            platform,
            grounded: false,
        };
    }

    if ground.grounded {
        MovementMode::Ground { platform }
    } else {
        MovementMode::Air
    }
}

/// Rotate the local input axis by the camera yaw.
///
/// `move_axis.x` strafes right, `move_axis.y` moves forward (-Z at zero yaw).
/// The result is horizontal with length at most 1.
pub fn world_direction(move_axis: Vec2, camera_yaw: f32) -> Vec3 {
    if !move_axis.is_finite() || !camera_yaw.is_finite() {
        return Vec3::ZERO;
    }
    let axis = move_axis.clamp_length_max(1.0);
    Quat::from_rotation_y(camera_yaw) * Vec3::new(axis.x, 0.0, -axis.y)
}

/// Yaw-only orientation facing `direction`, or `None` without input.
pub fn facing(direction: Vec3) -> Option<Quat> {
    let flat = Vec2::new(direction.x, direction.z);
    if flat.length_squared() < 1e-8 {
        return None;
    }
    Some(Quat::from_rotation_y(f32::atan2(-flat.x, -flat.y)))
}

/// Normal ground: instant response.
///
/// Without input the character stops dead relative to the ground, except on
/// the tick a jump starts, where the current velocity is kept so the jump
/// carries it.
pub fn ground_velocity(
    current: Vec3,
    target: Vec3,
    platform: Vec3,
    has_input: bool,
    jump_starting: bool,
) -> Vec3 {
    if has_input {
        platform + target
    } else if jump_starting {
        horizontal(current)
    } else {
        platform
    }
}

/// Ice: velocity relative to the ground moves toward the target by at most
/// `ice_max_delta` per tick. Without input it decays by `ice_decay` per tick,
/// the decrease itself capped by `ice_max_delta`.
///
/// `slide` is the ice slope's downhill vector (zero elsewhere), applied even
/// with no input.
pub fn ice_velocity(
    current: Vec3,
    target: Vec3,
    platform: Vec3,
    slide: Vec3,
    has_input: bool,
    config: &LocomotionConfig,
    dt: f32,
) -> Vec3 {
    let relative = horizontal(current) - platform;

    let relative = if has_input {
        relative + (target - relative).clamp_length_max(config.ice_max_delta)
    } else {
        let speed = relative.length();
        let decrease = (speed * (1.0 - config.ice_decay)).min(config.ice_max_delta);
        relative.normalize_or_zero() * (speed - decrease)
    };

    platform + relative + slide * config.ice_slope_acceleration * dt
}

/// Air: close `air_control` of the gap to the target each tick.
pub fn air_velocity(current: Vec3, target: Vec3, config: &LocomotionConfig) -> Vec3 {
    horizontal(current).lerp(target, config.air_control)
}

/// Remove the component of `velocity` that drives into any of `wall_normals`,
/// keeping the tangential part.
pub fn slide_along_walls(velocity: Vec3, wall_normals: &[Vec3]) -> Vec3 {
    let mut velocity = velocity;
    for normal in wall_normals {
        let n = horizontal(*normal).normalize_or_zero();
        let into = velocity.dot(n);
        if into < 0.0 {
            velocity -= n * into;
        }
    }
    velocity
}

/// Short horizontal rays at foot, mid and head height in the direction of
/// travel. Returns the normals of wall-like hits.
pub fn probe_walls<W: PhysicsWorld + ?Sized>(
    world: &W,
    body: Entity,
    position: Vec3,
    velocity: Vec3,
    config: &LocomotionConfig,
) -> Vec<Vec3> {
    let direction = horizontal(velocity).normalize_or_zero();
    if direction == Vec3::ZERO {
        return Vec::new();
    }

    let foot = position.y - config.foot_offset;
    let heights = [
        foot + config.body_height * 0.1,
        foot + config.body_height * 0.5,
        foot + config.body_height * 0.9,
    ];
    let reach = config.body_radius + config.wall_probe_margin;

    let mut normals: Vec<Vec3> = Vec::with_capacity(heights.len());
    for height in heights {
        let origin = Vec3::new(position.x, height, position.z);
        let Some(hit) = world.raycast_closest(origin, origin + direction * reach, body) else {
            continue;
        };
        if hit.normal.is_finite()
            && hit.normal.y.abs() < config.wall_normal_max_y
            && !normals.iter().any(|n| n.abs_diff_eq(hit.normal, 1e-3))
        {
            normals.push(hit.normal);
        }
    }
    normals
}

/// Replace non-finite components with zero and cap horizontal speed.
pub fn sanitize(velocity: Vec3, max_horizontal_speed: f32) -> Vec3 {
    let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
    let velocity = Vec3::new(finite(velocity.x), finite(velocity.y), finite(velocity.z));
    let capped = horizontal(velocity).clamp_length_max(max_horizontal_speed);
    Vec3::new(capped.x, velocity.y, capped.z)
}

#[inline]
fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
