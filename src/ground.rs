//! Ground probe.
//!
//! Classifies what, if anything, is under the character's feet. Two stages:
//!
//! 1. **Contact scan** over the body's current contacts. A contact counts as
//!    floor when its normal points up steeply enough and its point lies no
//!    higher than a small margin above the feet (higher contacts are ledges or
//!    walls rubbing the character's side).
//! 2. **Raycast fallback** straight down from just above the feet, accepted
//!    only inside a tight band around the feet and only while the character
//!    is not rising fast (a rising character passing a ledge corner must not
//!    read as grounded).
//!
//! The probe is a pure query: it never mutates the world or the character.

use bevy::prelude::*;

use crate::backend::PhysicsWorld;
use crate::collision::ContactData;
use crate::surface::SurfaceKind;

/// Geometry and thresholds for [`probe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeParams {
    /// Distance from the body origin down to the feet.
    pub foot_offset: f32,
    /// Minimum Y component of a floor normal.
    pub normal_min_y: f32,
    /// Contacts higher than `foot + foot_contact_margin` are not floor.
    pub foot_contact_margin: f32,
    /// Fallback ray starts this far above the feet.
    pub ray_start_offset: f32,
    /// Fallback ray reaches this far below the feet.
    pub ray_length: f32,
    /// Accepted ray hits above the feet.
    pub accept_above: f32,
    /// Accepted ray hits below the feet.
    pub accept_below: f32,
    /// Fallback is skipped while rising faster than this.
    pub max_rise_speed: f32,
    /// Steepest jumpable slope in radians.
    pub max_jumpable_slope: f32,
}

impl ProbeParams {
    /// Whether a jump may start from ground with this slope.
    #[inline]
    pub fn can_jump(&self, slope_angle: f32) -> bool {
        slope_angle < self.max_jumpable_slope
    }
}

/// The ground found by one of the probe stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub normal: Vec3,
    pub point: Vec3,
    pub body: Entity,
    pub surface: SurfaceKind,
}

/// Result of probing the ground for one tick.
///
/// Produced fresh every tick and never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundQueryResult {
    pub grounded: bool,
    /// Slope in radians, 0 on flat ground.
    pub slope_angle: f32,
    pub surface: SurfaceKind,
    /// Whether the ground is flat enough to jump from.
    pub can_jump: bool,
    /// Horizontal velocity of the ground body if it is a moving platform.
    pub ground_body_velocity: Vec3,
    pub ground_body: Option<Entity>,
    pub normal: Vec3,
}

impl Default for GroundQueryResult {
    fn default() -> Self {
        Self::airborne()
    }
}

impl GroundQueryResult {
    /// Nothing underfoot.
    pub fn airborne() -> Self {
        Self {
            grounded: false,
            slope_angle: 0.0,
            surface: SurfaceKind::None,
            can_jump: false,
            ground_body_velocity: Vec3::ZERO,
            ground_body: None,
            normal: Vec3::Y,
        }
    }

    /// Build a grounded result from a hit.
    pub fn from_hit(hit: GroundHit, platform_velocity: Option<Vec3>, params: &ProbeParams) -> Self {
        let slope_angle = slope_angle(hit.normal.y);
        let ground_body_velocity = platform_velocity
            .map(|v| Vec3::new(v.x, 0.0, v.z))
            .filter(|v| v.is_finite())
            .unwrap_or(Vec3::ZERO);
        Self {
            grounded: true,
            slope_angle,
            surface: hit.surface,
            can_jump: params.can_jump(slope_angle),
            ground_body_velocity,
            ground_body: Some(hit.body),
            normal: hit.normal,
        }
    }

    /// Whether the character stands on a moving platform.
    #[inline]
    pub fn on_platform(&self) -> bool {
        self.ground_body_velocity != Vec3::ZERO
    }
}

/// Slope angle in radians for a surface normal's Y component.
#[inline]
pub fn slope_angle(normal_y: f32) -> f32 {
    normal_y.clamp(0.0, 1.0).acos()
}

/// Probe the ground under `body`.
///
/// `contacts` is the body's contact set for this tick, `position` and
/// `velocity` its current state.
pub fn probe<W: PhysicsWorld + ?Sized>(
    world: &W,
    body: Entity,
    contacts: &[ContactData],
    position: Vec3,
    velocity: Vec3,
    params: &ProbeParams,
) -> GroundQueryResult {
    let foot = position - Vec3::Y * params.foot_offset;

    let hit = scan_contacts(contacts, foot, params, |other| world.surface(other))
        .or_else(|| raycast_fallback(world, body, foot, velocity.y, params));

    match hit {
        Some(hit) => GroundQueryResult::from_hit(hit, world.platform_velocity(hit.body), params),
        None => GroundQueryResult::airborne(),
    }
}

/// Pick the floor contact among `contacts`.
///
/// Tie-break policy: an ice contact replaces an earlier non-ice pick. A
/// character sliding on an ice floor while its side rubs a normal wall must
/// keep ice physics.
pub fn scan_contacts(
    contacts: &[ContactData],
    foot: Vec3,
    params: &ProbeParams,
    surface_of: impl Fn(Entity) -> SurfaceKind,
) -> Option<GroundHit> {
    let mut best: Option<GroundHit> = None;

    for contact in contacts {
        if !contact.normal.is_finite() || contact.normal.y < params.normal_min_y {
            continue;
        }
        if contact.point.y > foot.y + params.foot_contact_margin {
            continue;
        }
        let surface = surface_of(contact.other);
        if surface == SurfaceKind::Wall {
            continue;
        }

        let candidate = GroundHit {
            normal: contact.normal,
            point: contact.point,
            body: contact.other,
            surface,
        };
        match best {
            None => best = Some(candidate),
            Some(current) if !current.surface.is_ice() && surface.is_ice() => {
                best = Some(candidate)
            }
            Some(_) => {}
        }
    }

    best
}

/// Short downward ray from just above the feet.
pub fn raycast_fallback<W: PhysicsWorld + ?Sized>(
    world: &W,
    body: Entity,
    foot: Vec3,
    vertical_velocity: f32,
    params: &ProbeParams,
) -> Option<GroundHit> {
    if vertical_velocity > params.max_rise_speed {
        return None;
    }

    let origin = foot + Vec3::Y * params.ray_start_offset;
    let target = foot - Vec3::Y * params.ray_length;
    let hit = world.raycast_closest(origin, target, body)?;
    let ground = hit.entity?;

    let offset = hit.point.y - foot.y;
    if offset > params.accept_above || offset < -params.accept_below {
        return None;
    }
    if hit.normal.y <= 0.0 {
        return None;
    }

    let surface = world.surface(ground);
    if surface == SurfaceKind::Wall {
        return None;
    }

    Some(GroundHit {
        normal: hit.normal,
        point: hit.point,
        body: ground,
        surface,
    })
}
