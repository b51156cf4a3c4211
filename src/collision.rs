//! Physics query result structures.
//!
//! These hold the results of the two kinds of queries the controller issues:
//! raycasts ([`CollisionData`]) and contact iteration ([`ContactData`]).

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Body that was hit.
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a raycast result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// One contact point between the character and another body.
///
/// The normal is always oriented away from the other body, towards the
/// character. For a flat floor under the character this is `Vec3::Y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactData {
    /// Contact normal pointing from the other body towards the character.
    pub normal: Vec3,
    /// World-space contact point.
    pub point: Vec3,
    /// The other body in contact.
    pub other: Entity,
}

impl ContactData {
    pub fn new(normal: Vec3, point: Vec3, other: Entity) -> Self {
        Self {
            normal,
            point,
            other,
        }
    }

    /// Whether the contact is mostly horizontal, i.e. a wall.
    #[inline]
    pub fn is_wall_like(&self, max_normal_y: f32) -> bool {
        self.normal.y.abs() < max_normal_y
    }
}
