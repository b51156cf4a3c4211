//! Surface classification.
//!
//! Level bodies are tagged with a [`Surface`] component. The ground probe turns
//! the tag of whatever it finds underfoot into a [`SurfaceKind`], which the
//! movement integrator dispatches on.

use bevy::prelude::*;

/// What the character is standing on.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub enum SurfaceKind {
    /// Nothing underfoot.
    #[default]
    None,
    /// Regular ground: instant start/stop.
    Normal,
    /// Low friction: rate-limited acceleration and coasting.
    Ice,
    /// Ice with a constant downhill pull.
    IceSlope {
        /// Horizontal (x, z) direction the slope pulls towards. Normalized.
        slide_direction: Vec2,
        /// Tilt of the slope in radians. Scales the downhill pull.
        tilt_angle: f32,
    },
    /// Near-vertical surface. Never counts as ground.
    Wall,
}

impl SurfaceKind {
    /// Whether this surface uses ice movement.
    #[inline]
    pub fn is_ice(&self) -> bool {
        matches!(self, SurfaceKind::Ice | SurfaceKind::IceSlope { .. })
    }

    /// Downhill pull of an ice slope in world space, zero otherwise.
    pub fn slide_vector(&self) -> Vec3 {
        match *self {
            SurfaceKind::IceSlope {
                slide_direction,
                tilt_angle,
            } => {
                let dir = slide_direction.normalize_or_zero();
                Vec3::new(dir.x, 0.0, dir.y) * tilt_angle
            }
            _ => Vec3::ZERO,
        }
    }
}

/// Surface tag for level bodies.
///
/// Bodies without this component are treated as [`Surface::Normal`].
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_locomotion::prelude::*;
///
/// // A slope that pulls characters towards +X
/// let slope = Surface::ice_slope(Vec2::X, 0.3);
/// assert!(SurfaceKind::from(slope).is_ice());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Default)]
#[reflect(Component)]
pub enum Surface {
    #[default]
    Normal,
    Ice,
    IceSlope {
        slide_direction: Vec2,
        tilt_angle: f32,
    },
    Wall,
}

impl Surface {
    /// Create an ice slope tag. The direction is normalized.
    pub fn ice_slope(slide_direction: Vec2, tilt_angle: f32) -> Self {
        Surface::IceSlope {
            slide_direction: slide_direction.normalize_or_zero(),
            tilt_angle,
        }
    }
}

impl From<Surface> for SurfaceKind {
    fn from(surface: Surface) -> Self {
        match surface {
            Surface::Normal => SurfaceKind::Normal,
            Surface::Ice => SurfaceKind::Ice,
            Surface::IceSlope {
                slide_direction,
                tilt_angle,
            } => SurfaceKind::IceSlope {
                slide_direction,
                tilt_angle,
            },
            Surface::Wall => SurfaceKind::Wall,
        }
    }
}

/// Marker for bodies whose velocity riders inherit.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct MovingPlatform;
