//! Movement input.
//!
//! [`LocomotionInput`] is the per-tick control frame from player input or AI.
//! The game writes it (directly or as a component); the controller reads it on
//! the next update.

use bevy::prelude::*;

/// Desired movement for one tick.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_locomotion::prelude::*;
///
/// let mut input = LocomotionInput::default();
/// input.set_move(Vec2::new(0.0, 2.0));
/// assert_eq!(input.move_axis, Vec2::Y); // clamped to unit length
/// assert!(input.is_moving());
///
/// input.clear();
/// assert!(!input.is_moving());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Default)]
#[reflect(Component)]
pub struct LocomotionInput {
    /// Character-local move axis: x strafes right, y moves forward.
    pub move_axis: Vec2,
    /// Whether the jump button is held.
    ///
    /// The controller detects the press edge itself; just report the button
    /// state every tick.
    pub jump_held: bool,
    pub sprint_held: bool,
    /// Camera heading in radians around +Y.
    pub camera_yaw: f32,
}

impl LocomotionInput {
    pub fn new(move_axis: Vec2, jump_held: bool, sprint_held: bool, camera_yaw: f32) -> Self {
        let mut input = Self {
            jump_held,
            sprint_held,
            ..default()
        };
        input.set_move(move_axis);
        input.set_camera_yaw(camera_yaw);
        input
    }

    /// Set the move axis, clamped to unit length. Non-finite input is dropped.
    pub fn set_move(&mut self, axis: Vec2) {
        self.move_axis = if axis.is_finite() {
            axis.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
    }

    /// Set the camera yaw. Non-finite values are ignored.
    pub fn set_camera_yaw(&mut self, yaw: f32) {
        if yaw.is_finite() {
            self.camera_yaw = yaw;
        }
    }

    pub fn set_jump_held(&mut self, held: bool) {
        self.jump_held = held;
    }

    pub fn set_sprint_held(&mut self, held: bool) {
        self.sprint_held = held;
    }

    /// Clear movement and buttons. Camera yaw is kept.
    pub fn clear(&mut self) {
        self.move_axis = Vec2::ZERO;
        self.jump_held = false;
        self.sprint_held = false;
    }

    /// Check if there is active movement input.
    pub fn is_moving(&self) -> bool {
        self.move_axis.length_squared() > 1e-6
    }
}
