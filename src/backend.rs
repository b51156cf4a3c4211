//! Physics backend abstraction.
//!
//! The controller never talks to a physics engine directly. Every operation
//! receives a [`PhysicsWorld`] explicitly, which exposes the small set of
//! queries and body commands the controller needs. This keeps the controller
//! testable against a mock world and allows swapping physics engines.
//!
//! [`LocomotionBackend`] is the Bevy-side counterpart: it provides the plugin
//! that builds a [`PhysicsWorld`] adapter for a concrete engine and drives the
//! controllers each fixed step.

use bevy::prelude::*;

use crate::collision::{CollisionData, ContactData};
use crate::surface::SurfaceKind;

/// Query and command interface into an existing physics world.
///
/// All bodies are identified by their [`Entity`]. Implementations must return
/// conservative defaults for unknown bodies (zero vectors, no contacts, no
/// hits) instead of panicking.
pub trait PhysicsWorld {
    /// Visit every current contact of `body`.
    ///
    /// Normals passed to `visit` point away from the other body, towards
    /// `body`.
    fn for_each_contact(&self, body: Entity, visit: &mut dyn FnMut(ContactData));

    /// Cast a ray from `origin` to `target` and return the closest hit.
    ///
    /// `exclude` is the casting body and must never be reported.
    fn raycast_closest(&self, origin: Vec3, target: Vec3, exclude: Entity) -> Option<CollisionData>;

    /// Surface tag attached to a body.
    fn surface(&self, body: Entity) -> SurfaceKind;

    /// Velocity of a body if it is a moving platform.
    fn platform_velocity(&self, body: Entity) -> Option<Vec3>;

    /// Get the world position of a body.
    fn position(&self, body: Entity) -> Vec3;

    /// Teleport a body.
    fn set_position(&mut self, body: Entity, position: Vec3);

    /// Get the linear velocity of a body.
    fn velocity(&self, body: Entity) -> Vec3;

    /// Set the linear velocity of a body.
    fn set_velocity(&mut self, body: Entity, velocity: Vec3);

    /// Set the angular velocity of a body.
    fn set_angular_velocity(&mut self, body: Entity, angular_velocity: Vec3);

    /// Get the orientation of a body.
    fn rotation(&self, body: Entity) -> Quat;

    /// Set the orientation of a body.
    fn set_rotation(&mut self, body: Entity, rotation: Quat);

    /// Apply a force for the current physics step.
    fn apply_force(&mut self, body: Entity, force: Vec3);

    /// Get the mass of a body.
    ///
    /// Used to scale forces so configured accelerations do not depend on the
    /// body's actual mass.
    fn mass(&self, _body: Entity) -> f32 {
        1.0
    }
}

/// Trait for Bevy physics backend implementations.
///
/// A backend contributes the plugin that runs
/// [`LocomotionController::update`](crate::controller::LocomotionController::update)
/// for every locally simulated character inside
/// [`LocomotionSet::Simulate`](crate::LocomotionSet::Simulate).
pub trait LocomotionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Collect the current contacts of a body into a vector.
///
/// Contacts are gathered once per tick and shared by the ground probe and the
/// wall guard.
pub fn collect_contacts<W: PhysicsWorld + ?Sized>(world: &W, body: Entity) -> Vec<ContactData> {
    let mut contacts = Vec::new();
    world.for_each_contact(body, &mut |contact| contacts.push(contact));
    contacts
}
