//! Rapier3D physics backend.
//!
//! Enable with the `rapier3d` feature. The character must be a dynamic rigid
//! body with its collider on the same entity. Rapier's own gravity applies;
//! the controller only steers velocity and adds the jump hold force.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{LocomotionBackend, PhysicsWorld};
use crate::collision::{CollisionData, ContactData};
use crate::controller::LocomotionController;
use crate::state::RemotelyDriven;
use crate::surface::{MovingPlatform, Surface, SurfaceKind};
use crate::systems::fixed_delta;
use crate::LocomotionSet;

/// Rapier3D physics backend for the locomotion controller.
pub struct Rapier3dBackend;

impl LocomotionBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }
}

/// Plugin that sets up the Rapier3D specific systems.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ControllerForces>();

        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(LocomotionSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            rapier_drive_controllers.in_set(LocomotionSet::Simulate),
        );
    }
}

/// Force the controller added to [`ExternalForce`] during the last step.
///
/// Subtracted again before the next step so the controller's forces never
/// pile up and forces from other game systems are preserved.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ControllerForces {
    pub applied: Vec3,
}

type BodyData = (
    &'static mut Transform,
    &'static mut Velocity,
    Option<&'static mut ExternalForce>,
    Option<&'static mut ControllerForces>,
    Option<&'static ReadMassProperties>,
);

/// System parameter bundling everything [`RapierWorld`] reads and writes.
///
/// Game systems that forward triggers (hazards, launchers) to a controller
/// use it to get a [`PhysicsWorld`]:
///
/// ```rust,ignore
/// fn on_launcher(mut physics: RapierPhysics, mut q: Query<&mut LocomotionController>) {
///     for mut controller in &mut q {
///         physics.with_world(|world| {
///             controller.on_trigger(world, Trigger::Launcher { velocity: Vec3::Y * 20.0 })
///         });
///     }
/// }
/// ```
#[derive(SystemParam)]
pub struct RapierPhysics<'w, 's> {
    context: ReadRapierContext<'w, 's>,
    bodies: Query<'w, 's, BodyData, Without<MovingPlatform>>,
    platforms: Query<'w, 's, &'static Velocity, With<MovingPlatform>>,
    surfaces: Query<'w, 's, Option<&'static Surface>>,
}

impl<'w, 's> RapierPhysics<'w, 's> {
    /// Run `f` against the default Rapier context.
    ///
    /// Returns `None` when there is no single default context.
    pub fn with_world<R>(&mut self, f: impl FnOnce(&mut RapierWorld<'_, 'w, 's>) -> R) -> Option<R> {
        let Ok(context) = self.context.single() else {
            return None;
        };
        let mut world = RapierWorld {
            context: &context,
            bodies: &mut self.bodies,
            platforms: &self.platforms,
            surfaces: &self.surfaces,
        };
        Some(f(&mut world))
    }
}

/// [`PhysicsWorld`] adapter over a Rapier context and the body components.
pub struct RapierWorld<'a, 'w, 's> {
    context: &'a RapierContext<'a>,
    bodies: &'a mut Query<'w, 's, BodyData, Without<MovingPlatform>>,
    platforms: &'a Query<'w, 's, &'static Velocity, With<MovingPlatform>>,
    surfaces: &'a Query<'w, 's, Option<&'static Surface>>,
}

impl PhysicsWorld for RapierWorld<'_, '_, '_> {
    fn for_each_contact(&self, body: Entity, visit: &mut dyn FnMut(ContactData)) {
        let fallback_point = self.position(body);
        for pair in self.context.contact_pairs_with(body) {
            if !pair.has_any_active_contact() {
                continue;
            }
            let (Some(collider1), Some(collider2)) = (pair.collider1(), pair.collider2()) else {
                continue;
            };
            // Manifold normals point from collider1 to collider2
            let (other, flip) = if collider1 == body {
                (collider2, true)
            } else {
                (collider1, false)
            };

            for manifold in pair.manifolds() {
                let normal = if flip {
                    -manifold.normal()
                } else {
                    manifold.normal()
                };
                let point = manifold
                    .solver_contacts()
                    .next()
                    .map(|contact| contact.point())
                    .unwrap_or(fallback_point);
                visit(ContactData::new(normal, point, other));
            }
        }
    }

    fn raycast_closest(&self, origin: Vec3, target: Vec3, exclude: Entity) -> Option<CollisionData> {
        let delta = target - origin;
        let length = delta.length();
        if !length.is_finite() || length <= f32::EPSILON {
            return None;
        }
        let direction = delta / length;

        let filter = QueryFilter::default()
            .exclude_rigid_body(exclude)
            .exclude_sensors();

        self.context
            .cast_ray_and_get_normal(origin, direction, length, true, filter)
            .map(|(entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(entity))
            })
    }

    fn surface(&self, body: Entity) -> SurfaceKind {
        // Untagged geometry is plain ground
        self.surfaces
            .get(body)
            .ok()
            .flatten()
            .map_or(SurfaceKind::Normal, |surface| SurfaceKind::from(*surface))
    }

    fn platform_velocity(&self, body: Entity) -> Option<Vec3> {
        self.platforms.get(body).ok().map(|velocity| velocity.linvel)
    }

    fn position(&self, body: Entity) -> Vec3 {
        self.bodies
            .get(body)
            .map(|(transform, ..)| transform.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_position(&mut self, body: Entity, position: Vec3) {
        if let Ok((mut transform, ..)) = self.bodies.get_mut(body) {
            transform.translation = position;
        }
    }

    fn velocity(&self, body: Entity) -> Vec3 {
        self.bodies
            .get(body)
            .map(|(_, velocity, ..)| velocity.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(&mut self, body: Entity, velocity: Vec3) {
        if let Ok((_, mut current, ..)) = self.bodies.get_mut(body) {
            current.linvel = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: Entity, angular_velocity: Vec3) {
        if let Ok((_, mut current, ..)) = self.bodies.get_mut(body) {
            current.angvel = angular_velocity;
        }
    }

    fn rotation(&self, body: Entity) -> Quat {
        self.bodies
            .get(body)
            .map(|(transform, ..)| transform.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(&mut self, body: Entity, rotation: Quat) {
        if let Ok((mut transform, ..)) = self.bodies.get_mut(body) {
            transform.rotation = rotation;
        }
    }

    fn apply_force(&mut self, body: Entity, force: Vec3) {
        let Ok((_, _, external, forces, _)) = self.bodies.get_mut(body) else {
            return;
        };
        match (external, forces) {
            (Some(mut external), Some(mut forces)) => {
                external.force += force;
                forces.applied += force;
            }
            _ => {
                warn_once!(
                    target: "locomotion",
                    "character body {body} needs ExternalForce and ControllerForces for jump hold forces"
                );
            }
        }
    }

    fn mass(&self, body: Entity) -> f32 {
        self.bodies
            .get(body)
            .ok()
            .and_then(|(.., props)| props.map(|props| props.mass))
            .filter(|mass| *mass > 0.0 && mass.is_finite())
            .unwrap_or(1.0)
    }
}

/// Remove last step's controller forces from [`ExternalForce`].
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForces)>) {
    for (mut external, mut forces) in &mut q {
        external.force -= forces.applied;
        forces.applied = Vec3::ZERO;
    }
}

/// Run every locally simulated controller for this fixed step.
pub fn rapier_drive_controllers(
    mut physics: RapierPhysics,
    time: Res<Time<Fixed>>,
    mut controllers: Query<&mut LocomotionController, Without<RemotelyDriven>>,
) {
    let dt = fixed_delta(&time);
    physics.with_world(|world| {
        for mut controller in &mut controllers {
            controller.update(world, dt);
        }
    });
}

/// Bundle with the Rapier3D components a character body needs.
///
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use platformer_locomotion::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         LocomotionConfig::player(),
///         LocomotionInput::default(),
///         Rapier3dCharacterBundle::default(),
///         Collider::capsule_y(0.5, 0.4),
///     ));
/// }
/// ```
///
/// Rotation is locked; the controller sets the facing itself. The collider
/// has no friction so walls never hold the character up.
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    pub external_force: ExternalForce,
    pub controller_forces: ControllerForces,
    pub locked_axes: LockedAxes,
    pub damping: Damping,
    pub friction: Friction,
    pub mass_properties: ReadMassProperties,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            controller_forces: ControllerForces::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            // Rapier fills this in after the first physics step
            mass_properties: ReadMassProperties::default(),
        }
    }
}

impl Rapier3dCharacterBundle {
    /// Set the damping coefficients.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set the collider friction.
    pub fn with_friction(mut self, coefficient: f32) -> Self {
        self.friction.coefficient = coefficient;
        self
    }
}
