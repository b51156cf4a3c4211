//! Backend independent locomotion systems.
//!
//! The per-tick simulation itself is owned by the physics backend, which
//! builds a [`PhysicsWorld`](crate::backend::PhysicsWorld) adapter and runs
//! [`LocomotionController::update`] in
//! [`LocomotionSet::Simulate`](crate::LocomotionSet::Simulate). These systems
//! handle everything around it.

use bevy::prelude::*;

use crate::animation::AnimationState;
use crate::config::LocomotionConfig;
use crate::controller::LocomotionController;
use crate::events::CharacterEvent;
use crate::intent::LocomotionInput;
use crate::state::RemotelyDriven;

/// Attach a controller to every entity that has a config but no controller.
///
/// The controller starts at the entity's current translation.
pub fn attach_controllers(
    mut commands: Commands,
    q: Query<(Entity, &LocomotionConfig, Option<&Transform>), Without<LocomotionController>>,
) {
    for (entity, config, transform) in &q {
        let position = transform.map(|t| t.translation).unwrap_or(Vec3::ZERO);
        if let Err(error) = config.validate() {
            warn!(target: "locomotion", ?entity, "invalid locomotion config: {error}");
        }
        let controller = LocomotionController::new(entity, *config).with_spawn_position(position);
        commands
            .entity(entity)
            .insert((controller, AnimationState::default()));
    }
}

/// Push edited config components into their controllers.
pub fn sync_config(
    mut q: Query<(&LocomotionConfig, &mut LocomotionController), Changed<LocomotionConfig>>,
) {
    for (config, mut controller) in &mut q {
        if controller.config() != config {
            controller.set_config(*config);
        }
    }
}

/// Copy input components into controllers.
///
/// Remotely driven characters take their state from replication and are
/// skipped.
pub fn apply_locomotion_input(
    mut q: Query<(&LocomotionInput, &mut LocomotionController), Without<RemotelyDriven>>,
) {
    for (input, mut controller) in &mut q {
        controller.set_input(*input);
    }
}

/// Forward queued controller events as [`CharacterEvent`]s.
pub fn publish_locomotion_events(
    mut q: Query<(Entity, &mut LocomotionController)>,
    mut writer: EventWriter<CharacterEvent>,
) {
    for (character, mut controller) in &mut q {
        // Avoid tripping change detection on idle controllers
        if controller.bypass_change_detection().has_pending_events() {
            for event in controller.drain_events() {
                writer.write(CharacterEvent { character, event });
            }
        }
    }
}

/// Mirror the controller's animation state into the [`AnimationState`]
/// component, only touching it on change.
pub fn sync_animation_state(
    mut commands: Commands,
    mut q: Query<(Entity, &LocomotionController, Option<&mut AnimationState>)>,
) {
    for (entity, controller, current) in &mut q {
        let next = controller.animation_state();
        match current {
            Some(mut current) => {
                current.set_if_neq(next);
            }
            None => {
                commands.entity(entity).insert(next);
            }
        }
    }
}

/// Fixed timestep length, falling back to 60 Hz when the clock has not
/// advanced (e.g. when `FixedUpdate` is run by hand in tests).
pub fn fixed_delta(time: &Time<Fixed>) -> f32 {
    Some(time.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0)
}
