//! # `platformer_locomotion`
//!
//! Physics-grounded 3D platformer locomotion for a party game, with a
//! swappable physics backend.
//!
//! The controller steers a dynamic rigid body living in an existing physics
//! world. Every fixed tick it:
//! - Probes the ground from contacts, falling back to a short downward ray
//! - Tracks the jump state machine with coyote time and variable jump height
//! - Refuses jumps and residual upward drift while pressed against a wall
//! - Integrates horizontal velocity for normal ground, ice, ice slopes and air
//! - Inherits the velocity of moving platforms
//! - Kicks wedged characters loose
//! - Handles the kill plane, hazards, goals, coins and launchers
//! - Derives a discrete animation state
//!
//! ## Architecture
//!
//! [`LocomotionController`](controller::LocomotionController) holds all
//! per-character state and never owns the physics world. Every call that
//! touches the body receives a [`PhysicsWorld`](backend::PhysicsWorld), which
//! a backend implements on top of a real engine (Rapier3D is included behind
//! the `rapier3d` feature) and tests implement with a mock.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use platformer_locomotion::prelude::*;
//!
//! // Spawn a character with a config; the plugin attaches the controller.
//! let config = LocomotionConfig::player();
//! let input = LocomotionInput::new(Vec2::Y, false, false, 0.0);
//! assert!(input.is_moving());
//! # let _ = config;
//! ```

use bevy::prelude::*;

pub mod animation;
pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod ground;
pub mod intent;
pub mod jump;
pub mod movement;
pub mod state;
pub mod stuck;
pub mod surface;
pub mod systems;
pub mod wall;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::animation::AnimationState;
    pub use crate::backend::{LocomotionBackend, PhysicsWorld};
    pub use crate::collision::{CollisionData, ContactData};
    pub use crate::config::LocomotionConfig;
    pub use crate::controller::LocomotionController;
    pub use crate::diagnostics::{DiagnosticLevel, DiagnosticSink, NullSink, TracingSink};
    pub use crate::error::ConfigError;
    pub use crate::events::{CharacterEvent, DeathCause, LocomotionEvent, Trigger};
    pub use crate::ground::GroundQueryResult;
    pub use crate::intent::LocomotionInput;
    pub use crate::state::{CharacterState, JumpPhase, PlayerId, RemotelyDriven};
    pub use crate::surface::{MovingPlatform, Surface, SurfaceKind};
    pub use crate::{LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// System sets for the locomotion pipeline, chained in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Attach controllers, clear last step's forces.
    Preparation,
    /// Copy input components into controllers.
    Input,
    /// Run the controllers against the physics world. Owned by the backend.
    Simulate,
    /// Publish events and animation state.
    Presentation,
}

/// Main plugin for the locomotion system.
///
/// Generic over a physics backend `B` which contributes the system that runs
/// the controllers against its physics world.
///
/// # Examples
///
/// With the Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use platformer_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(LocomotionPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::LocomotionBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<intent::LocomotionInput>();
        app.register_type::<animation::AnimationState>();
        app.register_type::<state::RemotelyDriven>();
        app.register_type::<surface::Surface>();
        app.register_type::<surface::MovingPlatform>();

        app.add_event::<events::CharacterEvent>();

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Preparation,
                LocomotionSet::Input,
                LocomotionSet::Simulate,
                LocomotionSet::Presentation,
            )
                .chain(),
        );

        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::attach_controllers, systems::sync_config)
                .chain()
                .in_set(LocomotionSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::apply_locomotion_input.in_set(LocomotionSet::Input),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::publish_locomotion_events,
                systems::sync_animation_state,
            )
                .in_set(LocomotionSet::Presentation),
        );
    }
}
