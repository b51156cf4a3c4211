//! Gameplay events emitted by the controller.
//!
//! Each event fires at most once per transition. The controller queues them;
//! the game layer drains them (or, with the plugin, receives them as Bevy
//! events) for scoring, audio and replication.

use bevy::prelude::*;

use crate::state::PlayerId;

/// Why a character died.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Fell below the kill plane.
    Fall,
    /// Touched a hazard.
    Hazard,
}

/// An event from one character's controller.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum LocomotionEvent {
    JumpStart,
    Death {
        cause: DeathCause,
        attacker: Option<PlayerId>,
    },
    GoalReached,
    CoinCollected {
        value: i32,
        score: i32,
    },
    Launched {
        velocity: Vec3,
    },
    StuckRecovered,
}

/// Bevy event wrapper tagging a [`LocomotionEvent`] with its character.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CharacterEvent {
    pub character: Entity,
    pub event: LocomotionEvent,
}

/// Edge-triggered collision notifications the game forwards to the controller.
///
/// These come from discrete collision callbacks and are never used as
/// continuous per-tick state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    Hazard { attacker: Option<PlayerId> },
    Goal,
    Coin { value: i32 },
    /// A launcher trap: the body is fired with `velocity` and movement is
    /// locked out for the launch duration.
    Launcher { velocity: Vec3 },
}
