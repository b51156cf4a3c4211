//! Discrete presentation state for the animation layer.

use bevy::prelude::*;

use crate::state::{CharacterState, JumpPhase};

/// Animation state derived from the character state each tick.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[reflect(Component)]
pub enum AnimationState {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
    Dead,
    Dance,
}

/// Inputs of [`select`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationInputs {
    pub grounded: bool,
    pub velocity: Vec3,
    pub jump_phase: JumpPhase,
    /// The stuck timer is running.
    pub stuck: bool,
    pub is_dead: bool,
    pub has_won: bool,
}

impl From<&CharacterState> for AnimationInputs {
    fn from(state: &CharacterState) -> Self {
        Self {
            grounded: state.grounded,
            velocity: state.velocity,
            jump_phase: state.jump_phase,
            stuck: state.stuck_timer > 0.0,
            is_dead: state.is_dead,
            has_won: state.has_won,
        }
    }
}

/// Pick the animation state. Priority: Dead, Dance, Jump, Fall, Run, Idle.
pub fn select(inputs: &AnimationInputs, run_speed_threshold: f32) -> AnimationState {
    if inputs.is_dead {
        return AnimationState::Dead;
    }
    if inputs.has_won {
        return AnimationState::Dance;
    }
    if inputs.jump_phase.is_ascending() && inputs.velocity.y > 0.0 {
        return AnimationState::Jump;
    }
    if !inputs.grounded {
        // A pinned character reads as falling until recovery frees it
        return if inputs.velocity.y > 0.0 && !inputs.stuck {
            AnimationState::Jump
        } else {
            AnimationState::Fall
        };
    }

    let horizontal_speed = Vec2::new(inputs.velocity.x, inputs.velocity.z).length();
    if horizontal_speed > run_speed_threshold {
        AnimationState::Run
    } else {
        AnimationState::Idle
    }
}
