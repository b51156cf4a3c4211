//! Per-character state.
//!
//! [`CharacterState`] is owned exclusively by one
//! [`LocomotionController`](crate::controller::LocomotionController). Concerns
//! that used to be independent booleans are tagged unions here, so that
//! combinations like "jumping while standing on a wall-steep slope" cannot be
//! represented.

use bevy::prelude::*;

use crate::surface::SurfaceKind;

/// Identifier of a player, used for kill attribution.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(pub u64);

/// Jump state machine.
///
/// ```text
/// Grounded ──leave ground──▶ CoyoteWindow ──expires──▶ Airborne
///    │                          │
///    └────────jump──────────────┴──▶ Ascending ──release / max time──▶ Falling
///
/// Falling ──grounded, vy <= landing threshold──▶ Grounded
/// ```
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub enum JumpPhase {
    /// On jumpable ground. The coyote timer is full.
    #[default]
    Grounded,
    /// Recently left jumpable ground; a jump is still honored.
    CoyoteWindow { remaining: f32 },
    /// A jump is in progress and the hold force may still push.
    Ascending { elapsed: f32 },
    /// The jump hold is over but the jump has not landed yet.
    Falling,
    /// No jump available: falling, wall-vetoed, or on ground too steep to jump from.
    Airborne,
}

impl JumpPhase {
    /// Whether a jump may start in this phase.
    pub fn can_start_jump(&self) -> bool {
        match *self {
            JumpPhase::Grounded => true,
            JumpPhase::CoyoteWindow { remaining } => remaining > 0.0,
            JumpPhase::Ascending { .. } | JumpPhase::Falling | JumpPhase::Airborne => false,
        }
    }

    /// Whether the jump hold is still active.
    pub fn is_ascending(&self) -> bool {
        matches!(self, JumpPhase::Ascending { .. })
    }

    /// Whether a jump started and has not landed yet.
    pub fn jump_in_progress(&self) -> bool {
        matches!(self, JumpPhase::Ascending { .. } | JumpPhase::Falling)
    }

    /// Remaining coyote time, reported when the character leaves the ground.
    pub fn coyote_remaining(&self, coyote_time: f32) -> f32 {
        match *self {
            JumpPhase::Grounded => coyote_time,
            JumpPhase::CoyoteWindow { remaining } => remaining.max(0.0),
            _ => 0.0,
        }
    }
}

/// Bounded memory of the last ice surface, keeping ice movement active
/// briefly after leaving it.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct IceMemory {
    pub surface: SurfaceKind,
    pub remaining: f32,
}

/// Complete mutable state of one character.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct CharacterState {
    // === Body Mirror ===
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,

    // === Ground ===
    pub grounded: bool,
    pub slope_angle: f32,
    pub surface: SurfaceKind,

    // === Jump ===
    pub jump_phase: JumpPhase,

    // === Walls ===
    /// Normal of the wall the character touches this tick.
    pub wall_contact: Option<Vec3>,

    // === Stuck Recovery ===
    pub stuck_timer: f32,
    pub last_position: Vec3,

    // === Ice Grace ===
    pub ice_grace: Option<IceMemory>,

    // === Gameplay ===
    pub is_dead: bool,
    pub has_won: bool,
    pub score: i32,
    pub last_hit_by: Option<PlayerId>,

    /// Remaining time an external launch owns the body.
    pub launch_lock: Option<f32>,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self::spawned_at(Vec3::ZERO)
    }
}

impl CharacterState {
    /// Fresh state for a character standing at `position`.
    pub fn spawned_at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            grounded: false,
            slope_angle: 0.0,
            surface: SurfaceKind::None,
            jump_phase: JumpPhase::Grounded,
            wall_contact: None,
            stuck_timer: 0.0,
            last_position: position,
            ice_grace: None,
            is_dead: false,
            has_won: false,
            score: 0,
            last_hit_by: None,
            launch_lock: None,
        }
    }

    /// Clear every transient flag for a respawn at `position`.
    ///
    /// This is the only place respawn clears state. Score and orientation
    /// survive; everything else returns to its spawn value.
    pub fn reset(&mut self, position: Vec3) {
        let score = self.score;
        let orientation = self.orientation;
        *self = Self {
            score,
            orientation,
            ..Self::spawned_at(position)
        };
    }

    /// Whether an external launch currently owns the body.
    #[inline]
    pub fn is_launched(&self) -> bool {
        self.launch_lock.is_some()
    }
}

/// Marker for characters driven by network replication.
///
/// Their bodies are moved kinematically by the replication layer; the input
/// and simulation systems skip them entirely.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct RemotelyDriven;
