//! Error types.

use thiserror::Error;

/// Errors produced while loading or validating a [`LocomotionConfig`](crate::config::LocomotionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse locomotion config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("`{field}` must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("`{field}` must lie in {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error(
        "min_jump_force ({jump}) must exceed wall_residual_rise_limit ({limit}) \
         or the wall guard would cancel real jumps"
    )]
    JumpWithinWallClamp { jump: f32, limit: f32 },
}
