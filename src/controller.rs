//! The per-character locomotion controller.
//!
//! [`LocomotionController`] owns the character state and runs one fixed tick
//! of the pipeline against a [`PhysicsWorld`]:
//!
//! 1. Probe the ground and detect wall contact from a single contact read.
//! 2. Update the jump grace window and run the wall guard.
//! 3. Start or sustain a jump.
//! 4. Integrate horizontal movement for the current surface.
//! 5. Run stuck recovery and the kill plane check.
//! 6. Select the animation state.
//!
//! The physics world is passed into every call that touches the body instead
//! of being stored, so the same controller works as an ECS component and
//! against a test double.

use std::fmt;

use bevy::prelude::*;

use crate::animation::{self, AnimationInputs, AnimationState};
use crate::backend::{collect_contacts, PhysicsWorld};
use crate::config::LocomotionConfig;
use crate::diagnostics::{DiagnosticLevel, DiagnosticSink, TracingSink};
use crate::error::ConfigError;
use crate::events::{DeathCause, LocomotionEvent, Trigger};
use crate::ground::{self, GroundQueryResult};
use crate::intent::LocomotionInput;
use crate::jump;
use crate::movement::{self, MovementMode};
use crate::state::{CharacterState, IceMemory, JumpPhase, PlayerId};
use crate::stuck::StuckRecovery;
use crate::wall;

/// Drives one character body.
#[derive(Component)]
pub struct LocomotionController {
    body: Entity,
    config: LocomotionConfig,
    state: CharacterState,
    input: LocomotionInput,
    /// Button state seen by the last `set_input`, for edge detection.
    jump_was_held: bool,
    /// A press edge not yet consumed by `update`.
    jump_requested: bool,
    recovery: StuckRecovery,
    animation: AnimationState,
    events: Vec<LocomotionEvent>,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl fmt::Debug for LocomotionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocomotionController")
            .field("body", &self.body)
            .field("state", &self.state)
            .field("input", &self.input)
            .field("animation", &self.animation)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl LocomotionController {
    /// Create a controller for `body`, logging through [`TracingSink`].
    pub fn new(body: Entity, config: LocomotionConfig) -> Self {
        Self {
            body,
            config,
            state: CharacterState::default(),
            input: LocomotionInput::default(),
            jump_was_held: false,
            jump_requested: false,
            recovery: StuckRecovery::new(config.rng_seed ^ body.to_bits()),
            animation: AnimationState::Idle,
            events: Vec::new(),
            diagnostics: Box::new(TracingSink),
        }
    }

    /// Like [`LocomotionController::new`], rejecting an invalid config.
    pub fn try_new(body: Entity, config: LocomotionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(body, config))
    }

    /// Replace the diagnostic sink.
    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Start the state at `position` instead of the origin.
    pub fn with_spawn_position(mut self, position: Vec3) -> Self {
        self.state = CharacterState::spawned_at(position);
        self
    }

    pub fn body(&self) -> Entity {
        self.body
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Replace the config. An invalid config is still applied and reported
    /// to the diagnostic sink.
    pub fn set_config(&mut self, config: LocomotionConfig) {
        if let Err(error) = config.validate() {
            self.log(DiagnosticLevel::Warn, format_args!("invalid config: {error}"));
        }
        self.config = config;
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn input(&self) -> &LocomotionInput {
        &self.input
    }

    pub fn animation_state(&self) -> AnimationState {
        self.animation
    }

    /// Store the input for the next tick.
    ///
    /// A jump press (held now, not held on the previous call) is latched
    /// until the next `update` consumes it, so presses between ticks are not
    /// lost.
    pub fn set_input(&mut self, input: LocomotionInput) {
        if input.jump_held && !self.jump_was_held {
            self.jump_requested = true;
        }
        self.jump_was_held = input.jump_held;
        self.input = input;
    }

    /// Run one fixed tick.
    pub fn update<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt = dt.min(self.config.max_dt);
        let body = self.body;

        let position = world.position(body);
        let measured = world.velocity(body);
        let displacement = position - self.state.last_position;
        self.state.position = position;
        self.state.last_position = position;
        self.state.orientation = world.rotation(body);

        if self.state.is_dead {
            self.state.velocity = measured;
            self.jump_requested = false;
            self.refresh_animation();
            return;
        }

        let launched = self.tick_launch_lock(dt);

        let contacts = collect_contacts(&*world, body);
        let ground = ground::probe(
            &*world,
            body,
            &contacts,
            position,
            measured,
            &self.config.probe_params(),
        );
        self.apply_ground(&ground, dt);

        let mut velocity = measured;

        // Wall guard
        self.state.wall_contact = wall::detect(&contacts, &self.config);
        let guard = if launched {
            wall::WallGuard::INACTIVE
        } else {
            wall::guard(
                ground.grounded,
                self.state.wall_contact,
                velocity.y,
                &self.config,
            )
        };
        if let Some(clamped) = guard.clamped_vertical {
            self.log(
                DiagnosticLevel::Debug,
                format_args!("wall clamp vy {:.2} -> {clamped}", velocity.y),
            );
            velocity.y = clamped;
        }

        // Jump
        let previous = self.state.jump_phase;
        let mut phase = jump::update_grace(previous, &ground, velocity.y, &self.config, dt);
        if guard.veto_jump {
            phase = jump::veto(phase);
        }
        if guard.clamped_vertical.is_some() && phase.is_ascending() {
            phase = JumpPhase::Falling;
        }
        self.log_phase_change(previous, phase);

        let requested = std::mem::take(&mut self.jump_requested);
        let jump_starting =
            requested && !launched && !self.state.has_won && phase.can_start_jump();
        if jump_starting {
            velocity = jump::start_velocity(velocity, &self.config);
            phase = JumpPhase::Ascending { elapsed: 0.0 };
            self.events.push(LocomotionEvent::JumpStart);
            self.log(
                DiagnosticLevel::Debug,
                format_args!("jump start vy={:.2}", velocity.y),
            );
        } else if !launched {
            let step = jump::hold(phase, self.input.jump_held, &self.config, dt);
            if let Some(acceleration) = step.acceleration {
                let mass = world.mass(body);
                world.apply_force(body, Vec3::Y * acceleration * mass);
            }
            phase = step.phase;
        }
        self.state.jump_phase = phase;

        // Horizontal movement
        if self.state.has_won {
            velocity.x = ground.ground_body_velocity.x;
            velocity.z = ground.ground_body_velocity.z;
        } else if !launched {
            velocity = self.integrate_movement(world, &ground, position, velocity, jump_starting, dt);
        }

        // Stuck recovery
        if launched {
            self.state.stuck_timer = 0.0;
        } else if let Some(kick) = self.recovery.check(
            &mut self.state.stuck_timer,
            ground.grounded,
            displacement,
            measured.y,
            velocity,
            &self.config,
            dt,
        ) {
            velocity = kick;
            self.events.push(LocomotionEvent::StuckRecovered);
            self.log(
                DiagnosticLevel::Warn,
                format_args!("stuck at {position}, kicked with {kick}"),
            );
        }

        let max_horizontal = if launched {
            f32::INFINITY
        } else {
            self.config.max_horizontal_speed
        };
        velocity = movement::sanitize(velocity, max_horizontal);
        if velocity != measured {
            world.set_velocity(body, velocity);
        }
        self.state.velocity = velocity;

        self.check_death_at(position);
        self.refresh_animation();
    }

    /// Kill the character if `world` has it below the kill plane.
    ///
    /// Returns whether the character is dead. Also runs at the end of every
    /// `update`.
    pub fn check_death<W: PhysicsWorld + ?Sized>(&mut self, world: &W) -> bool {
        let position = world.position(self.body);
        self.check_death_at(position)
    }

    /// Teleport to `position` and clear every transient flag.
    ///
    /// Score and orientation survive. A jump button still held from before
    /// the respawn does not count as a new press.
    pub fn reset_position<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, position: Vec3) {
        world.set_position(self.body, position);
        world.set_velocity(self.body, Vec3::ZERO);
        world.set_angular_velocity(self.body, Vec3::ZERO);
        self.state.reset(position);
        self.jump_requested = false;
        self.jump_was_held = self.input.jump_held;
        self.animation = AnimationState::Idle;
        self.log(DiagnosticLevel::Info, format_args!("respawn at {position}"));
    }

    /// Lock or release player control for a launch.
    ///
    /// While locked no movement or jump is applied; the lock releases itself
    /// after `launch_lock_time`.
    pub fn set_launched(&mut self, launched: bool) {
        self.state.launch_lock = launched.then_some(self.config.launch_lock_time);
    }

    pub fn is_launched(&self) -> bool {
        self.state.is_launched()
    }

    /// Fire the body with `velocity` and lock control.
    pub fn launch<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, velocity: Vec3) {
        if !velocity.is_finite() {
            return;
        }
        world.set_velocity(self.body, velocity);
        self.state.velocity = velocity;
        self.state.jump_phase = JumpPhase::Airborne;
        self.set_launched(true);
        self.events.push(LocomotionEvent::Launched { velocity });
        self.log(DiagnosticLevel::Debug, format_args!("launched with {velocity}"));
    }

    /// Remember who last hit this character, for death attribution.
    pub fn register_hit(&mut self, attacker: PlayerId) {
        self.state.last_hit_by = Some(attacker);
    }

    /// Handle a collision trigger from the game.
    pub fn on_trigger<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, trigger: Trigger) {
        match trigger {
            Trigger::Hazard { attacker } => {
                if let Some(attacker) = attacker {
                    self.state.last_hit_by = Some(attacker);
                }
                self.die(DeathCause::Hazard);
            }
            Trigger::Goal => {
                if self.state.has_won || self.state.is_dead {
                    return;
                }
                self.state.has_won = true;
                self.events.push(LocomotionEvent::GoalReached);
                self.log(DiagnosticLevel::Info, format_args!("goal reached"));
            }
            Trigger::Coin { value } => {
                if self.state.is_dead {
                    return;
                }
                self.state.score = self.state.score.saturating_add(value);
                self.events.push(LocomotionEvent::CoinCollected {
                    value,
                    score: self.state.score,
                });
            }
            Trigger::Launcher { velocity } => {
                if !self.state.is_dead {
                    self.launch(world, velocity);
                }
            }
        }
        self.refresh_animation();
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Take the events queued since the last drain.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, LocomotionEvent> {
        self.events.drain(..)
    }

    fn integrate_movement<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        ground: &GroundQueryResult,
        position: Vec3,
        velocity: Vec3,
        jump_starting: bool,
        dt: f32,
    ) -> Vec3 {
        let direction = movement::world_direction(self.input.move_axis, self.input.camera_yaw);
        let has_input = direction.length_squared() > 1e-6;
        let speed = if self.input.sprint_held {
            self.config.move_speed * self.config.sprint_multiplier
        } else {
            self.config.move_speed
        };
        let target = direction * speed;

        let mut horizontal = match movement::select_mode(ground, self.state.ice_grace) {
            MovementMode::Ground { platform } => {
                movement::ground_velocity(velocity, target, platform, has_input, jump_starting)
            }
            MovementMode::Ice {
                surface,
                platform,
                grounded,
            } => {
                let slide = if grounded {
                    surface.slide_vector()
                } else {
                    Vec3::ZERO
                };
                movement::ice_velocity(
                    velocity,
                    target,
                    platform,
                    slide,
                    has_input,
                    &self.config,
                    dt,
                )
            }
            MovementMode::Air => movement::air_velocity(velocity, target, &self.config),
        };

        if !ground.grounded {
            let walls = movement::probe_walls(&*world, self.body, position, horizontal, &self.config);
            horizontal = movement::slide_along_walls(horizontal, &walls);
        }

        if let Some(rotation) = movement::facing(direction) {
            world.set_rotation(self.body, rotation);
            world.set_angular_velocity(self.body, Vec3::ZERO);
            self.state.orientation = rotation;
        }

        Vec3::new(horizontal.x, velocity.y, horizontal.z)
    }

    fn apply_ground(&mut self, ground: &GroundQueryResult, dt: f32) {
        if ground.surface != self.state.surface {
            self.log(
                DiagnosticLevel::Trace,
                format_args!("surface {:?} -> {:?}", self.state.surface, ground.surface),
            );
        }
        self.state.grounded = ground.grounded;
        self.state.slope_angle = ground.slope_angle;
        self.state.surface = ground.surface;

        self.state.ice_grace = if ground.grounded && ground.surface.is_ice() {
            Some(IceMemory {
                surface: ground.surface,
                remaining: self.config.ice_grace_time,
            })
        } else {
            self.state
                .ice_grace
                .map(|memory| IceMemory {
                    remaining: memory.remaining - dt,
                    ..memory
                })
                .filter(|memory| memory.remaining > 0.0)
        };
    }

    /// Count the launch lock down. Returns whether it is still active.
    fn tick_launch_lock(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.state.launch_lock else {
            return false;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.state.launch_lock = Some(remaining);
            true
        } else {
            self.state.launch_lock = None;
            self.log(DiagnosticLevel::Debug, format_args!("launch lock released"));
            false
        }
    }

    fn check_death_at(&mut self, position: Vec3) -> bool {
        if !self.state.is_dead && position.y < self.config.kill_plane_y {
            self.die(DeathCause::Fall);
        }
        self.state.is_dead
    }

    fn die(&mut self, cause: DeathCause) {
        if self.state.is_dead {
            return;
        }
        self.state.is_dead = true;
        self.state.launch_lock = None;
        self.jump_requested = false;
        let attacker = self.state.last_hit_by;
        self.events.push(LocomotionEvent::Death { cause, attacker });
        self.log(
            DiagnosticLevel::Info,
            format_args!("died ({cause:?}), last hit by {attacker:?}"),
        );
    }

    fn log_phase_change(&self, previous: JumpPhase, next: JumpPhase) {
        match (previous, next) {
            (
                JumpPhase::Ascending { .. } | JumpPhase::Falling | JumpPhase::Airborne,
                JumpPhase::Grounded,
            ) => {
                self.log(DiagnosticLevel::Debug, format_args!("landed"));
            }
            (JumpPhase::Grounded, JumpPhase::CoyoteWindow { .. }) => {
                self.log(
                    DiagnosticLevel::Trace,
                    format_args!(
                        "left ground, coyote {:.2}s",
                        next.coyote_remaining(self.config.coyote_time)
                    ),
                );
            }
            (JumpPhase::CoyoteWindow { .. }, JumpPhase::Airborne) if !self.state.grounded => {
                self.log(DiagnosticLevel::Trace, format_args!("coyote expired"));
            }
            _ => {}
        }
    }

    fn refresh_animation(&mut self) {
        let inputs = AnimationInputs::from(&self.state);
        self.animation = animation::select(&inputs, self.config.run_speed_threshold);
    }

    fn log(&self, level: DiagnosticLevel, message: fmt::Arguments<'_>) {
        self.diagnostics.record(level, self.body, message);
    }
}
