//! Integration tests against a real Rapier3D world.
//!
//! Only built with the `rapier3d` feature.

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy::time::Virtual;
use bevy_rapier3d::prelude::*;
use platformer_locomotion::prelude::*;
use platformer_locomotion::prelude::Trigger;
use platformer_locomotion::rapier::RapierPhysics;

fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(LocomotionPlugin::<Rapier3dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));

    app.finish();
    app.cleanup();
    app
}

fn spawn_ground(app: &mut App, surface: Surface) -> Entity {
    let transform = Transform::from_xyz(0.0, -0.5, 0.0);
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(50.0, 0.5, 50.0),
            surface,
        ))
        .id()
}

fn spawn_character(app: &mut App, position: Vec3) -> Entity {
    let config = LocomotionConfig::default();
    let transform = Transform::from_translation(position);
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            config,
            LocomotionInput::default(),
            Rapier3dCharacterBundle::default(),
            // Half height 0.5 + radius 0.4 = foot offset 0.9
            Collider::capsule_y(0.5, 0.4),
        ))
        .id()
}

/// Run one physics step.
fn tick(app: &mut App) {
    let timestep = std::time::Duration::from_secs_f64(1.0 / 60.0);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .advance_by(timestep);
    app.update();
    app.world_mut().run_schedule(FixedUpdate);
    app.update();
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

fn controller(app: &App, entity: Entity) -> &LocomotionController {
    app.world()
        .get::<LocomotionController>(entity)
        .expect("controller attached")
}

fn velocity(app: &App, entity: Entity) -> Vec3 {
    app.world()
        .get::<Velocity>(entity)
        .map(|v| v.linvel)
        .unwrap_or_default()
}

#[test]
fn character_lands_and_becomes_grounded() {
    let mut app = create_test_app();
    spawn_ground(&mut app, Surface::Normal);
    let character = spawn_character(&mut app, Vec3::new(0.0, 2.0, 0.0));

    run_frames(&mut app, 120);

    let state = controller(&app, character).state();
    assert!(state.grounded, "character should rest on the ground");
    assert_eq!(state.surface, SurfaceKind::Normal);
    assert_eq!(state.jump_phase, JumpPhase::Grounded);
}

#[test]
fn walking_sets_horizontal_velocity() {
    let mut app = create_test_app();
    spawn_ground(&mut app, Surface::Normal);
    let character = spawn_character(&mut app, Vec3::new(0.0, 1.0, 0.0));
    run_frames(&mut app, 60);

    if let Some(mut input) = app.world_mut().get_mut::<LocomotionInput>(character) {
        input.set_move(Vec2::new(0.0, 1.0));
    }
    run_frames(&mut app, 10);

    let v = velocity(&app, character);
    assert!(v.z < -3.0, "character should move forward (-Z), got {v}");
}

#[test]
fn jump_leaves_the_ground() {
    let mut app = create_test_app();
    spawn_ground(&mut app, Surface::Normal);
    let character = spawn_character(&mut app, Vec3::new(0.0, 1.0, 0.0));
    run_frames(&mut app, 60);
    let start_y = app
        .world()
        .get::<Transform>(character)
        .map(|t| t.translation.y)
        .unwrap_or_default();

    if let Some(mut input) = app.world_mut().get_mut::<LocomotionInput>(character) {
        input.set_jump_held(true);
    }
    run_frames(&mut app, 10);

    let y = app
        .world()
        .get::<Transform>(character)
        .map(|t| t.translation.y)
        .unwrap_or_default();
    assert!(y > start_y + 0.3, "character should rise, {start_y} -> {y}");
    assert!(!controller(&app, character).state().grounded);
}

#[test]
fn ice_surface_is_detected() {
    let mut app = create_test_app();
    spawn_ground(&mut app, Surface::Ice);
    let character = spawn_character(&mut app, Vec3::new(0.0, 1.0, 0.0));
    run_frames(&mut app, 60);

    assert_eq!(controller(&app, character).state().surface, SurfaceKind::Ice);
}

#[test]
fn launcher_trigger_through_rapier_world() {
    let mut app = create_test_app();
    spawn_ground(&mut app, Surface::Normal);
    let character = spawn_character(&mut app, Vec3::new(0.0, 1.0, 0.0));
    run_frames(&mut app, 30);

    let launch = Vec3::new(0.0, 12.0, 0.0);
    let fire = move |mut physics: RapierPhysics, mut q: Query<&mut LocomotionController>| {
        for mut controller in &mut q {
            physics.with_world(|world| {
                controller.on_trigger(world, Trigger::Launcher { velocity: launch })
            });
        }
    };
    app.world_mut()
        .run_system_once(fire)
        .expect("system should run");

    assert!(controller(&app, character).is_launched());
    assert_eq!(velocity(&app, character), launch);
}
