//! Shared test helpers: a tiny deterministic physics world.
//!
//! Characters are vertical capsules reduced to a foot point and a horizontal
//! radius. Floors are axis-aligned boxes, walls infinite vertical planes.
//! `step` integrates forces and gravity, resolves penetration and records the
//! contacts the next controller update will see.

#![allow(dead_code)]

use std::collections::HashMap;

use bevy::prelude::*;
use platformer_locomotion::prelude::*;

pub const DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub angular_velocity: Vec3,
    pub force: Vec3,
    pub mass: f32,
    pub foot_offset: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Floor {
    pub entity: Entity,
    pub min: Vec3,
    pub max: Vec3,
    pub surface: SurfaceKind,
    pub platform_velocity: Option<Vec3>,
}

#[derive(Debug, Clone, Copy)]
pub struct Wall {
    pub entity: Entity,
    pub point: Vec3,
    /// Horizontal, pointing into the open side.
    pub normal: Vec3,
}

#[derive(Resource, Debug)]
pub struct MockWorld {
    pub bodies: HashMap<Entity, Body>,
    pub floors: Vec<Floor>,
    pub walls: Vec<Wall>,
    pub gravity: f32,
    /// Contacts from the last `step` or `refresh_contacts`.
    pub contacts: HashMap<Entity, Vec<ContactData>>,
    /// Contacts reported on top of the simulated ones.
    pub scripted_contacts: HashMap<Entity, Vec<ContactData>>,
    pub tags: HashMap<Entity, SurfaceKind>,
    next_id: u32,
}

impl Default for MockWorld {
    fn default() -> Self {
        Self {
            bodies: HashMap::new(),
            floors: Vec::new(),
            walls: Vec::new(),
            gravity: -20.0,
            contacts: HashMap::new(),
            scripted_contacts: HashMap::new(),
            tags: HashMap::new(),
            // Clear of entities allocated by a Bevy world in the same test
            next_id: 10_000,
        }
    }
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_gravity() -> Self {
        Self {
            gravity: 0.0,
            ..Self::default()
        }
    }

    fn next_entity(&mut self) -> Entity {
        let entity = Entity::from_raw(self.next_id);
        self.next_id += 1;
        entity
    }

    /// Spawn a character body with the geometry of `config`.
    pub fn spawn_body(&mut self, position: Vec3, config: &LocomotionConfig) -> Entity {
        let entity = self.next_entity();
        self.insert_body(entity, position, config);
        entity
    }

    /// Register a body under an entity allocated elsewhere.
    pub fn insert_body(&mut self, entity: Entity, position: Vec3, config: &LocomotionConfig) {
        self.bodies.insert(
            entity,
            Body {
                position,
                velocity: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                angular_velocity: Vec3::ZERO,
                force: Vec3::ZERO,
                mass: 1.0,
                foot_offset: config.foot_offset,
                radius: config.body_radius,
            },
        );
    }

    /// Add a floor box whose top face is at `top`.
    pub fn add_floor(&mut self, center: Vec2, half_extent: Vec2, top: f32, surface: SurfaceKind) -> Entity {
        let entity = self.next_entity();
        self.floors.push(Floor {
            entity,
            min: Vec3::new(center.x - half_extent.x, top - 1.0, center.y - half_extent.y),
            max: Vec3::new(center.x + half_extent.x, top, center.y + half_extent.y),
            surface,
            platform_velocity: None,
        });
        entity
    }

    /// Large flat floor at y = 0.
    pub fn add_ground(&mut self, surface: SurfaceKind) -> Entity {
        self.add_floor(Vec2::ZERO, Vec2::splat(100.0), 0.0, surface)
    }

    pub fn add_platform(&mut self, center: Vec2, half_extent: Vec2, top: f32, velocity: Vec3) -> Entity {
        let entity = self.add_floor(center, half_extent, top, SurfaceKind::Normal);
        if let Some(floor) = self.floors.iter_mut().find(|f| f.entity == entity) {
            floor.platform_velocity = Some(velocity);
        }
        entity
    }

    pub fn add_wall(&mut self, point: Vec3, normal: Vec3) -> Entity {
        let entity = self.next_entity();
        self.walls.push(Wall {
            entity,
            point,
            normal: Vec3::new(normal.x, 0.0, normal.z).normalize(),
        });
        entity
    }

    /// Register a surface tag for an entity that has no geometry.
    pub fn tag(&mut self, surface: SurfaceKind) -> Entity {
        let entity = self.next_entity();
        self.tags.insert(entity, surface);
        entity
    }

    pub fn remove_floors(&mut self) {
        self.floors.clear();
        self.contacts.clear();
    }

    pub fn body(&self, entity: Entity) -> &Body {
        &self.bodies[&entity]
    }

    pub fn body_mut(&mut self, entity: Entity) -> &mut Body {
        self.bodies.get_mut(&entity).expect("unknown body")
    }

    /// Advance the simulation by `dt`.
    pub fn step(&mut self, dt: f32) {
        for floor in &mut self.floors {
            if let Some(velocity) = floor.platform_velocity {
                floor.min += velocity * dt;
                floor.max += velocity * dt;
            }
        }

        for body in self.bodies.values_mut() {
            let acceleration = body.force / body.mass + Vec3::Y * self.gravity;
            body.velocity += acceleration * dt;
            body.force = Vec3::ZERO;
            body.position += body.velocity * dt;
        }

        self.refresh_contacts();
    }

    /// Resolve penetration and rebuild contacts without integrating.
    pub fn refresh_contacts(&mut self) {
        self.contacts.clear();
        let entities: Vec<Entity> = self.bodies.keys().copied().collect();
        for entity in entities {
            let mut contacts = Vec::new();
            let Some(body) = self.bodies.get_mut(&entity) else {
                continue;
            };

            for floor in &self.floors {
                let inside = body.position.x >= floor.min.x
                    && body.position.x <= floor.max.x
                    && body.position.z >= floor.min.z
                    && body.position.z <= floor.max.z;
                if !inside {
                    continue;
                }
                let foot = body.position.y - body.foot_offset;
                let top = floor.max.y;
                if foot <= top + 0.01 && foot >= top - 0.5 {
                    if foot < top {
                        body.position.y = top + body.foot_offset;
                    }
                    if body.velocity.y < 0.0 {
                        body.velocity.y = 0.0;
                    }
                    contacts.push(ContactData::new(
                        Vec3::Y,
                        Vec3::new(body.position.x, top, body.position.z),
                        floor.entity,
                    ));
                }
            }

            for wall in &self.walls {
                let distance = (body.position - wall.point).dot(wall.normal) - body.radius;
                if distance < 0.01 {
                    if distance < 0.0 {
                        body.position -= wall.normal * distance;
                    }
                    let into = body.velocity.dot(wall.normal);
                    if into < 0.0 {
                        body.velocity -= wall.normal * into;
                    }
                    contacts.push(ContactData::new(
                        wall.normal,
                        body.position - wall.normal * body.radius,
                        wall.entity,
                    ));
                }
            }

            self.contacts.insert(entity, contacts);
        }
    }

    /// Run `controller` for one tick and then step the world.
    pub fn tick(&mut self, controller: &mut LocomotionController) {
        controller.update(self, DT);
        self.step(DT);
    }

    fn surface_of(&self, entity: Entity) -> Option<SurfaceKind> {
        if let Some(surface) = self.tags.get(&entity) {
            return Some(*surface);
        }
        if let Some(floor) = self.floors.iter().find(|f| f.entity == entity) {
            return Some(floor.surface);
        }
        self.walls
            .iter()
            .any(|w| w.entity == entity)
            .then_some(SurfaceKind::Normal)
    }
}

impl PhysicsWorld for MockWorld {
    fn for_each_contact(&self, body: Entity, visit: &mut dyn FnMut(ContactData)) {
        let simulated = self.contacts.get(&body).into_iter().flatten();
        let scripted = self.scripted_contacts.get(&body).into_iter().flatten();
        for contact in simulated.chain(scripted) {
            visit(*contact);
        }
    }

    fn raycast_closest(&self, origin: Vec3, target: Vec3, exclude: Entity) -> Option<CollisionData> {
        let delta = target - origin;
        let length = delta.length();
        if length <= f32::EPSILON {
            return None;
        }
        let direction = delta / length;

        let mut best: Option<CollisionData> = None;
        let mut consider = |distance: f32, normal: Vec3, entity: Entity| {
            if entity == exclude || !(0.0..=length).contains(&distance) {
                return;
            }
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(CollisionData::new(
                    distance,
                    normal,
                    origin + direction * distance,
                    Some(entity),
                ));
            }
        };

        for floor in &self.floors {
            if let Some((distance, normal)) = ray_box(origin, direction, floor.min, floor.max) {
                consider(distance, normal, floor.entity);
            }
        }
        for wall in &self.walls {
            let denom = direction.dot(wall.normal);
            if denom >= 0.0 {
                continue;
            }
            let distance = (wall.point - origin).dot(wall.normal) / denom;
            consider(distance, wall.normal, wall.entity);
        }

        best
    }

    fn surface(&self, body: Entity) -> SurfaceKind {
        self.surface_of(body).unwrap_or(SurfaceKind::Normal)
    }

    fn platform_velocity(&self, body: Entity) -> Option<Vec3> {
        self.floors
            .iter()
            .find(|f| f.entity == body)
            .and_then(|f| f.platform_velocity)
    }

    fn position(&self, body: Entity) -> Vec3 {
        self.bodies.get(&body).map_or(Vec3::ZERO, |b| b.position)
    }

    fn set_position(&mut self, body: Entity, position: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.position = position;
        }
    }

    fn velocity(&self, body: Entity) -> Vec3 {
        self.bodies.get(&body).map_or(Vec3::ZERO, |b| b.velocity)
    }

    fn set_velocity(&mut self, body: Entity, velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: Entity, angular_velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.angular_velocity = angular_velocity;
        }
    }

    fn rotation(&self, body: Entity) -> Quat {
        self.bodies.get(&body).map_or(Quat::IDENTITY, |b| b.rotation)
    }

    fn set_rotation(&mut self, body: Entity, rotation: Quat) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.rotation = rotation;
        }
    }

    fn apply_force(&mut self, body: Entity, force: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.force += force;
        }
    }

    fn mass(&self, body: Entity) -> f32 {
        self.bodies.get(&body).map_or(1.0, |b| b.mass)
    }
}

/// Slab test. Returns the entry distance and face normal.
fn ray_box(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let (near, far, sign) = if d > 0.0 {
            ((min[axis] - o) / d, (max[axis] - o) / d, -1.0)
        } else {
            ((max[axis] - o) / d, (min[axis] - o) / d, 1.0)
        };
        if near > t_min {
            t_min = near;
            normal = Vec3::ZERO;
            normal[axis] = sign;
        }
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }

    (t_min >= 0.0).then_some((t_min, normal))
}

/// A character standing on a floor at y = 0.
pub fn standing_on(surface: SurfaceKind, config: LocomotionConfig) -> (MockWorld, LocomotionController) {
    let mut world = MockWorld::new();
    world.add_ground(surface);
    let spawn = Vec3::new(0.0, config.foot_offset, 0.0);
    let body = world.spawn_body(spawn, &config);
    world.step(DT);
    let controller = LocomotionController::new(body, config)
        .with_spawn_position(spawn)
        .with_diagnostics(Box::new(NullSink));
    (world, controller)
}

pub fn press_jump(controller: &mut LocomotionController) {
    let mut input = *controller.input();
    input.set_jump_held(true);
    controller.set_input(input);
}

pub fn release_jump(controller: &mut LocomotionController) {
    let mut input = *controller.input();
    input.set_jump_held(false);
    controller.set_input(input);
}

pub fn set_move(controller: &mut LocomotionController, axis: Vec2) {
    let mut input = *controller.input();
    input.set_move(axis);
    controller.set_input(input);
}

pub fn horizontal(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}
