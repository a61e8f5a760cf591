//! Physics world: owns the rapier2d solver state and the static anchor body.
//!
//! The simulation core wraps and sequences the solver, it never integrates
//! anything itself. One [`PhysicsWorld`] exists per loaded scene. Bodies and
//! fixtures are created from the parsed element tree; every collider carries
//! its [`GeometryId`] as opaque user data so contact events can be resolved
//! back to the owning scene geometry.
//!
//! Stepping is strictly fixed-interval: the caller passes the scene's
//! configured step length, never a wall-clock delta, which keeps runs
//! deterministic and replayable.

pub mod collision;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use rapier2d::prelude::*;

use crate::scene::{Geometry, GeometryId, ShapeKind};

/// A contact event resolved to scene geometry ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContactEvent {
    Began(GeometryId, GeometryId),
    Ended(GeometryId, GeometryId),
}

/// Collects raw solver collision events during a step.
///
/// The solver requires a `Send + Sync` handler; the mutex is uncontended
/// because stepping is single-threaded.
#[derive(Default)]
struct ContactEventSink {
    events: Mutex<Vec<CollisionEvent>>,
}

impl EventHandler for ContactEventSink {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.events.lock().unwrap().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// The solver world of one loaded scene.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    events: ContactEventSink,
    anchor: RigidBodyHandle,
    geometry_of: HashMap<ColliderHandle, GeometryId>,
}

impl PhysicsWorld {
    /// Creates a world with the given gravity and the static anchor body that
    /// all compound fixtures attach to.
    pub fn new(gravity: [f32; 2]) -> Self {
        let mut bodies = RigidBodySet::new();
        let anchor = bodies.insert(RigidBodyBuilder::fixed().build());
        Self {
            gravity: vector![gravity[0], gravity[1]],
            bodies,
            colliders: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            events: ContactEventSink::default(),
            anchor,
            geometry_of: HashMap::new(),
        }
    }

    /// The fixed reference body for fixtures that never move.
    pub fn anchor(&self) -> RigidBodyHandle {
        self.anchor
    }

    /// Creates a dynamic rigid body.
    pub fn add_body(
        &mut self,
        position: [f32; 2],
        rotation: f32,
        linear_damping: f32,
        angular_damping: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1]])
            .rotation(rotation)
            .linear_damping(linear_damping)
            .angular_damping(angular_damping)
            .build();
        self.bodies.insert(body)
    }

    /// Creates the solver fixture for a scene geometry on the given body and
    /// records the reverse mapping for event resolution.
    pub fn add_fixture(&mut self, parent: RigidBodyHandle, geometry: &Geometry) -> ColliderHandle {
        let builder = match geometry.shape {
            ShapeKind::Circle { radius } => ColliderBuilder::ball(radius),
            ShapeKind::Rect { width, height } => {
                ColliderBuilder::cuboid(width / 2.0, height / 2.0)
            }
        };
        let collider = builder
            .translation(vector![geometry.offset.x, geometry.offset.y])
            .density(geometry.density)
            .friction(geometry.friction)
            .restitution(geometry.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(geometry.id.0 as u128)
            .build();
        let handle = self
            .colliders
            .insert_with_parent(collider, parent, &mut self.bodies);
        self.geometry_of.insert(handle, geometry.id);
        handle
    }

    /// Current pose of a body as `(x, y, rotation)`.
    pub fn body_pose(&self, handle: RigidBodyHandle) -> Option<(f32, f32, f32)> {
        self.bodies.get(handle).map(|body| {
            let pos = body.position();
            (pos.translation.x, pos.translation.y, pos.rotation.angle())
        })
    }

    /// Integrates one fixed interval and returns the contact events it
    /// produced, resolved to geometry ids, in solver order.
    pub fn step(
        &mut self,
        step_length: f32,
        velocity_iterations: usize,
        position_iterations: usize,
    ) -> Vec<ContactEvent> {
        let mut parameters = IntegrationParameters::default();
        parameters.dt = step_length;
        parameters.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations).unwrap_or(NonZeroUsize::MIN);
        parameters.num_internal_pgs_iterations = position_iterations.max(1);

        self.pipeline.step(
            &self.gravity,
            &parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &self.events,
        );

        let raw = std::mem::take(&mut *self.events.events.lock().unwrap());
        raw.into_iter()
            .filter_map(|event| self.resolve(event))
            .collect()
    }

    fn resolve(&self, event: CollisionEvent) -> Option<ContactEvent> {
        match event {
            CollisionEvent::Started(a, b, _) => Some(ContactEvent::Began(
                *self.geometry_of.get(&a)?,
                *self.geometry_of.get(&b)?,
            )),
            CollisionEvent::Stopped(a, b, _) => Some(ContactEvent::Ended(
                *self.geometry_of.get(&a)?,
                *self.geometry_of.get(&b)?,
            )),
        }
    }
}
