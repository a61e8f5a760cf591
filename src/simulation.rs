//! Simulation driver: owns the loaded scene, the physics world and the
//! step/collision/frame-rate bookkeeping.
//!
//! Lifecycle: `Unloaded -> Loaded -> Stepping -> Stopped -> Drop`. A
//! [`Simulation`] is constructed empty, populated once by [`Simulation::load_file`]
//! and advanced by [`Simulation::step`] at a fixed interval. The surrounding
//! application loop serializes stepping and drawing; nothing here is thread
//! safe and nothing needs to be.
//!
//! There is no global simulation instance. The shell constructs one and
//! passes it to whoever needs it.

use std::path::Path;

use cgmath::{Matrix4, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};
use instant::Instant;
use log::{debug, warn};

use crate::framerate::FrameRateEstimator;
use crate::graphics::GraphicsContext;
use crate::parser::{self, LoadError};
use crate::physics::collision::{CollisionDispatcher, SharedListener};
use crate::physics::PhysicsWorld;
use crate::scene::graphical::DrawPass;
use crate::scene::{GeometryId, Scene};

/// The simulation of one scene: element tree, solver world and counters.
pub struct Simulation {
    scene: Option<Scene>,
    world: Option<PhysicsWorld>,
    dispatcher: CollisionDispatcher,
    step: u32,
    simulated_time: f32,
    frame_rate: FrameRateEstimator,
}

impl Simulation {
    /// Creates an unloaded simulation.
    pub fn new() -> Self {
        Self {
            scene: None,
            world: None,
            dispatcher: CollisionDispatcher::new(),
            step: 0,
            simulated_time: 0.0,
            frame_rate: FrameRateEstimator::new(Instant::now()),
        }
    }

    /// Loads a scene description and constructs its physics world.
    ///
    /// On failure the error carries the full list of problems and the
    /// simulation stays unloaded; there is never a partially built world.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        debug_assert!(self.scene.is_none(), "scene loaded twice");
        let scene = parser::parse_file(path)?;
        self.install(scene);
        Ok(())
    }

    /// Loads a scene description from a string. See [`Simulation::load_file`].
    pub fn load_str(&mut self, text: &str) -> Result<(), LoadError> {
        debug_assert!(self.scene.is_none(), "scene loaded twice");
        let scene = parser::parse_str(text)?;
        self.install(scene);
        Ok(())
    }

    fn install(&mut self, mut scene: Scene) {
        let mut world = PhysicsWorld::new(scene.gravity.into());

        for body in &mut scene.bodies {
            let handle = world.add_body(
                body.position.into(),
                body.rotation,
                body.linear_damping,
                body.angular_damping,
            );
            body.handle = Some(handle);
            for geometry in &mut body.geometries {
                geometry.collider = Some(world.add_fixture(handle, geometry));
            }
        }
        // Static fixtures all share the anchor body.
        let anchor = world.anchor();
        for compound in &mut scene.compounds {
            for geometry in &mut compound.geometries {
                geometry.collider = Some(world.add_fixture(anchor, geometry));
            }
        }

        debug!(
            "loaded scene {:?}: {} bodies, {} compounds, step length {} s",
            scene.name,
            scene.bodies.len(),
            scene.compounds.len(),
            scene.step_length
        );

        self.scene = Some(scene);
        self.world = Some(world);
        self.dispatcher.reset();
        self.step = 0;
        self.simulated_time = 0.0;
        self.frame_rate = FrameRateEstimator::new(Instant::now());
        self.update_model_matrices();
    }

    /// Advances the simulation by one fixed step.
    ///
    /// Bumps the step counter, accumulates simulated time by the configured
    /// step length, integrates the solver for exactly that interval,
    /// dispatches the resulting contact events and refreshes the frame-rate
    /// estimate. Never feed wall-clock deltas into the step length; the fixed
    /// interval is what keeps runs deterministic.
    pub fn step(&mut self) {
        debug_assert!(self.is_loaded(), "step() before load");
        let (scene, world) = match (&self.scene, &mut self.world) {
            (Some(scene), Some(world)) => (scene, world),
            _ => {
                warn!("step() called on unloaded simulation");
                return;
            }
        };

        self.step += 1;
        self.simulated_time += scene.step_length;

        let events = world.step(
            scene.step_length,
            scene.velocity_iterations,
            scene.position_iterations,
        );
        self.dispatcher.handle(&events);

        self.frame_rate.update(Instant::now(), self.step);
    }

    /// Copies the solver body poses into the appearance placements and
    /// recomputes all model matrices. Call once per render pass, after
    /// stepping.
    pub fn update_model_matrices(&mut self) {
        let (scene, world) = match (&mut self.scene, &self.world) {
            (Some(scene), Some(world)) => (scene, world),
            _ => return,
        };
        let identity = [Matrix4::identity()];
        for body in &mut scene.bodies {
            if let Some(appearance) = &mut body.appearance {
                // The solver pose becomes the parent placement; the
                // appearance's own local offset composes on top of it.
                let parent = match body.handle.and_then(|h| world.body_pose(h)) {
                    Some((x, y, angle)) => {
                        Matrix4::from_translation(Vector3::new(x, y, 0.0))
                            * Matrix4::from(Quaternion::from_angle_z(Rad(angle)))
                    }
                    None => Matrix4::identity(),
                };
                appearance.update_model_matrices(&[parent]);
            }
        }
        for appearance in &mut scene.appearances {
            appearance.update_model_matrices(&identity);
        }
    }

    /// Creates rendering resources for every appearance in the scene.
    /// Idempotent; typically invoked lazily from the render path.
    pub fn create_graphics(&mut self, ctx: &mut dyn GraphicsContext) {
        if let Some(scene) = &mut self.scene {
            for body in &mut scene.bodies {
                if let Some(appearance) = &mut body.appearance {
                    appearance.create_graphics(ctx);
                }
            }
            for appearance in &mut scene.appearances {
                appearance.create_graphics(ctx);
            }
        }
    }

    /// Submits draw calls for the whole scene in tree order.
    pub fn draw(&self, ctx: &mut dyn GraphicsContext, pass: &DrawPass) {
        if let Some(scene) = &self.scene {
            for body in &scene.bodies {
                if let Some(appearance) = &body.appearance {
                    appearance.draw(ctx, pass);
                }
            }
            for appearance in &scene.appearances {
                appearance.draw(ctx, pass);
            }
        }
    }

    /// Registers a collision listener on one geometry. Listeners are notified
    /// synchronously during [`Simulation::step`].
    pub fn register_collision_listener(&mut self, geometry: GeometryId, listener: SharedListener) {
        self.dispatcher.register(geometry, listener);
    }

    /// Removes a previously registered collision listener.
    pub fn unregister_collision_listener(
        &mut self,
        geometry: GeometryId,
        listener: &SharedListener,
    ) {
        self.dispatcher.unregister(geometry, listener);
    }

    /// Reports every scene object to the shell, parent name first, so the
    /// shell can register them for display and selection.
    pub fn register_objects(&self, sink: &mut dyn FnMut(&str, Option<&str>)) {
        if let Some(scene) = &self.scene {
            sink(&scene.name, None);
            for body in &scene.bodies {
                sink(&body.name, Some(&scene.name));
            }
            for compound in &scene.compounds {
                sink(&compound.name, Some(&scene.name));
            }
            for appearance in &scene.appearances {
                sink(&appearance.name, Some(&scene.name));
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.scene.is_some()
    }

    /// Number of executed simulation steps since load.
    pub fn step_count(&self) -> u32 {
        self.step
    }

    /// Simulated elapsed time in seconds (step count times step length).
    pub fn simulated_time(&self) -> f32 {
        self.simulated_time
    }

    /// Number of currently overlapping fixture pairs.
    pub fn collision_count(&self) -> u32 {
        self.dispatcher.collision_count()
    }

    /// Smoothed steps/second estimate.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate.rate()
    }

    /// The loaded scene, if any.
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// The solver world of the loaded scene, if any.
    pub fn world(&self) -> Option<&PhysicsWorld> {
        self.world.as_ref()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
