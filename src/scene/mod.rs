//! Scene element tree: the ownership graph of all parsed simulation entities.
//!
//! The tree is built incrementally while a scene file is parsed. Every node is
//! attached to its parent exactly once through a tagged-variant `attach`
//! operation: the parent matches on the child's kind and stores it in the
//! correct typed slot or ordered list. Attaching to an occupied single-valued
//! slot is a parser bug and trips a debug assertion; in release builds the
//! first occupant wins.
//!
//! # Node kinds
//!
//! - [`Scene`] is the root: physics configuration plus bodies, compounds and
//!   free-standing appearances
//! - [`Body`] is a named dynamic rigid body with fixtures and an optional
//!   appearance
//! - [`Compound`] is a set of static fixtures attached to the world's anchor body
//! - [`Geometry`] is one physics fixture (circle or rectangle)
//!
//! Ownership is by value: dropping the scene tears down the whole graph,
//! children before the root.

pub mod geometry;
pub mod graphical;

use cgmath::Vector2;
use rapier2d::dynamics::RigidBodyHandle;
use rapier2d::geometry::ColliderHandle;

use crate::scene::graphical::ComplexAppearance;

/// Stable id of a physics fixture, assigned by the parser in document order.
///
/// Carried through the solver as opaque collider user data and resolved back
/// by the collision dispatcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u32);

/// Shape of a physics fixture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

/// One physics fixture belonging to a body or compound.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub id: GeometryId,
    pub shape: ShapeKind,
    /// Offset from the owning body's origin.
    pub offset: Vector2<f32>,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub(crate) collider: Option<ColliderHandle>,
}

impl Geometry {
    pub fn new(id: GeometryId, shape: ShapeKind) -> Self {
        Self {
            id,
            shape,
            offset: Vector2::new(0.0, 0.0),
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            collider: None,
        }
    }

    /// Solver-side collider of this fixture, once physics has been created.
    pub fn collider(&self) -> Option<ColliderHandle> {
        self.collider
    }
}

/// Child kinds accepted by a [`Body`].
pub enum BodyElement {
    Geometry(Geometry),
    Appearance(ComplexAppearance),
}

/// A named dynamic rigid body.
#[derive(Debug)]
pub struct Body {
    pub name: String,
    pub position: Vector2<f32>,
    /// Rotation about the z axis in radians.
    pub rotation: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub geometries: Vec<Geometry>,
    pub appearance: Option<ComplexAppearance>,
    pub(crate) handle: Option<RigidBodyHandle>,
}

impl Body {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vector2::new(0.0, 0.0),
            rotation: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            geometries: Vec::new(),
            appearance: None,
            handle: None,
        }
    }

    /// Registers a child element on this body.
    pub fn attach(&mut self, child: BodyElement) {
        match child {
            BodyElement::Geometry(geometry) => self.geometries.push(geometry),
            BodyElement::Appearance(appearance) => {
                debug_assert!(self.appearance.is_none(), "body appearance attached twice");
                if self.appearance.is_none() {
                    self.appearance = Some(appearance);
                }
            }
        }
    }

    /// Solver-side rigid body, once physics has been created.
    pub fn handle(&self) -> Option<RigidBodyHandle> {
        self.handle
    }
}

/// A set of static fixtures. Its colliders attach to the world's anchor body.
#[derive(Clone, Debug)]
pub struct Compound {
    pub name: String,
    pub geometries: Vec<Geometry>,
}

impl Compound {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometries: Vec::new(),
        }
    }

    pub fn attach(&mut self, geometry: Geometry) {
        self.geometries.push(geometry);
    }
}

/// Child kinds accepted by the [`Scene`] root.
pub enum SceneElement {
    Body(Body),
    Compound(Compound),
    Appearance(ComplexAppearance),
}

/// Root of the scene element tree plus the physics configuration read from
/// the scene file header.
#[derive(Debug)]
pub struct Scene {
    pub name: String,
    /// Fixed solver step length in seconds. Constant for determinism.
    pub step_length: f32,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    pub gravity: Vector2<f32>,
    pub bodies: Vec<Body>,
    pub compounds: Vec<Compound>,
    /// Free-standing scenery appearances without a physics body.
    pub appearances: Vec<ComplexAppearance>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step_length: 0.01,
            velocity_iterations: 8,
            position_iterations: 3,
            gravity: Vector2::new(0.0, 0.0),
            bodies: Vec::new(),
            compounds: Vec::new(),
            appearances: Vec::new(),
        }
    }

    /// Registers a child element on the scene root.
    pub fn attach(&mut self, child: SceneElement) {
        match child {
            SceneElement::Body(body) => self.bodies.push(body),
            SceneElement::Compound(compound) => self.compounds.push(compound),
            SceneElement::Appearance(appearance) => self.appearances.push(appearance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_sorts_children_into_typed_slots() {
        let mut scene = Scene::new("test");
        let mut body = Body::new("bot");
        body.attach(BodyElement::Geometry(Geometry::new(
            GeometryId(0),
            ShapeKind::Circle { radius: 0.1 },
        )));
        body.attach(BodyElement::Appearance(ComplexAppearance::new("hull")));
        scene.attach(SceneElement::Body(body));

        let mut compound = Compound::new("walls");
        compound.attach(Geometry::new(
            GeometryId(1),
            ShapeKind::Rect {
                width: 1.0,
                height: 0.1,
            },
        ));
        scene.attach(SceneElement::Compound(compound));

        assert_eq!(scene.bodies.len(), 1);
        assert_eq!(scene.bodies[0].geometries.len(), 1);
        assert!(scene.bodies[0].appearance.is_some());
        assert_eq!(scene.compounds.len(), 1);
    }
}
