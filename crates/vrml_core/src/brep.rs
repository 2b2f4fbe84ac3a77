//! Minimal faceted boundary representation.
//!
//! A [`Shape`] is a shared topological core ([`TShape`]) placed by a location
//! matrix. Copies of a shape share the core, so the core's address is the
//! shape's identity; [`AppearanceMap`] keys on it.

use std::collections::HashMap;
use std::sync::Arc;

use vrml_math::{Aabb, DMat4, DVec3};

use crate::node::NodeId;

/// Topological core of a shape.
#[derive(Debug, Clone)]
pub enum TShape {
    /// Planar polygon, vertices in loop order.
    Face(Vec<DVec3>),
    /// Open polyline.
    Wire(Vec<DVec3>),
    /// Connected faces.
    Shell(Vec<Shape>),
    /// Any collection of shapes.
    Compound(Vec<Shape>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Face,
    Wire,
    Shell,
    Compound,
}

/// A located reference to a topological core.
#[derive(Debug, Clone)]
pub struct Shape {
    tshape: Arc<TShape>,
    location: DMat4,
}

impl Shape {
    fn from_tshape(tshape: TShape) -> Self {
        Self {
            tshape: Arc::new(tshape),
            location: DMat4::IDENTITY,
        }
    }

    pub fn face(points: Vec<DVec3>) -> Self {
        Self::from_tshape(TShape::Face(points))
    }

    pub fn wire(points: Vec<DVec3>) -> Self {
        Self::from_tshape(TShape::Wire(points))
    }

    pub fn shell(faces: Vec<Shape>) -> Self {
        Self::from_tshape(TShape::Shell(faces))
    }

    pub fn compound(parts: Vec<Shape>) -> Self {
        Self::from_tshape(TShape::Compound(parts))
    }

    pub fn tshape(&self) -> &TShape {
        &self.tshape
    }

    pub fn kind(&self) -> ShapeKind {
        match *self.tshape {
            TShape::Face(_) => ShapeKind::Face,
            TShape::Wire(_) => ShapeKind::Wire,
            TShape::Shell(_) => ShapeKind::Shell,
            TShape::Compound(_) => ShapeKind::Compound,
        }
    }

    pub fn location(&self) -> DMat4 {
        self.location
    }

    /// The same core moved by `placement` (applied after the current
    /// location).
    pub fn located(&self, placement: DMat4) -> Shape {
        Shape {
            tshape: Arc::clone(&self.tshape),
            location: placement * self.location,
        }
    }

    /// True when both shapes share one core, whatever their locations.
    pub fn is_same(&self, other: &Shape) -> bool {
        Arc::ptr_eq(&self.tshape, &other.tshape)
    }

    /// Direct sub-shapes of a shell or compound.
    pub fn children(&self) -> &[Shape] {
        match &*self.tshape {
            TShape::Shell(parts) | TShape::Compound(parts) => parts,
            TShape::Face(_) | TShape::Wire(_) => &[],
        }
    }

    /// All faces below this shape, located in this shape's frame.
    pub fn faces(&self) -> Vec<Shape> {
        match &*self.tshape {
            TShape::Face(_) => vec![self.clone()],
            TShape::Wire(_) => Vec::new(),
            TShape::Shell(parts) | TShape::Compound(parts) => parts
                .iter()
                .flat_map(|part| part.located(self.location).faces())
                .collect(),
        }
    }

    pub fn face_count(&self) -> usize {
        match &*self.tshape {
            TShape::Face(_) => 1,
            TShape::Wire(_) => 0,
            TShape::Shell(parts) | TShape::Compound(parts) => {
                parts.iter().map(Shape::face_count).sum()
            }
        }
    }

    pub fn wire_count(&self) -> usize {
        match &*self.tshape {
            TShape::Wire(_) => 1,
            TShape::Face(_) => 0,
            TShape::Shell(parts) | TShape::Compound(parts) => {
                parts.iter().map(Shape::wire_count).sum()
            }
        }
    }

    /// Bounding box of all located vertices.
    pub fn bounds(&self) -> Aabb {
        match &*self.tshape {
            TShape::Face(points) | TShape::Wire(points) => points
                .iter()
                .fold(Aabb::EMPTY, |aabb, &p| {
                    aabb.include_point(self.location.transform_point3(p))
                }),
            TShape::Shell(parts) | TShape::Compound(parts) => parts
                .iter()
                .map(|part| part.located(self.location).bounds())
                .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b)),
        }
    }
}

/// Identity key of a shape's core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoreKey(usize);

impl CoreKey {
    fn of(shape: &Shape) -> Self {
        CoreKey(Arc::as_ptr(&shape.tshape) as usize)
    }
}

/// Appearance node bound to each sub-shape core.
///
/// The map keeps a clone of every bound shape so that a core cannot be
/// freed and its address reused while the binding exists.
#[derive(Debug, Clone, Default)]
pub struct AppearanceMap {
    bindings: HashMap<CoreKey, (Shape, NodeId)>,
}

impl AppearanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, shape: &Shape, appearance: NodeId) {
        self.bindings
            .insert(CoreKey::of(shape), (shape.clone(), appearance));
    }

    /// Appearance bound to `shape`'s core, at any location.
    pub fn get(&self, shape: &Shape) -> Option<NodeId> {
        self.bindings.get(&CoreKey::of(shape)).map(|(_, id)| *id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Shape, NodeId)> {
        self.bindings.values().map(|(shape, id)| (shape, *id))
    }
}
