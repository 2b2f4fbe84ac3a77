//! Primitive geometry nodes: Box, Cone, Cylinder, Sphere.
//!
//! Primitives are centred at the origin with their axis along +Y, and are
//! converted to faceted shells when a shape is extracted.

use std::f64::consts::{PI, TAU};
use std::io::BufRead;

use vrml_math::DVec3;

use super::{differs, unknown_field};
use crate::brep::Shape;
use crate::error::VrmlResult;
use crate::io::import::Importer;
use crate::io::writer::WriteSession;

/// Facets around the axis of round primitives.
const SEGMENTS: usize = 24;
/// Latitude bands of a sphere.
const STACKS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct BoxNode {
    pub size: DVec3,
}

impl Default for BoxNode {
    fn default() -> Self {
        Self {
            size: DVec3::splat(2.0),
        }
    }
}

impl BoxNode {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "size" => self.size = imp.reader().read_vec3(true, true)?,
            _ => return Err(unknown_field("Box", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Box")?;
        if (self.size - DVec3::splat(2.0)).length_squared() > vrml_math::CONFUSION {
            w.write_vec3("size", self.size, true)?;
        }
        w.end_node()
    }

    pub fn shape(&self) -> Option<Shape> {
        let h = self.size * 0.5;
        let corner = |x: f64, y: f64, z: f64| DVec3::new(x * h.x, y * h.y, z * h.z);
        let quads = [
            [(-1., -1., 1.), (1., -1., 1.), (1., 1., 1.), (-1., 1., 1.)],
            [(1., -1., -1.), (-1., -1., -1.), (-1., 1., -1.), (1., 1., -1.)],
            [(1., -1., 1.), (1., -1., -1.), (1., 1., -1.), (1., 1., 1.)],
            [(-1., -1., -1.), (-1., -1., 1.), (-1., 1., 1.), (-1., 1., -1.)],
            [(-1., 1., 1.), (1., 1., 1.), (1., 1., -1.), (-1., 1., -1.)],
            [(-1., -1., -1.), (1., -1., -1.), (1., -1., 1.), (-1., -1., 1.)],
        ];
        let faces = quads
            .iter()
            .map(|quad| Shape::face(quad.iter().map(|&(x, y, z)| corner(x, y, z)).collect()))
            .collect();
        Some(Shape::shell(faces))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    pub bottom_radius: f64,
    pub height: f64,
    pub has_side: bool,
    pub has_bottom: bool,
}

impl Default for Cone {
    fn default() -> Self {
        Self {
            bottom_radius: 1.0,
            height: 2.0,
            has_side: true,
            has_bottom: true,
        }
    }
}

impl Cone {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        let reader = imp.reader();
        match field {
            "bottomRadius" => self.bottom_radius = reader.read_scalar(true, true)?,
            "height" => self.height = reader.read_scalar(true, true)?,
            "side" => self.has_side = reader.read_bool()?,
            "bottom" => self.has_bottom = reader.read_bool()?,
            _ => return Err(unknown_field("Cone", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Cone")?;
        if differs(self.bottom_radius, 1.0) {
            w.write_scalar("bottomRadius", self.bottom_radius, true)?;
        }
        if differs(self.height, 2.0) {
            w.write_scalar("height", self.height, true)?;
        }
        if !self.has_side {
            w.write_bool("side", false)?;
        }
        if !self.has_bottom {
            w.write_bool("bottom", false)?;
        }
        w.end_node()
    }

    pub fn shape(&self) -> Option<Shape> {
        let half = self.height * 0.5;
        let rim = circle(self.bottom_radius, -half);
        let apex = DVec3::new(0.0, half, 0.0);
        let mut faces = Vec::new();
        if self.has_side {
            for i in 0..SEGMENTS {
                let next = (i + 1) % SEGMENTS;
                faces.push(Shape::face(vec![rim[i], rim[next], apex]));
            }
        }
        if self.has_bottom {
            faces.push(Shape::face(rim.into_iter().rev().collect()));
        }
        shell_of(faces)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub radius: f64,
    pub height: f64,
    pub has_bottom: bool,
    pub has_side: bool,
    pub has_top: bool,
}

impl Default for Cylinder {
    fn default() -> Self {
        Self {
            radius: 1.0,
            height: 2.0,
            has_bottom: true,
            has_side: true,
            has_top: true,
        }
    }
}

impl Cylinder {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        let reader = imp.reader();
        match field {
            "radius" => self.radius = reader.read_scalar(true, true)?,
            "height" => self.height = reader.read_scalar(true, true)?,
            "bottom" => self.has_bottom = reader.read_bool()?,
            "side" => self.has_side = reader.read_bool()?,
            "top" => self.has_top = reader.read_bool()?,
            _ => return Err(unknown_field("Cylinder", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Cylinder")?;
        if differs(self.radius, 1.0) {
            w.write_scalar("radius", self.radius, true)?;
        }
        if differs(self.height, 2.0) {
            w.write_scalar("height", self.height, true)?;
        }
        if !self.has_bottom {
            w.write_bool("bottom", false)?;
        }
        if !self.has_side {
            w.write_bool("side", false)?;
        }
        if !self.has_top {
            w.write_bool("top", false)?;
        }
        w.end_node()
    }

    pub fn shape(&self) -> Option<Shape> {
        let half = self.height * 0.5;
        let bottom = circle(self.radius, -half);
        let top = circle(self.radius, half);
        let mut faces = Vec::new();
        if self.has_side {
            for i in 0..SEGMENTS {
                let next = (i + 1) % SEGMENTS;
                faces.push(Shape::face(vec![bottom[i], bottom[next], top[next], top[i]]));
            }
        }
        if self.has_bottom {
            faces.push(Shape::face(bottom.into_iter().rev().collect()));
        }
        if self.has_top {
            faces.push(Shape::face(top));
        }
        shell_of(faces)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub radius: f64,
}

impl Default for Sphere {
    fn default() -> Self {
        Self { radius: 1.0 }
    }
}

impl Sphere {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "radius" => self.radius = imp.reader().read_scalar(true, true)?,
            _ => return Err(unknown_field("Sphere", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Sphere")?;
        if differs(self.radius, 1.0) {
            w.write_scalar("radius", self.radius, true)?;
        }
        w.end_node()
    }

    pub fn shape(&self) -> Option<Shape> {
        let r = self.radius;
        // rings[0] is the south pole, rings[STACKS] the north pole
        let rings: Vec<Vec<DVec3>> = (0..=STACKS)
            .map(|j| {
                let phi = -PI / 2.0 + PI * j as f64 / STACKS as f64;
                circle(r * phi.cos(), r * phi.sin())
            })
            .collect();
        let mut faces = Vec::with_capacity(STACKS * SEGMENTS);
        for j in 0..STACKS {
            let (lower, upper) = (&rings[j], &rings[j + 1]);
            for i in 0..SEGMENTS {
                let next = (i + 1) % SEGMENTS;
                let polygon = if j == 0 {
                    vec![lower[i], upper[next], upper[i]]
                } else if j == STACKS - 1 {
                    vec![lower[i], lower[next], upper[i]]
                } else {
                    vec![lower[i], lower[next], upper[next], upper[i]]
                };
                faces.push(Shape::face(polygon));
            }
        }
        shell_of(faces)
    }
}

/// Points on a circle of `radius` in the plane `y`, counter-clockwise seen
/// from +Y.
fn circle(radius: f64, y: f64) -> Vec<DVec3> {
    (0..SEGMENTS)
        .map(|i| {
            let theta = TAU * i as f64 / SEGMENTS as f64;
            DVec3::new(radius * theta.cos(), y, -radius * theta.sin())
        })
        .collect()
}

fn shell_of(faces: Vec<Shape>) -> Option<Shape> {
    if faces.is_empty() {
        None
    } else {
        Some(Shape::shell(faces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brep::ShapeKind;

    #[test]
    fn test_box_shell() {
        let shape = BoxNode {
            size: DVec3::new(2.0, 4.0, 6.0),
        }
        .shape()
        .unwrap();
        assert_eq!(shape.kind(), ShapeKind::Shell);
        assert_eq!(shape.face_count(), 6);
        let bounds = shape.bounds();
        assert_eq!(bounds.min(), DVec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bounds.max(), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_cylinder_parts() {
        let full = Cylinder::default().shape().unwrap();
        assert_eq!(full.face_count(), SEGMENTS + 2);

        let open = Cylinder {
            has_top: false,
            has_bottom: false,
            ..Default::default()
        };
        assert_eq!(open.shape().unwrap().face_count(), SEGMENTS);

        let nothing = Cylinder {
            has_top: false,
            has_bottom: false,
            has_side: false,
            ..Default::default()
        };
        assert!(nothing.shape().is_none());
    }

    #[test]
    fn test_cone_bounds() {
        let shape = Cone::default().shape().unwrap();
        assert_eq!(shape.face_count(), SEGMENTS + 1);
        let bounds = shape.bounds();
        assert!((bounds.max().y - 1.0).abs() < 1e-12);
        assert!((bounds.min().y + 1.0).abs() < 1e-12);
        assert!((bounds.max().x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_faces() {
        let shape = Sphere { radius: 2.0 }.shape().unwrap();
        assert_eq!(shape.face_count(), STACKS * SEGMENTS);
        let bounds = shape.bounds();
        assert!((bounds.max().y - 2.0).abs() < 1e-9);
        assert!((bounds.min().y + 2.0).abs() < 1e-9);
    }
}
