//! Grouping nodes: Group and Transform.

use std::io::BufRead;

use vrml_math::{compose_transform, DMat4, DVec3, Rotation};

use super::{differs, unknown_field, NodeId};
use crate::error::VrmlResult;
use crate::io::import::{Importer, NodeConstraint};
use crate::io::writer::WriteSession;

/// A `Group` or, when `is_transform` is set, a `Transform`.
///
/// `Inline`, `Separator` and `Switch` are read as plain groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub is_transform: bool,
    pub children: Vec<NodeId>,
    pub translation: DVec3,
    pub rotation: Rotation,
    pub scale: DVec3,
    pub scale_orientation: Rotation,
    pub center: DVec3,
    pub bbox_center: DVec3,
    pub bbox_size: DVec3,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            is_transform: false,
            children: Vec::new(),
            translation: DVec3::ZERO,
            rotation: Rotation::IDENTITY,
            scale: DVec3::ONE,
            scale_orientation: Rotation::IDENTITY,
            center: DVec3::ZERO,
            bbox_center: DVec3::ZERO,
            bbox_size: DVec3::splat(-1.0),
        }
    }
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform() -> Self {
        Self {
            is_transform: true,
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }

    pub(crate) fn for_keyword(keyword: &str) -> Self {
        if keyword == "Transform" {
            Self::transform()
        } else {
            Self::new()
        }
    }

    /// Placement matrix of a Transform; identity for a plain group.
    pub fn matrix(&self) -> DMat4 {
        if !self.is_transform {
            return DMat4::IDENTITY;
        }
        compose_transform(
            self.translation,
            self.rotation,
            self.scale,
            self.scale_orientation,
            self.center,
        )
    }

    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "children" | "choice" => {
                let mut children = imp.read_children(NodeConstraint::Any)?;
                self.children.append(&mut children);
            }
            "bboxCenter" => self.bbox_center = imp.reader().read_vec3(true, false)?,
            "bboxSize" => self.bbox_size = imp.reader().read_vec3(true, false)?,
            "whichChoice" => {
                imp.reader().read_integer()?;
            }
            "url" => {
                let urls = imp.reader().read_string_list()?;
                log::debug!("Inline content is not loaded: {urls:?}");
            }
            "translation" if self.is_transform => {
                self.translation = imp.reader().read_vec3(true, false)?
            }
            "rotation" if self.is_transform => self.rotation = imp.reader().read_rotation()?,
            "scale" if self.is_transform => self.scale = imp.reader().read_vec3(false, true)?,
            "scaleOrientation" if self.is_transform => {
                self.scale_orientation = imp.reader().read_rotation()?
            }
            "center" if self.is_transform => self.center = imp.reader().read_vec3(true, false)?,
            _ => {
                let keyword = if self.is_transform { "Transform" } else { "Group" };
                return Err(unknown_field(keyword, field));
            }
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        let d = Group::default();
        w.begin_node(prefix, if self.is_transform { "Transform" } else { "Group" })?;
        if vec_differs(self.bbox_center, d.bbox_center) {
            w.write_vec3("bboxCenter", self.bbox_center, true)?;
        }
        if vec_differs(self.bbox_size, d.bbox_size) {
            w.write_vec3("bboxSize", self.bbox_size, true)?;
        }
        if self.is_transform {
            if vec_differs(self.translation, d.translation) {
                w.write_vec3("translation", self.translation, true)?;
            }
            if !self.rotation.is_identity() {
                w.write_rotation("rotation", self.rotation)?;
            }
            if vec_differs(self.scale, d.scale) {
                w.write_vec3("scale", self.scale, false)?;
            }
            if !self.scale_orientation.is_identity() {
                w.write_rotation("scaleOrientation", self.scale_orientation)?;
            }
            if vec_differs(self.center, d.center) {
                w.write_vec3("center", self.center, true)?;
            }
        }
        w.write_node_list("children", &self.children)?;
        w.end_node()
    }
}

fn vec_differs(a: DVec3, b: DVec3) -> bool {
    differs(a.x, b.x) || differs(a.y, b.y) || differs(a.z, b.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_plain_group_matrix_is_identity() {
        let group = Group {
            translation: DVec3::new(1.0, 2.0, 3.0),
            ..Group::new()
        };
        assert_eq!(group.matrix(), DMat4::IDENTITY);
    }

    #[test]
    fn test_transform_matrix() {
        let transform = Group {
            translation: DVec3::new(0.0, 0.0, 5.0),
            rotation: Rotation::new(DVec3::Y, FRAC_PI_2),
            ..Group::transform()
        };
        let p = transform.matrix().transform_point3(DVec3::X);
        assert!((p - DVec3::new(0.0, 0.0, 4.0)).length() < 1e-9);
    }
}
