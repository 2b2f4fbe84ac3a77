//! Shape and appearance nodes.

use std::io::BufRead;

use vrml_math::DVec3;

use super::{differs, unknown_field, NodeId, NodeType};
use crate::error::VrmlResult;
use crate::io::import::{Importer, NodeConstraint};
use crate::io::writer::WriteSession;
use crate::scene::SceneData;

/// The `Shape` node: geometry plus the appearance it is drawn with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeNode {
    pub appearance: Option<NodeId>,
    pub geometry: Option<NodeId>,
}

impl ShapeNode {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "appearance" => {
                self.appearance = imp.read_link(NodeConstraint::Exactly(NodeType::Appearance))?
            }
            "geometry" => self.geometry = imp.read_link(NodeConstraint::Geometry)?,
            _ => return Err(unknown_field("Shape", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Shape")?;
        w.write_node(Some("appearance"), self.appearance)?;
        w.write_node(Some("geometry"), self.geometry)?;
        w.end_node()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    pub material: Option<NodeId>,
    pub texture: Option<NodeId>,
    pub texture_transform: Option<NodeId>,
}

impl Appearance {
    /// Default when it has no texture transform and its material and
    /// texture are absent or anonymous and themselves default.
    pub fn is_default(&self, data: &SceneData) -> bool {
        let default_or_none = |id: Option<NodeId>| match id.and_then(|id| data.node(id)) {
            Some(node) => node.is_anonymous() && node.kind.is_default(data),
            None => true,
        };
        self.texture_transform.is_none()
            && default_or_none(self.material)
            && default_or_none(self.texture)
    }

    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "material" => self.material = imp.read_link(NodeConstraint::Exactly(NodeType::Material))?,
            "texture" => self.texture = imp.read_link(NodeConstraint::Texture)?,
            // TextureTransform is not a supported kind: only its skipped
            // placeholder fits, and that is dropped
            "textureTransform" => self.texture_transform = imp.read_link(NodeConstraint::Unsupported)?,
            _ => return Err(unknown_field("Appearance", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Appearance")?;
        w.write_node(Some("material"), self.material)?;
        w.write_node(Some("texture"), self.texture)?;
        w.write_node(Some("textureTransform"), self.texture_transform)?;
        w.end_node()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient_intensity: f64,
    pub diffuse_color: DVec3,
    pub emissive_color: DVec3,
    pub shininess: f64,
    pub specular_color: DVec3,
    pub transparency: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.2,
            diffuse_color: DVec3::splat(0.8),
            emissive_color: DVec3::ZERO,
            shininess: 0.2,
            specular_color: DVec3::ZERO,
            transparency: 0.0,
        }
    }
}

impl Material {
    pub fn is_default(&self) -> bool {
        let d = Material::default();
        !differs(self.ambient_intensity, d.ambient_intensity)
            && !color_differs(self.diffuse_color, d.diffuse_color)
            && !color_differs(self.emissive_color, d.emissive_color)
            && !differs(self.shininess, d.shininess)
            && !color_differs(self.specular_color, d.specular_color)
            && !differs(self.transparency, d.transparency)
    }

    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        let reader = imp.reader();
        match field {
            "ambientIntensity" => self.ambient_intensity = reader.read_scalar(false, false)?,
            "diffuseColor" => self.diffuse_color = reader.read_vec3(false, false)?,
            "emissiveColor" => self.emissive_color = reader.read_vec3(false, false)?,
            "shininess" => self.shininess = reader.read_scalar(false, false)?,
            "specularColor" => self.specular_color = reader.read_vec3(false, false)?,
            "transparency" => self.transparency = reader.read_scalar(false, false)?,
            _ => return Err(unknown_field("Material", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        let d = Material::default();
        w.begin_node(prefix, "Material")?;
        if differs(self.ambient_intensity, d.ambient_intensity) {
            w.write_scalar("ambientIntensity", self.ambient_intensity, false)?;
        }
        if color_differs(self.diffuse_color, d.diffuse_color) {
            w.write_vec3("diffuseColor", self.diffuse_color, false)?;
        }
        if color_differs(self.emissive_color, d.emissive_color) {
            w.write_vec3("emissiveColor", self.emissive_color, false)?;
        }
        if differs(self.shininess, d.shininess) {
            w.write_scalar("shininess", self.shininess, false)?;
        }
        if color_differs(self.specular_color, d.specular_color) {
            w.write_vec3("specularColor", self.specular_color, false)?;
        }
        if differs(self.transparency, d.transparency) {
            w.write_scalar("transparency", self.transparency, false)?;
        }
        w.end_node()
    }
}

fn color_differs(a: DVec3, b: DVec3) -> bool {
    differs(a.x, b.x) || differs(a.y, b.y) || differs(a.z, b.z)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageTexture {
    pub urls: Vec<String>,
    pub repeat_s: bool,
    pub repeat_t: bool,
}

impl Default for ImageTexture {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            repeat_s: true,
            repeat_t: true,
        }
    }
}

impl ImageTexture {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        let reader = imp.reader();
        match field {
            "url" => self.urls = reader.read_string_list()?,
            "repeatS" => self.repeat_s = reader.read_bool()?,
            "repeatT" => self.repeat_t = reader.read_bool()?,
            _ => return Err(unknown_field("ImageTexture", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "ImageTexture")?;
        w.write_string_list("url", &self.urls)?;
        if !self.repeat_s {
            w.write_bool("repeatS", false)?;
        }
        if !self.repeat_t {
            w.write_bool("repeatT", false)?;
        }
        w.end_node()
    }
}
