//! Per-vertex data nodes referenced by indexed geometry.

use std::io::BufRead;

use vrml_math::{DVec2, DVec3};

use super::unknown_field;
use crate::error::VrmlResult;
use crate::io::import::Importer;
use crate::io::writer::WriteSession;

/// Vertex positions. Scaled by the scene's linear scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinate {
    pub points: Vec<DVec3>,
}

impl Coordinate {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "point" => self.points = imp.reader().read_vec3_array(true)?,
            _ => return Err(unknown_field("Coordinate", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Coordinate")?;
        w.write_vec3_array("point", &self.points, true)?;
        w.end_node()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normal {
    pub vectors: Vec<DVec3>,
}

impl Normal {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "vector" => self.vectors = imp.reader().read_vec3_array(false)?,
            _ => return Err(unknown_field("Normal", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Normal")?;
        w.write_vec3_array("vector", &self.vectors, false)?;
        w.end_node()
    }
}

/// RGB colors in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Color {
    pub colors: Vec<DVec3>,
}

impl Color {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "color" => self.colors = imp.reader().read_vec3_array(false)?,
            _ => return Err(unknown_field("Color", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "Color")?;
        w.write_vec3_array("color", &self.colors, false)?;
        w.end_node()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureCoordinate {
    pub points: Vec<DVec2>,
}

impl TextureCoordinate {
    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "point" => self.points = imp.reader().read_vec2_array(false)?,
            _ => return Err(unknown_field("TextureCoordinate", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "TextureCoordinate")?;
        w.write_vec2_array("point", &self.points)?;
        w.end_node()
    }
}
