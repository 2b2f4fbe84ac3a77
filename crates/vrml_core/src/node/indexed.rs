//! Indexed geometry: IndexedFaceSet, IndexedLineSet and their index blocks.

use std::io::BufRead;

use vrml_math::DVec3;

use super::{differs, unknown_field, NodeId, NodeKind, NodeType};
use crate::brep::Shape;
use crate::error::{VrmlError, VrmlResult};
use crate::io::import::{Importer, NodeConstraint};
use crate::io::writer::WriteSession;
use crate::scene::SceneData;

/// One polygon or polyline: vertex indices without the `-1` terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBlock(Box<[u32]>);

impl IndexBlock {
    /// Copy `values` into a new block, reporting allocation failure instead
    /// of aborting.
    pub fn try_from_slice(values: &[u32]) -> VrmlResult<Self> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(values.len())
            .map_err(|_| VrmlError::Allocation(format!("index block of {} values", values.len())))?;
        storage.extend_from_slice(values);
        Ok(Self(storage.into_boxed_slice()))
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u32> {
        self.0.iter()
    }
}

impl From<Vec<u32>> for IndexBlock {
    fn from(values: Vec<u32>) -> Self {
        Self(values.into_boxed_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFaceSet {
    pub coord: Option<NodeId>,
    pub normal: Option<NodeId>,
    pub color: Option<NodeId>,
    pub tex_coord: Option<NodeId>,
    pub coord_index: Vec<IndexBlock>,
    pub normal_index: Vec<IndexBlock>,
    pub color_index: Vec<IndexBlock>,
    pub tex_coord_index: Vec<IndexBlock>,
    pub ccw: bool,
    pub solid: bool,
    pub convex: bool,
    pub normal_per_vertex: bool,
    pub color_per_vertex: bool,
    pub crease_angle: f64,
}

impl Default for IndexedFaceSet {
    fn default() -> Self {
        Self {
            coord: None,
            normal: None,
            color: None,
            tex_coord: None,
            coord_index: Vec::new(),
            normal_index: Vec::new(),
            color_index: Vec::new(),
            tex_coord_index: Vec::new(),
            ccw: true,
            solid: true,
            convex: true,
            normal_per_vertex: true,
            color_per_vertex: true,
            crease_angle: 0.0,
        }
    }
}

impl IndexedFaceSet {
    /// Number of polygons in `coord_index`.
    pub fn polygon_count(&self) -> usize {
        self.coord_index.len()
    }

    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "coord" => self.coord = imp.read_link(NodeConstraint::Exactly(NodeType::Coordinate))?,
            "normal" => self.normal = imp.read_link(NodeConstraint::Exactly(NodeType::Normal))?,
            "color" => self.color = imp.read_link(NodeConstraint::Exactly(NodeType::Color))?,
            "texCoord" => {
                self.tex_coord = imp.read_link(NodeConstraint::Exactly(NodeType::TextureCoordinate))?
            }
            "coordIndex" => self.coord_index = imp.reader().read_index_blocks()?,
            "normalIndex" => self.normal_index = imp.reader().read_index_blocks()?,
            "colorIndex" => self.color_index = imp.reader().read_index_blocks()?,
            "texCoordIndex" => self.tex_coord_index = imp.reader().read_index_blocks()?,
            "ccw" => self.ccw = imp.reader().read_bool()?,
            "solid" => self.solid = imp.reader().read_bool()?,
            "convex" => self.convex = imp.reader().read_bool()?,
            "normalPerVertex" => self.normal_per_vertex = imp.reader().read_bool()?,
            "colorPerVertex" => self.color_per_vertex = imp.reader().read_bool()?,
            "creaseAngle" => self.crease_angle = imp.reader().read_scalar(false, false)?,
            _ => return Err(unknown_field("IndexedFaceSet", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "IndexedFaceSet")?;
        if !self.ccw {
            w.write_bool("ccw", false)?;
        }
        if !self.solid {
            w.write_bool("solid", false)?;
        }
        if !self.convex {
            w.write_bool("convex", false)?;
        }
        if !self.normal_per_vertex {
            w.write_bool("normalPerVertex", false)?;
        }
        if !self.color_per_vertex {
            w.write_bool("colorPerVertex", false)?;
        }
        if differs(self.crease_angle, 0.0) {
            w.write_scalar("creaseAngle", self.crease_angle, false)?;
        }
        w.write_node(Some("coord"), self.coord)?;
        w.write_index_blocks("coordIndex", &self.coord_index)?;
        w.write_node(Some("normal"), self.normal)?;
        w.write_index_blocks("normalIndex", &self.normal_index)?;
        w.write_node(Some("color"), self.color)?;
        w.write_index_blocks("colorIndex", &self.color_index)?;
        w.write_node(Some("texCoord"), self.tex_coord)?;
        w.write_index_blocks("texCoordIndex", &self.tex_coord_index)?;
        w.end_node()
    }

    /// One face per polygon with at least three valid vertices; a single
    /// face is returned bare, several form a shell.
    pub fn shape(&self, data: &SceneData) -> Option<Shape> {
        let points = coordinates(data, self.coord)?;
        let mut faces: Vec<Shape> = self
            .coord_index
            .iter()
            .filter_map(|block| {
                let mut polygon = resolve(points, block)?;
                if polygon.len() < 3 {
                    return None;
                }
                if !self.ccw {
                    polygon.reverse();
                }
                Some(Shape::face(polygon))
            })
            .collect();
        match faces.len() {
            0 => None,
            1 => faces.pop(),
            _ => Some(Shape::shell(faces)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedLineSet {
    pub coord: Option<NodeId>,
    pub color: Option<NodeId>,
    pub coord_index: Vec<IndexBlock>,
    pub color_index: Vec<IndexBlock>,
    pub color_per_vertex: bool,
}

impl Default for IndexedLineSet {
    fn default() -> Self {
        Self {
            coord: None,
            color: None,
            coord_index: Vec::new(),
            color_index: Vec::new(),
            color_per_vertex: true,
        }
    }
}

impl IndexedLineSet {
    pub fn polyline_count(&self) -> usize {
        self.coord_index.len()
    }

    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "coord" => self.coord = imp.read_link(NodeConstraint::Exactly(NodeType::Coordinate))?,
            "color" => self.color = imp.read_link(NodeConstraint::Exactly(NodeType::Color))?,
            "coordIndex" => self.coord_index = imp.reader().read_index_blocks()?,
            "colorIndex" => self.color_index = imp.reader().read_index_blocks()?,
            "colorPerVertex" => self.color_per_vertex = imp.reader().read_bool()?,
            _ => return Err(unknown_field("IndexedLineSet", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "IndexedLineSet")?;
        if !self.color_per_vertex {
            w.write_bool("colorPerVertex", false)?;
        }
        w.write_node(Some("coord"), self.coord)?;
        w.write_index_blocks("coordIndex", &self.coord_index)?;
        w.write_node(Some("color"), self.color)?;
        w.write_index_blocks("colorIndex", &self.color_index)?;
        w.end_node()
    }

    /// One wire per polyline with at least two valid vertices.
    pub fn shape(&self, data: &SceneData) -> Option<Shape> {
        let points = coordinates(data, self.coord)?;
        let mut wires: Vec<Shape> = self
            .coord_index
            .iter()
            .filter_map(|block| resolve(points, block).filter(|line| line.len() >= 2))
            .map(Shape::wire)
            .collect();
        match wires.len() {
            0 => None,
            1 => wires.pop(),
            _ => Some(Shape::compound(wires)),
        }
    }
}

fn coordinates(data: &SceneData, coord: Option<NodeId>) -> Option<&[DVec3]> {
    match &data.node(coord?)?.kind {
        NodeKind::Coordinate(c) => Some(&c.points),
        _ => None,
    }
}

/// Look up the vertices of a block; a block with an out-of-range index is
/// dropped.
fn resolve(points: &[DVec3], block: &IndexBlock) -> Option<Vec<DVec3>> {
    let resolved = block
        .iter()
        .map(|&i| points.get(i as usize).copied())
        .collect::<Option<Vec<_>>>();
    if resolved.is_none() {
        log::debug!("Dropping index block with an out-of-range vertex: {:?}", block.as_slice());
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brep::ShapeKind;
    use crate::node::{Coordinate, Node};

    fn scene_with_square() -> (SceneData, NodeId) {
        let mut data = SceneData::default();
        let coord = data.push(Node::anonymous(Coordinate {
            points: vec![
                DVec3::ZERO,
                DVec3::X,
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::Y,
                DVec3::new(0.0, 0.0, 1.0),
            ],
        }));
        (data, coord)
    }

    #[test]
    fn test_index_block_try_from_slice() {
        let block = IndexBlock::try_from_slice(&[4, 5, 6]).unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(block.as_slice(), &[4, 5, 6]);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_face_set_single_face() {
        let (data, coord) = scene_with_square();
        let ifs = IndexedFaceSet {
            coord: Some(coord),
            coord_index: vec![IndexBlock::from(vec![0, 1, 2, 3])],
            ..Default::default()
        };
        let shape = ifs.shape(&data).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Face);
    }

    #[test]
    fn test_face_set_skips_degenerate_and_invalid() {
        let (data, coord) = scene_with_square();
        let ifs = IndexedFaceSet {
            coord: Some(coord),
            coord_index: vec![
                IndexBlock::from(vec![0, 1, 2]),
                IndexBlock::from(vec![0, 1]),
                IndexBlock::from(vec![0, 1, 99]),
                IndexBlock::from(vec![0, 3, 4]),
            ],
            ..Default::default()
        };
        let shape = ifs.shape(&data).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Shell);
        assert_eq!(shape.face_count(), 2);
    }

    #[test]
    fn test_face_set_without_coordinates() {
        let data = SceneData::default();
        let ifs = IndexedFaceSet {
            coord_index: vec![IndexBlock::from(vec![0, 1, 2])],
            ..Default::default()
        };
        assert!(ifs.shape(&data).is_none());
    }

    #[test]
    fn test_clockwise_faces_are_reversed() {
        let (data, coord) = scene_with_square();
        let ifs = IndexedFaceSet {
            coord: Some(coord),
            coord_index: vec![IndexBlock::from(vec![0, 1, 2])],
            ccw: false,
            ..Default::default()
        };
        let shape = ifs.shape(&data).unwrap();
        match shape.tshape() {
            crate::brep::TShape::Face(points) => {
                assert_eq!(points[0], DVec3::new(1.0, 1.0, 0.0));
                assert_eq!(points[2], DVec3::ZERO);
            }
            other => panic!("expected a face, got {other:?}"),
        }
    }

    #[test]
    fn test_line_set_wires() {
        let (data, coord) = scene_with_square();
        let ils = IndexedLineSet {
            coord: Some(coord),
            coord_index: vec![IndexBlock::from(vec![0, 1, 2]), IndexBlock::from(vec![3])],
            ..Default::default()
        };
        let shape = ils.shape(&data).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Wire);
        assert_eq!(ils.polyline_count(), 2);
    }
}
