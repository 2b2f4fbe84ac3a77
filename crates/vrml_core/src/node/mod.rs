//! Scene nodes.
//!
//! A [`Node`] is a name plus one of a closed set of [`NodeKind`] variants.
//! Nodes reference each other only through [`NodeId`] handles into the arena
//! of the scene that owns them.

mod appearance;
mod data;
mod geometry;
mod group;
mod indexed;
mod world_info;

use std::io::BufRead;

pub use appearance::{Appearance, ImageTexture, Material, ShapeNode};
pub use data::{Color, Coordinate, Normal, TextureCoordinate};
pub use geometry::{BoxNode, Cone, Cylinder, Sphere};
pub use group::Group;
pub use indexed::{IndexBlock, IndexedFaceSet, IndexedLineSet};
pub use world_info::{Unknown, WorldInfo};

use vrml_math::CONFUSION;

use crate::brep::Shape;
use crate::error::{VrmlError, VrmlResult};
use crate::io::import::{Importer, NodeConstraint};
use crate::io::writer::WriteSession;
use crate::scene::SceneData;

/// Handle of a node inside a scene arena.
///
/// A handle carries the id of the scene that issued it, so a scene can tell
/// its own handles from those of another scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) scene: u64,
    pub(crate) index: usize,
}

impl NodeId {
    pub(crate) fn new(scene: u64, index: usize) -> Self {
        Self { scene, index }
    }

    /// Id of the scene owning the node.
    pub fn scene(self) -> u64 {
        self.scene
    }

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.index
    }
}

/// A named scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    pub kind: NodeKind,
}

impl Node {
    /// Create a node; an empty name makes it anonymous.
    pub fn new(name: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Create an anonymous node.
    pub fn anonymous(kind: impl Into<NodeKind>) -> Self {
        Self::new("", kind)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// Fieldless mirror of [`NodeKind`], used for lookups and type constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Appearance,
    Shape,
    Box,
    Color,
    Cone,
    Coordinate,
    Cylinder,
    Group,
    ImageTexture,
    IndexedFaceSet,
    IndexedLineSet,
    Material,
    Normal,
    Sphere,
    TextureCoordinate,
    WorldInfo,
    Unknown,
}

impl NodeType {
    /// Resolve a VRML type keyword.
    ///
    /// `Transform`, `Inline`, `Separator` and `Switch` all resolve to
    /// [`NodeType::Group`]; `Coordinate3` is accepted for `Coordinate`.
    pub fn from_keyword(keyword: &str) -> Option<NodeType> {
        let ty = match keyword {
            "Appearance" => NodeType::Appearance,
            "Shape" => NodeType::Shape,
            "Box" => NodeType::Box,
            "Color" => NodeType::Color,
            "Cone" => NodeType::Cone,
            "Coordinate" | "Coordinate3" => NodeType::Coordinate,
            "Cylinder" => NodeType::Cylinder,
            "Group" | "Transform" | "Inline" | "Separator" | "Switch" => NodeType::Group,
            "ImageTexture" => NodeType::ImageTexture,
            "IndexedFaceSet" => NodeType::IndexedFaceSet,
            "IndexedLineSet" => NodeType::IndexedLineSet,
            "Material" => NodeType::Material,
            "Normal" => NodeType::Normal,
            "Sphere" => NodeType::Sphere,
            "TextureCoordinate" => NodeType::TextureCoordinate,
            "WorldInfo" => NodeType::WorldInfo,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeType::Appearance => "Appearance",
            NodeType::Shape => "Shape",
            NodeType::Box => "Box",
            NodeType::Color => "Color",
            NodeType::Cone => "Cone",
            NodeType::Coordinate => "Coordinate",
            NodeType::Cylinder => "Cylinder",
            NodeType::Group => "Group",
            NodeType::ImageTexture => "ImageTexture",
            NodeType::IndexedFaceSet => "IndexedFaceSet",
            NodeType::IndexedLineSet => "IndexedLineSet",
            NodeType::Material => "Material",
            NodeType::Normal => "Normal",
            NodeType::Sphere => "Sphere",
            NodeType::TextureCoordinate => "TextureCoordinate",
            NodeType::WorldInfo => "WorldInfo",
            NodeType::Unknown => "Unknown",
        }
    }

    /// True for kinds that can stand in a Shape's `geometry` field.
    pub fn is_geometry(self) -> bool {
        matches!(
            self,
            NodeType::Box
                | NodeType::Cone
                | NodeType::Cylinder
                | NodeType::Sphere
                | NodeType::IndexedFaceSet
                | NodeType::IndexedLineSet
        )
    }
}

/// Kind-specific node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Appearance(Appearance),
    Shape(ShapeNode),
    Box(BoxNode),
    Color(Color),
    Cone(Cone),
    Coordinate(Coordinate),
    Cylinder(Cylinder),
    Group(Group),
    ImageTexture(ImageTexture),
    IndexedFaceSet(IndexedFaceSet),
    IndexedLineSet(IndexedLineSet),
    Material(Material),
    Normal(Normal),
    Sphere(Sphere),
    TextureCoordinate(TextureCoordinate),
    WorldInfo(WorldInfo),
    Unknown(Unknown),
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Unknown(Unknown::default())
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for NodeKind {
                fn from(value: $ty) -> Self {
                    NodeKind::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant!(
    Appearance(Appearance),
    Shape(ShapeNode),
    Box(BoxNode),
    Color(Color),
    Cone(Cone),
    Coordinate(Coordinate),
    Cylinder(Cylinder),
    Group(Group),
    ImageTexture(ImageTexture),
    IndexedFaceSet(IndexedFaceSet),
    IndexedLineSet(IndexedLineSet),
    Material(Material),
    Normal(Normal),
    Sphere(Sphere),
    TextureCoordinate(TextureCoordinate),
    WorldInfo(WorldInfo),
    Unknown(Unknown),
);

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Appearance(_) => NodeType::Appearance,
            NodeKind::Shape(_) => NodeType::Shape,
            NodeKind::Box(_) => NodeType::Box,
            NodeKind::Color(_) => NodeType::Color,
            NodeKind::Cone(_) => NodeType::Cone,
            NodeKind::Coordinate(_) => NodeType::Coordinate,
            NodeKind::Cylinder(_) => NodeType::Cylinder,
            NodeKind::Group(_) => NodeType::Group,
            NodeKind::ImageTexture(_) => NodeType::ImageTexture,
            NodeKind::IndexedFaceSet(_) => NodeType::IndexedFaceSet,
            NodeKind::IndexedLineSet(_) => NodeType::IndexedLineSet,
            NodeKind::Material(_) => NodeType::Material,
            NodeKind::Normal(_) => NodeType::Normal,
            NodeKind::Sphere(_) => NodeType::Sphere,
            NodeKind::TextureCoordinate(_) => NodeType::TextureCoordinate,
            NodeKind::WorldInfo(_) => NodeType::WorldInfo,
            NodeKind::Unknown(_) => NodeType::Unknown,
        }
    }

    /// Fresh payload with VRML default field values for a type keyword.
    pub(crate) fn for_keyword(keyword: &str) -> Option<NodeKind> {
        let kind = match NodeType::from_keyword(keyword)? {
            NodeType::Appearance => Appearance::default().into(),
            NodeType::Shape => ShapeNode::default().into(),
            NodeType::Box => BoxNode::default().into(),
            NodeType::Color => Color::default().into(),
            NodeType::Cone => Cone::default().into(),
            NodeType::Coordinate => Coordinate::default().into(),
            NodeType::Cylinder => Cylinder::default().into(),
            NodeType::Group => Group::for_keyword(keyword).into(),
            NodeType::ImageTexture => ImageTexture::default().into(),
            NodeType::IndexedFaceSet => IndexedFaceSet::default().into(),
            NodeType::IndexedLineSet => IndexedLineSet::default().into(),
            NodeType::Material => Material::default().into(),
            NodeType::Normal => Normal::default().into(),
            NodeType::Sphere => Sphere::default().into(),
            NodeType::TextureCoordinate => TextureCoordinate::default().into(),
            NodeType::WorldInfo => WorldInfo::default().into(),
            NodeType::Unknown => return None,
        };
        Some(kind)
    }

    /// Handles of all nodes this one references, in field order.
    pub fn links(&self) -> Vec<NodeId> {
        self.typed_links().into_iter().map(|(id, _)| id).collect()
    }

    /// Every handle held by the node with the kinds its field accepts.
    pub(crate) fn typed_links(&self) -> Vec<(NodeId, NodeConstraint)> {
        let fields = match self {
            NodeKind::Appearance(n) => vec![
                (n.material, NodeConstraint::Exactly(NodeType::Material)),
                (n.texture, NodeConstraint::Texture),
                (n.texture_transform, NodeConstraint::Unsupported),
            ],
            NodeKind::Shape(n) => vec![
                (n.appearance, NodeConstraint::Exactly(NodeType::Appearance)),
                (n.geometry, NodeConstraint::Geometry),
            ],
            NodeKind::Group(n) => {
                return n.children.iter().map(|&id| (id, NodeConstraint::Any)).collect();
            }
            NodeKind::IndexedFaceSet(n) => vec![
                (n.coord, NodeConstraint::Exactly(NodeType::Coordinate)),
                (n.normal, NodeConstraint::Exactly(NodeType::Normal)),
                (n.color, NodeConstraint::Exactly(NodeType::Color)),
                (n.tex_coord, NodeConstraint::Exactly(NodeType::TextureCoordinate)),
            ],
            NodeKind::IndexedLineSet(n) => vec![
                (n.coord, NodeConstraint::Exactly(NodeType::Coordinate)),
                (n.color, NodeConstraint::Exactly(NodeType::Color)),
            ],
            NodeKind::Box(_)
            | NodeKind::Color(_)
            | NodeKind::Cone(_)
            | NodeKind::Coordinate(_)
            | NodeKind::Cylinder(_)
            | NodeKind::ImageTexture(_)
            | NodeKind::Material(_)
            | NodeKind::Normal(_)
            | NodeKind::Sphere(_)
            | NodeKind::TextureCoordinate(_)
            | NodeKind::WorldInfo(_)
            | NodeKind::Unknown(_) => Vec::new(),
        };
        fields
            .into_iter()
            .filter_map(|(id, constraint)| id.map(|id| (id, constraint)))
            .collect()
    }

    /// Mutable access to every handle, used when nodes move between arenas.
    pub(crate) fn links_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            NodeKind::Appearance(n) => n
                .material
                .iter_mut()
                .chain(n.texture.iter_mut())
                .chain(n.texture_transform.iter_mut())
                .collect(),
            NodeKind::Shape(n) => n
                .appearance
                .iter_mut()
                .chain(n.geometry.iter_mut())
                .collect(),
            NodeKind::Group(n) => n.children.iter_mut().collect(),
            NodeKind::IndexedFaceSet(n) => n
                .coord
                .iter_mut()
                .chain(n.normal.iter_mut())
                .chain(n.color.iter_mut())
                .chain(n.tex_coord.iter_mut())
                .collect(),
            NodeKind::IndexedLineSet(n) => {
                n.coord.iter_mut().chain(n.color.iter_mut()).collect()
            }
            NodeKind::Box(_)
            | NodeKind::Color(_)
            | NodeKind::Cone(_)
            | NodeKind::Coordinate(_)
            | NodeKind::Cylinder(_)
            | NodeKind::ImageTexture(_)
            | NodeKind::Material(_)
            | NodeKind::Normal(_)
            | NodeKind::Sphere(_)
            | NodeKind::TextureCoordinate(_)
            | NodeKind::WorldInfo(_)
            | NodeKind::Unknown(_) => Vec::new(),
        }
    }

    /// True when every field holds its VRML default, so the node can be
    /// left out of the output.
    pub fn is_default(&self, data: &SceneData) -> bool {
        match self {
            NodeKind::Appearance(n) => n.is_default(data),
            NodeKind::Material(n) => n.is_default(),
            NodeKind::ImageTexture(n) => n.urls.is_empty(),
            NodeKind::WorldInfo(n) => n.is_default(),
            NodeKind::Shape(_)
            | NodeKind::Box(_)
            | NodeKind::Color(_)
            | NodeKind::Cone(_)
            | NodeKind::Coordinate(_)
            | NodeKind::Cylinder(_)
            | NodeKind::Group(_)
            | NodeKind::IndexedFaceSet(_)
            | NodeKind::IndexedLineSet(_)
            | NodeKind::Normal(_)
            | NodeKind::Sphere(_)
            | NodeKind::TextureCoordinate(_)
            | NodeKind::Unknown(_) => false,
        }
    }

    /// Read fields up to the closing `}` of the node body.
    pub(crate) fn read_fields<R: BufRead>(&mut self, imp: &mut Importer<'_, R>) -> VrmlResult<()> {
        if let NodeKind::Unknown(n) = self {
            log::debug!("Skipping body of unsupported node {:?}", n.title);
            return imp.reader().skip_bracketed(b'{', b'}');
        }
        while !imp.reader().accept(b'}')? {
            let field = imp.reader().read_word()?;
            match self {
                NodeKind::Appearance(n) => n.read_field(imp, &field)?,
                NodeKind::Shape(n) => n.read_field(imp, &field)?,
                NodeKind::Box(n) => n.read_field(imp, &field)?,
                NodeKind::Color(n) => n.read_field(imp, &field)?,
                NodeKind::Cone(n) => n.read_field(imp, &field)?,
                NodeKind::Coordinate(n) => n.read_field(imp, &field)?,
                NodeKind::Cylinder(n) => n.read_field(imp, &field)?,
                NodeKind::Group(n) => n.read_field(imp, &field)?,
                NodeKind::ImageTexture(n) => n.read_field(imp, &field)?,
                NodeKind::IndexedFaceSet(n) => n.read_field(imp, &field)?,
                NodeKind::IndexedLineSet(n) => n.read_field(imp, &field)?,
                NodeKind::Material(n) => n.read_field(imp, &field)?,
                NodeKind::Normal(n) => n.read_field(imp, &field)?,
                NodeKind::Sphere(n) => n.read_field(imp, &field)?,
                NodeKind::TextureCoordinate(n) => n.read_field(imp, &field)?,
                NodeKind::WorldInfo(n) => n.read_field(imp, &field)?,
                NodeKind::Unknown(_) => {}
            }
        }
        Ok(())
    }

    /// Write the node body. `prefix` is the field label and/or `DEF name`
    /// clause that precedes the type keyword on the first line.
    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        match self {
            NodeKind::Appearance(n) => n.write(w, prefix),
            NodeKind::Shape(n) => n.write(w, prefix),
            NodeKind::Box(n) => n.write(w, prefix),
            NodeKind::Color(n) => n.write(w, prefix),
            NodeKind::Cone(n) => n.write(w, prefix),
            NodeKind::Coordinate(n) => n.write(w, prefix),
            NodeKind::Cylinder(n) => n.write(w, prefix),
            NodeKind::Group(n) => n.write(w, prefix),
            NodeKind::ImageTexture(n) => n.write(w, prefix),
            NodeKind::IndexedFaceSet(n) => n.write(w, prefix),
            NodeKind::IndexedLineSet(n) => n.write(w, prefix),
            NodeKind::Material(n) => n.write(w, prefix),
            NodeKind::Normal(n) => n.write(w, prefix),
            NodeKind::Sphere(n) => n.write(w, prefix),
            NodeKind::TextureCoordinate(n) => n.write(w, prefix),
            NodeKind::WorldInfo(n) => n.write(w, prefix),
            NodeKind::Unknown(n) => Err(VrmlError::NotImplemented(format!(
                "writing unsupported node {:?}",
                n.title
            ))),
        }
    }

    /// Shape fragment of a geometry node; `None` for other kinds and for
    /// geometry that produces no faces or edges.
    pub fn shape(&self, data: &SceneData) -> Option<Shape> {
        match self {
            NodeKind::Box(n) => n.shape(),
            NodeKind::Cone(n) => n.shape(),
            NodeKind::Cylinder(n) => n.shape(),
            NodeKind::Sphere(n) => n.shape(),
            NodeKind::IndexedFaceSet(n) => n.shape(data),
            NodeKind::IndexedLineSet(n) => n.shape(data),
            NodeKind::Appearance(_)
            | NodeKind::Shape(_)
            | NodeKind::Color(_)
            | NodeKind::Coordinate(_)
            | NodeKind::Group(_)
            | NodeKind::ImageTexture(_)
            | NodeKind::Material(_)
            | NodeKind::Normal(_)
            | NodeKind::TextureCoordinate(_)
            | NodeKind::WorldInfo(_)
            | NodeKind::Unknown(_) => None,
        }
    }
}

/// Format error for a field name the node does not define.
pub(crate) fn unknown_field(node: &str, field: &str) -> VrmlError {
    VrmlError::format(format!("unknown field {field:?} in {node} node"))
}

/// Scalar comparison used to decide whether a field still holds its default.
pub(crate) fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() > CONFUSION
}
