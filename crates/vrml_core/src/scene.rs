//! The scene graph: an arena of nodes behind a per-scene lock.
//!
//! All nodes of a scene live in one arena and refer to each other by
//! [`NodeId`]. Import, export, node insertion and queries each hold the
//! scene lock for their whole duration.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};
use vrml_math::DMat4;

use crate::brep::{AppearanceMap, Shape};
use crate::config::SceneConfig;
use crate::error::{ErrorStatus, ImportError, VrmlError, VrmlResult};
use crate::io::import::Importer;
use crate::io::writer::WriteSession;
use crate::node::{Node, NodeId, NodeKind, NodeType, WorldInfo};
use crate::shape;

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

fn next_scene_id() -> u64 {
    NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)
}

static EMPTY_WORLD_INFO: WorldInfo = WorldInfo {
    title: String::new(),
    info: Vec::new(),
};

/// Scene state guarded by the scene lock.
#[derive(Debug)]
pub struct SceneData {
    pub(crate) scene: u64,
    pub(crate) nodes: Vec<Node>,
    pub(crate) top_level: Vec<NodeId>,
    pub(crate) names: HashMap<String, NodeId>,
    pub(crate) world_info: NodeId,
    pub(crate) linear_scale: f64,
    pub(crate) indent_step: usize,
    pub(crate) status: ErrorStatus,
    pub(crate) line_error: usize,
}

impl Default for SceneData {
    fn default() -> Self {
        Self::new(next_scene_id(), &SceneConfig::default())
    }
}

impl SceneData {
    fn new(scene: u64, config: &SceneConfig) -> Self {
        Self {
            scene,
            nodes: vec![Node::anonymous(WorldInfo::default())],
            top_level: Vec::new(),
            names: HashMap::new(),
            world_info: NodeId::new(scene, 0),
            linear_scale: config.linear_scale,
            indent_step: config.indent_step,
            status: ErrorStatus::Ok,
            line_error: 0,
        }
    }

    /// Node behind `id`; `None` for handles of other scenes.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        if id.scene != self.scene {
            return None;
        }
        self.nodes.get(id.index)
    }

    /// All nodes of the arena, including ones not reachable from the top
    /// level.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    pub fn linear_scale(&self) -> f64 {
        self.linear_scale
    }

    /// Append to the arena without registering the name.
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.scene, self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Append to the arena and register the node's name, appending `D`
    /// until it is unique.
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        let id = self.push(node);
        self.register_name(id);
        id
    }

    fn register_name(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.index) else {
            return;
        };
        if node.is_anonymous() {
            return;
        }
        let mut name = node.name().to_string();
        while self.names.contains_key(&name) {
            name.push('D');
        }
        if name != node.name() {
            log::warn!("Node name {:?} already in use, renamed to {:?}", node.name(), name);
            node.set_name(name.clone());
        }
        self.names.insert(name, id);
    }

    /// Look a node up by name, optionally requiring a kind.
    pub fn find_node(&self, name: &str, ty: Option<NodeType>) -> Option<NodeId> {
        let id = *self.names.get(name)?;
        match ty {
            Some(ty) if self.node(id)?.node_type() != ty => None,
            _ => Some(id),
        }
    }

    pub fn world_info_ref(&self) -> &WorldInfo {
        match self.node(self.world_info).map(|node| &node.kind) {
            Some(NodeKind::WorldInfo(info)) => info,
            _ => &EMPTY_WORLD_INFO,
        }
    }

    fn world_info_mut(&mut self) -> Option<&mut WorldInfo> {
        match self.nodes.get_mut(self.world_info.index).map(|node| &mut node.kind) {
            Some(NodeKind::WorldInfo(info)) => Some(info),
            _ => None,
        }
    }

    pub(crate) fn merge_world_info(&mut self, other: &WorldInfo) {
        if let Some(info) = self.world_info_mut() {
            info.merge(other);
        }
    }

    fn check_links(&self, node: &Node) -> Result<(), String> {
        for (link, constraint) in node.kind.typed_links() {
            if link.scene != self.scene {
                return Err(format!("link to node #{} of scene {}", link.index, link.scene));
            }
            let Some(target) = self.node(link) else {
                return Err(format!("dangling link to node #{}", link.index));
            };
            let ty = target.node_type();
            if !constraint.accepts(ty) {
                return Err(format!("{} node #{} is not allowed in its field", ty.name(), link.index));
            }
        }
        Ok(())
    }

    /// Handles reachable from `root`, `root` first, each once.
    fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(node.kind.links().into_iter().rev());
        }
        order
    }

    fn find_with_transform(&self, ids: &[NodeId], name: &str) -> Option<(NodeId, DMat4)> {
        for &id in ids {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.name() == name {
                return Some((id, DMat4::IDENTITY));
            }
            if let NodeKind::Group(group) = &node.kind {
                // the parent's placement is not applied to the result
                if let Some(found) = self.find_with_transform(&group.children, name) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// A VRML scene.
///
/// ```
/// use vrml_core::node::{BoxNode, Node, ShapeNode};
/// use vrml_core::Scene;
///
/// let scene = Scene::new();
/// let cube = scene.add_node(Node::anonymous(BoxNode::default()), false).unwrap();
/// let shape = ShapeNode { appearance: None, geometry: Some(cube) };
/// scene.add_node(Node::new("Cube", shape), true).unwrap();
///
/// let text = scene.to_vrml_string().unwrap();
/// assert!(text.starts_with("#VRML V2.0 utf8"));
/// ```
#[derive(Debug)]
pub struct Scene {
    id: u64,
    data: Mutex<SceneData>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_config(&SceneConfig::default())
    }

    pub fn with_config(config: &SceneConfig) -> Self {
        let id = next_scene_id();
        Self {
            id,
            data: Mutex::new(SceneData::new(id, config)),
        }
    }

    /// Process-unique identifier of this scene.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Lock the scene for inspection.
    pub fn lock(&self) -> MutexGuard<'_, SceneData> {
        self.data.lock()
    }

    /// Insert a node whose links point into this scene.
    ///
    /// Returns `None` for WorldInfo nodes (the scene keeps a single merged
    /// one, see [`Scene::add_world_info`]) and for nodes whose links would
    /// not survive export: handles issued by another scene (copy those with
    /// [`Scene::add_node_from`]), handles this scene does not have, and
    /// targets of a kind the field does not accept.
    pub fn add_node(&self, node: Node, is_top_level: bool) -> Option<NodeId> {
        if node.node_type() == NodeType::WorldInfo {
            log::debug!("WorldInfo nodes are merged, not added");
            return None;
        }
        let mut data = self.data.lock();
        if let Err(reason) = data.check_links(&node) {
            log::warn!("Refusing {} node: {reason}", node.node_type().name());
            return None;
        }
        let id = data.insert(node);
        if is_top_level {
            data.top_level.push(id);
        }
        Some(id)
    }

    /// Insert node `id` of scene `source`.
    ///
    /// A node of this same scene is reused as is. A node of another scene is
    /// copied together with everything it references; the copies get fresh
    /// handles and their names are registered here.
    pub fn add_node_from(&self, source: &Scene, id: NodeId, is_top_level: bool) -> Option<NodeId> {
        if source.id == self.id {
            let mut data = self.data.lock();
            let ty = data.node(id)?.node_type();
            if ty == NodeType::WorldInfo {
                return None;
            }
            if is_top_level {
                data.top_level.push(id);
            }
            return Some(id);
        }

        let snapshot: Vec<(NodeId, Node)> = {
            let src = source.data.lock();
            if src.node(id)?.node_type() == NodeType::WorldInfo {
                return None;
            }
            src.reachable(id)
                .into_iter()
                .filter_map(|old| src.node(old).map(|node| (old, node.clone())))
                .collect()
        };

        let mut data = self.data.lock();
        let base = data.nodes.len();
        let remap: HashMap<NodeId, NodeId> = snapshot
            .iter()
            .enumerate()
            .map(|(i, (old, _))| (*old, NodeId::new(self.id, base + i)))
            .collect();
        for (_, mut node) in snapshot {
            for link in node.kind.links_mut() {
                if let Some(&new) = remap.get(link) {
                    *link = new;
                }
            }
            data.insert(node);
        }
        let new_id = *remap.get(&id)?;
        if is_top_level {
            data.top_level.push(new_id);
        }
        log::debug!(
            "Copied {} nodes from scene {} into scene {}",
            remap.len(),
            source.id,
            self.id
        );
        Some(new_id)
    }

    /// Clone of the node behind `id`.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.data.lock().node(id).cloned()
    }

    /// Number of nodes in the arena, including the world-info node.
    pub fn node_count(&self) -> usize {
        self.data.lock().nodes.len()
    }

    pub fn top_level(&self) -> Vec<NodeId> {
        self.data.lock().top_level.clone()
    }

    pub fn find_node(&self, name: &str, ty: Option<NodeType>) -> Option<NodeId> {
        self.data.lock().find_node(name, ty)
    }

    /// Search the top level and the children of groups for a node called
    /// `name`.
    ///
    /// The returned placement is always identity: the transforms of the
    /// enclosing groups are not accumulated.
    pub fn find_node_with_transform(&self, name: &str) -> Option<(NodeId, DMat4)> {
        let data = self.data.lock();
        data.find_with_transform(&data.top_level, name)
    }

    pub fn world_info(&self) -> WorldInfo {
        self.data.lock().world_info_ref().clone()
    }

    pub fn set_world_title(&self, title: impl Into<String>) {
        if let Some(info) = self.data.lock().world_info_mut() {
            info.title = title.into();
        }
    }

    pub fn add_world_info(&self, line: impl Into<String>) {
        if let Some(info) = self.data.lock().world_info_mut() {
            info.info.push(line.into());
        }
    }

    pub fn linear_scale(&self) -> f64 {
        self.data.lock().linear_scale
    }

    /// Factor applied to lengths: values read are multiplied by it, values
    /// written are divided by it.
    pub fn set_linear_scale(&self, scale: f64) {
        self.data.lock().linear_scale = scale;
    }

    pub fn indent_step(&self) -> usize {
        self.data.lock().indent_step
    }

    pub fn set_indent_step(&self, step: usize) {
        self.data.lock().indent_step = step;
    }

    /// Status of the last import or export.
    pub fn status(&self) -> ErrorStatus {
        self.data.lock().status
    }

    /// Input line at which the last import failed, 0 after success.
    pub fn line_error(&self) -> usize {
        self.data.lock().line_error
    }

    /// Import VRML text, adding its nodes to this scene.
    pub fn read<R: BufRead>(&self, input: R) -> Result<(), ImportError> {
        let mut data = self.data.lock();
        let (result, line) = {
            let mut importer = Importer::new(&mut data, input);
            let result = importer.read_scene();
            (result, importer.line())
        };
        match result {
            Ok(()) => {
                data.status = ErrorStatus::Ok;
                data.line_error = 0;
                Ok(())
            }
            Err(source) => {
                data.status = source.status();
                data.line_error = line;
                log::warn!("VRML import failed at line {line}: {source}");
                Err(ImportError { line, source })
            }
        }
    }

    /// Export the scene as VRML 2.0 text.
    ///
    /// Anonymous nodes referenced more than once receive synthetic names
    /// (`_1`, `_2`, ...) that stay on the nodes afterwards. On failure the
    /// output is incomplete and should be discarded.
    pub fn write<W: Write>(&self, output: &mut W) -> VrmlResult<()> {
        let mut data = self.data.lock();
        let result = write_data(&mut data, output);
        data.status = match &result {
            Ok(()) => ErrorStatus::Ok,
            Err(err) => err.status(),
        };
        result
    }

    /// Export into a string.
    pub fn to_vrml_string(&self) -> VrmlResult<String> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Shape of the whole scene; `None` when no node yields geometry.
    pub fn shape(&self) -> Option<Shape> {
        let data = self.data.lock();
        shape::extract(&data, &data.top_level, None)
    }

    /// Shape of the whole scene plus the appearance bound to each face.
    pub fn shape_with_appearances(&self) -> (Option<Shape>, AppearanceMap) {
        let data = self.data.lock();
        let mut map = AppearanceMap::new();
        let shape = shape::extract(&data, &data.top_level, Some(&mut map));
        (shape, map)
    }

    /// Human-readable listing of the top-level graph.
    pub fn dump(&self) -> String {
        let data = self.data.lock();
        let mut out = String::new();
        let _ = writeln!(
            out,
            " ===== Diagnostic Dump of a Scene ({} nodes)",
            data.nodes.len()
        );
        for &id in &data.top_level {
            dump_node(&data, &mut out, Some(id), "  ");
        }
        out
    }
}

fn write_data(data: &mut SceneData, output: &mut dyn Write) -> VrmlResult<()> {
    let synthesized = {
        let mut discovery = WriteSession::discovery(data);
        discovery.write_scene()?;
        discovery.into_synthesized_names()
    };
    let mut assigned: Vec<_> = synthesized.into_iter().collect();
    assigned.sort();
    for (id, name) in assigned {
        if let Some(node) = data.nodes.get_mut(id.index) {
            node.set_name(name);
            data.register_name(id);
        }
    }

    let mut emission = WriteSession::emission(data, output);
    emission.write_scene()?;
    output.flush().map_err(VrmlError::from)?;
    log::info!("Wrote {} top-level nodes", data.top_level.len());
    Ok(())
}

fn dump_node(data: &SceneData, out: &mut String, id: Option<NodeId>, indent: &str) {
    let Some(node) = id.and_then(|id| data.node(id)) else {
        return;
    };
    let nested = format!("{indent}  ");
    let header = match &node.kind {
        NodeKind::Group(group) => format!(
            "Group ({})",
            if group.is_transform { "Transform" } else { "Group" }
        ),
        NodeKind::IndexedFaceSet(ifs) => format!(
            "IndexedFaceSet ({} vertices, {} polygons)",
            vertex_count(data, ifs.coord),
            ifs.polygon_count()
        ),
        NodeKind::IndexedLineSet(ils) => format!(
            "IndexedLineSet ({} vertices, {} polygons)",
            vertex_count(data, ils.coord),
            ils.polyline_count()
        ),
        NodeKind::Unknown(unknown) => format!("Unknown ({})", unknown.title),
        other => other.node_type().name().to_string(),
    };
    let _ = if node.is_anonymous() {
        writeln!(out, "{indent}{header} node")
    } else {
        writeln!(out, "{indent}{header} node: \"{}\"", node.name())
    };

    match &node.kind {
        NodeKind::Appearance(app) => {
            dump_node(data, out, app.material, &nested);
            dump_node(data, out, app.texture, &nested);
            dump_node(data, out, app.texture_transform, &nested);
        }
        NodeKind::Shape(shape) => {
            dump_node(data, out, shape.appearance, &nested);
            dump_node(data, out, shape.geometry, &nested);
        }
        NodeKind::Group(group) => {
            for &child in &group.children {
                dump_node(data, out, Some(child), &nested);
            }
        }
        _ => {}
    }
}

fn vertex_count(data: &SceneData, coord: Option<NodeId>) -> usize {
    match coord.and_then(|id| data.node(id)).map(|node| &node.kind) {
        Some(NodeKind::Coordinate(c)) => c.points.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{
        Appearance, BoxNode, Coordinate, Group, IndexBlock, IndexedFaceSet, Material, ShapeNode,
        Sphere,
    };
    use vrml_math::{DVec3, Rotation};

    fn find_kind(scene: &Scene, name: &str) -> NodeKind {
        let id = scene.find_node(name, None).unwrap();
        scene.node(id).unwrap().kind
    }

    #[test]
    fn test_name_uniqueness() {
        let scene = Scene::new();
        let a = scene.add_node(Node::new("Part", Sphere::default()), true).unwrap();
        let b = scene.add_node(Node::new("Part", Sphere::default()), true).unwrap();
        let c = scene.add_node(Node::new("Part", Sphere::default()), true).unwrap();

        assert_eq!(scene.node(a).unwrap().name(), "Part");
        assert_eq!(scene.node(b).unwrap().name(), "PartD");
        assert_eq!(scene.node(c).unwrap().name(), "PartDD");
        assert_eq!(scene.find_node("PartD", None), Some(b));
    }

    #[test]
    fn test_add_node_rejects_world_info_and_dangling_links() {
        let scene = Scene::new();
        assert!(scene.add_node(Node::anonymous(WorldInfo::default()), true).is_none());

        let dangling = ShapeNode {
            appearance: None,
            geometry: Some(NodeId::new(scene.id(), 42)),
        };
        assert!(scene.add_node(Node::anonymous(dangling), true).is_none());
        assert!(scene.top_level().is_empty());
    }

    #[test]
    fn test_add_node_rejects_handles_of_other_scenes() {
        let source = Scene::new();
        let ball = source.add_node(Node::anonymous(Sphere::default()), false).unwrap();

        let target = Scene::new();
        let material = target
            .add_node(
                Node::anonymous(Material {
                    transparency: 0.5,
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        assert_eq!(ball.index(), material.index());
        assert!(target.node(ball).is_none());

        let borrowed = ShapeNode {
            appearance: None,
            geometry: Some(ball),
        };
        assert!(target.add_node(Node::anonymous(borrowed), true).is_none());
        assert!(target.top_level().is_empty());

        let holder = source
            .add_node(
                Node::anonymous(ShapeNode {
                    appearance: None,
                    geometry: Some(ball),
                }),
                true,
            )
            .unwrap();
        let copied = target.add_node_from(&source, holder, true).unwrap();
        assert_eq!(copied.scene(), target.id());

        let text = target.to_vrml_string().unwrap();
        assert!(text.contains("geometry Sphere"), "{text}");
        assert!(!text.contains("geometry Material"), "{text}");
        let reread = Scene::new();
        reread.read(text.as_bytes()).unwrap();
        assert_eq!(reread.top_level().len(), 1);
    }

    #[test]
    fn test_add_node_rejects_links_of_the_wrong_kind() {
        let scene = Scene::new();
        let material = scene.add_node(Node::anonymous(Material::default()), false).unwrap();
        let cube = scene.add_node(Node::anonymous(BoxNode::default()), false).unwrap();

        let misplaced = ShapeNode {
            appearance: None,
            geometry: Some(material),
        };
        assert!(scene.add_node(Node::anonymous(misplaced), true).is_none());

        let swapped = ShapeNode {
            appearance: Some(cube),
            geometry: Some(cube),
        };
        assert!(scene.add_node(Node::anonymous(swapped), true).is_none());

        let odd_transform = Appearance {
            material: Some(material),
            texture_transform: Some(material),
            ..Default::default()
        };
        assert!(scene.add_node(Node::anonymous(odd_transform), false).is_none());

        let valid = ShapeNode {
            appearance: None,
            geometry: Some(cube),
        };
        assert!(scene.add_node(Node::anonymous(valid), true).is_some());
        assert_eq!(scene.top_level().len(), 1);
    }

    #[test]
    fn test_find_node_with_kind() {
        let scene = Scene::new();
        scene.add_node(Node::new("Ball", Sphere::default()), true).unwrap();
        assert!(scene.find_node("Ball", Some(NodeType::Sphere)).is_some());
        assert!(scene.find_node("Ball", Some(NodeType::Box)).is_none());
        assert!(scene.find_node("Nothing", None).is_none());
    }

    #[test]
    fn test_find_node_with_transform_is_identity() {
        let scene = Scene::new();
        let ball = scene.add_node(Node::new("Ball", Sphere::default()), false).unwrap();
        let mut moved = Group::transform().with_children(vec![ball]);
        moved.translation = DVec3::new(5.0, 0.0, 0.0);
        scene.add_node(Node::anonymous(moved), true).unwrap();

        let (found, placement) = scene.find_node_with_transform("Ball").unwrap();
        assert_eq!(found, ball);
        assert_eq!(placement, DMat4::IDENTITY);
        assert!(scene.find_node_with_transform("Missing").is_none());
    }

    #[test]
    fn test_shared_anonymous_node_gets_synthetic_name() {
        let scene = Scene::new();
        let cube = scene.add_node(Node::anonymous(BoxNode::default()), false).unwrap();
        for _ in 0..2 {
            let shape = scene
                .add_node(
                    Node::anonymous(ShapeNode {
                        appearance: None,
                        geometry: Some(cube),
                    }),
                    false,
                )
                .unwrap();
            scene
                .add_node(Node::anonymous(Group::new().with_children(vec![shape])), true)
                .unwrap();
        }

        let text = scene.to_vrml_string().unwrap();
        assert_eq!(text.matches("DEF _1 Box").count(), 1, "{text}");
        assert_eq!(text.matches("USE _1").count(), 1, "{text}");
        assert_eq!(scene.node(cube).unwrap().name(), "_1");
        assert_eq!(scene.status(), ErrorStatus::Ok);
    }

    #[test]
    fn test_synthetic_names_avoid_existing_ones() {
        let scene = Scene::new();
        scene.add_node(Node::new("_1", Sphere::default()), true).unwrap();
        let cube = scene.add_node(Node::anonymous(BoxNode::default()), false).unwrap();
        let shape = ShapeNode {
            appearance: None,
            geometry: Some(cube),
        };
        scene.add_node(Node::anonymous(shape.clone()), true).unwrap();
        scene.add_node(Node::anonymous(shape), true).unwrap();

        let text = scene.to_vrml_string().unwrap();
        assert!(text.contains("geometry DEF _2 Box"), "{text}");
        assert!(text.contains("geometry USE _2"), "{text}");
    }

    #[test]
    fn test_round_trip() {
        let scene = Scene::new();
        scene.set_world_title("Round trip");
        let red = scene
            .add_node(
                Node::new(
                    "Red",
                    Material {
                        diffuse_color: DVec3::new(1.0, 0.0, 0.0),
                        transparency: 0.25,
                        ..Default::default()
                    },
                ),
                false,
            )
            .unwrap();
        let look = scene
            .add_node(
                Node::anonymous(Appearance {
                    material: Some(red),
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        let coord = scene
            .add_node(
                Node::new(
                    "Pts",
                    Coordinate {
                        points: vec![DVec3::ZERO, DVec3::X, DVec3::new(0.5, 1.0, 0.0), DVec3::Z],
                    },
                ),
                false,
            )
            .unwrap();
        let mesh = scene
            .add_node(
                Node::anonymous(IndexedFaceSet {
                    coord: Some(coord),
                    coord_index: vec![
                        IndexBlock::from(vec![0, 1, 2]),
                        IndexBlock::from(vec![0, 2, 3]),
                    ],
                    solid: false,
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        let shape = scene
            .add_node(
                Node::new(
                    "Mesh",
                    ShapeNode {
                        appearance: Some(look),
                        geometry: Some(mesh),
                    },
                ),
                false,
            )
            .unwrap();
        let mut xform = Group::transform().with_children(vec![shape]);
        xform.translation = DVec3::new(1.5, -2.0, 0.0);
        xform.rotation = Rotation::new(DVec3::Y, 0.5);
        scene.add_node(Node::new("Root", xform), true).unwrap();

        let text = scene.to_vrml_string().unwrap();
        let copy = Scene::new();
        copy.read(text.as_bytes()).unwrap();

        assert_eq!(copy.world_info().title, "Round trip");
        assert_eq!(copy.top_level().len(), 1);
        match find_kind(&copy, "Root") {
            NodeKind::Group(g) => {
                assert!(g.is_transform);
                assert!((g.translation - DVec3::new(1.5, -2.0, 0.0)).length() < 1e-9);
                assert!((g.rotation.angle - 0.5).abs() < 1e-9);
                assert_eq!(g.children.len(), 1);
            }
            other => panic!("expected a transform, got {other:?}"),
        }
        match find_kind(&copy, "Red") {
            NodeKind::Material(m) => {
                assert_eq!(m.diffuse_color, DVec3::new(1.0, 0.0, 0.0));
                assert!((m.transparency - 0.25).abs() < 1e-12);
            }
            other => panic!("expected a material, got {other:?}"),
        }
        match find_kind(&copy, "Pts") {
            NodeKind::Coordinate(c) => assert_eq!(c.points.len(), 4),
            other => panic!("expected coordinates, got {other:?}"),
        }
        let mesh_shape = copy.find_node("Mesh", Some(NodeType::Shape)).unwrap();
        match copy.node(mesh_shape).unwrap().kind {
            NodeKind::Shape(s) => match copy.node(s.geometry.unwrap()).unwrap().kind {
                NodeKind::IndexedFaceSet(ifs) => {
                    assert_eq!(ifs.coord_index.len(), 2);
                    assert_eq!(ifs.coord_index[1].as_slice(), &[0, 2, 3]);
                    assert!(!ifs.solid);
                    assert!(ifs.ccw);
                }
                other => panic!("expected a face set, got {other:?}"),
            },
            other => panic!("expected a shape, got {other:?}"),
        }

        // a second export of the copy is identical
        assert_eq!(copy.to_vrml_string().unwrap(), text);
    }

    #[test]
    fn test_default_nodes_are_omitted() {
        let scene = Scene::new();
        let plain = scene.add_node(Node::anonymous(Material::default()), false).unwrap();
        let look = scene
            .add_node(
                Node::anonymous(Appearance {
                    material: Some(plain),
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        let ball = scene.add_node(Node::anonymous(Sphere::default()), false).unwrap();
        let shape = ShapeNode {
            appearance: Some(look),
            geometry: Some(ball),
        };
        scene.add_node(Node::anonymous(shape), true).unwrap();

        let text = scene.to_vrml_string().unwrap();
        assert!(!text.contains("Appearance"), "{text}");
        assert!(!text.contains("WorldInfo"), "{text}");
        assert!(text.contains("geometry Sphere {"), "{text}");
    }

    #[test]
    fn test_named_default_node_keeps_its_name() {
        let scene = Scene::new();
        let plain = scene.add_node(Node::new("Plain", Material::default()), false).unwrap();
        let look = scene
            .add_node(
                Node::anonymous(Appearance {
                    material: Some(plain),
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        let ball = scene.add_node(Node::anonymous(Sphere::default()), false).unwrap();
        let shape = ShapeNode {
            appearance: Some(look),
            geometry: Some(ball),
        };
        scene.add_node(Node::anonymous(shape), true).unwrap();

        let text = scene.to_vrml_string().unwrap();
        assert!(text.contains("material DEF Plain Material {"), "{text}");

        let reread = Scene::new();
        reread.read(text.as_bytes()).unwrap();
        let found = reread.find_node("Plain", Some(NodeType::Material)).unwrap();
        assert_eq!(reread.node(found).unwrap().kind, NodeKind::Material(Material::default()));
    }

    #[test]
    fn test_multi_line_info_round_trip() {
        let scene = Scene::new();
        scene.set_world_title("Notes");
        scene.add_world_info("first\nsecond # not a comment");
        scene.add_world_info("plain");

        let text = scene.to_vrml_string().unwrap();
        let reread = Scene::new();
        reread.read(text.as_bytes()).unwrap();
        let info = reread.world_info();
        assert_eq!(info.title, "Notes");
        assert_eq!(info.info, vec!["first\nsecond # not a comment", "plain"]);
    }

    #[test]
    fn test_import_failure_records_line() {
        let scene = Scene::new();
        let err = scene
            .read("#VRML V1.0 ascii\nSeparator { }\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.status(), ErrorStatus::NotVrmlFile);
        assert_eq!(scene.status(), ErrorStatus::NotVrmlFile);
        assert_eq!(scene.line_error(), 1);
        assert!(scene.top_level().is_empty());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_scaled_import_and_export() {
        let scene = Scene::with_config(&SceneConfig {
            linear_scale: 2.0,
            ..Default::default()
        });
        scene
            .read("#VRML V2.0 utf8\nShape { geometry DEF S Sphere { radius 5 } }\n".as_bytes())
            .unwrap();
        match find_kind(&scene, "S") {
            NodeKind::Sphere(s) => assert_eq!(s.radius, 10.0),
            other => panic!("expected a sphere, got {other:?}"),
        }
        let text = scene.to_vrml_string().unwrap();
        assert!(text.contains("radius 5"), "{text}");
    }

    #[test]
    fn test_add_node_from_other_scene_copies_subgraph() {
        let source = Scene::new();
        let ball = source.add_node(Node::new("Ball", Sphere::default()), false).unwrap();
        let shape = source
            .add_node(
                Node::new(
                    "Thing",
                    ShapeNode {
                        appearance: None,
                        geometry: Some(ball),
                    },
                ),
                true,
            )
            .unwrap();

        let target = Scene::new();
        target.add_node(Node::new("Ball", BoxNode::default()), true).unwrap();
        let copied = target.add_node_from(&source, shape, true).unwrap();

        assert_eq!(target.top_level().len(), 2);
        let copied_shape = match target.node(copied).unwrap().kind {
            NodeKind::Shape(s) => s,
            other => panic!("expected a shape, got {other:?}"),
        };
        let geometry = target.node(copied_shape.geometry.unwrap()).unwrap();
        assert_eq!(geometry.node_type(), NodeType::Sphere);
        assert_eq!(geometry.name(), "BallD");
        // the source is left untouched
        assert_eq!(source.node_count(), 3);
    }

    #[test]
    fn test_add_node_from_same_scene_reuses_node() {
        let scene = Scene::new();
        let ball = scene.add_node(Node::anonymous(Sphere::default()), false).unwrap();
        let count = scene.node_count();
        assert_eq!(scene.add_node_from(&scene, ball, true), Some(ball));
        assert_eq!(scene.node_count(), count);
        assert_eq!(scene.top_level(), vec![ball]);
    }

    #[test]
    fn test_dump() {
        let scene = Scene::new();
        let coord = scene
            .add_node(
                Node::anonymous(Coordinate {
                    points: vec![DVec3::ZERO; 8],
                }),
                false,
            )
            .unwrap();
        let mesh = scene
            .add_node(
                Node::anonymous(IndexedFaceSet {
                    coord: Some(coord),
                    coord_index: vec![IndexBlock::from(vec![0, 1, 2]); 6],
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        let shape = scene
            .add_node(
                Node::anonymous(ShapeNode {
                    appearance: None,
                    geometry: Some(mesh),
                }),
                false,
            )
            .unwrap();
        scene
            .add_node(Node::new("Top", Group::transform().with_children(vec![shape])), true)
            .unwrap();

        let dump = scene.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], " ===== Diagnostic Dump of a Scene (5 nodes)");
        assert_eq!(lines[1], "  Group (Transform) node: \"Top\"");
        assert_eq!(lines[2], "    Shape node");
        assert_eq!(lines[3], "      IndexedFaceSet (8 vertices, 6 polygons) node");
    }

    #[test]
    fn test_scene_usable_across_threads() {
        let scene = std::sync::Arc::new(Scene::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let scene = std::sync::Arc::clone(&scene);
                std::thread::spawn(move || {
                    scene.add_node(Node::new(format!("Ball{i}"), Sphere::default()), true)
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_some());
        }
        assert_eq!(scene.top_level().len(), 4);
    }

    #[test]
    fn test_write_error_sets_status() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let scene = Scene::new();
        scene.add_node(Node::anonymous(Sphere::default()), true).unwrap();
        let err = scene.write(&mut Broken).unwrap_err();
        assert!(err.is_unrecoverable());
        assert_eq!(scene.status(), ErrorStatus::UnrecoverableError);
    }
}
