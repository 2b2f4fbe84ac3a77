//! Node factory: turns the token stream into nodes of a scene arena.

use std::io::BufRead;
use std::mem;

use super::reader::VrmlReader;
use crate::error::{VrmlError, VrmlResult};
use crate::node::{Node, NodeId, NodeKind, NodeType, Unknown};
use crate::scene::SceneData;

/// Header prefix every VRML 2.0 file starts with.
pub const HEADER_PREFIX: &[u8] = b"#VRML V2.0";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Node kinds a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeConstraint {
    Any,
    Exactly(NodeType),
    /// Box, Cone, Cylinder, Sphere, IndexedFaceSet or IndexedLineSet.
    Geometry,
    Texture,
    /// A field whose node kinds are not modelled; no supported node fits.
    Unsupported,
}

impl NodeConstraint {
    /// Unknown nodes pass every constraint; callers drop them instead.
    pub fn accepts(self, ty: NodeType) -> bool {
        if ty == NodeType::Unknown {
            return true;
        }
        match self {
            NodeConstraint::Any => true,
            NodeConstraint::Exactly(expected) => ty == expected,
            NodeConstraint::Geometry => ty.is_geometry(),
            NodeConstraint::Texture => ty == NodeType::ImageTexture,
            NodeConstraint::Unsupported => false,
        }
    }
}

/// Reads nodes from a VRML stream into a scene.
pub struct Importer<'a, R> {
    data: &'a mut SceneData,
    reader: VrmlReader<R>,
    /// Nodes whose bodies are being read, outermost first.
    open: Vec<NodeId>,
}

impl<'a, R: BufRead> Importer<'a, R> {
    pub fn new(data: &'a mut SceneData, input: R) -> Self {
        let linear_scale = data.linear_scale;
        Self {
            data,
            reader: VrmlReader::new(input, linear_scale),
            open: Vec::new(),
        }
    }

    pub fn reader(&mut self) -> &mut VrmlReader<R> {
        &mut self.reader
    }

    /// Line of the input the importer has reached.
    pub fn line(&self) -> usize {
        self.reader.line_count()
    }

    /// Read the whole stream. Reaching the end of input between nodes is
    /// success.
    pub fn read_scene(&mut self) -> VrmlResult<()> {
        match self.read_header() {
            Err(VrmlError::EndOfFile) => return Ok(()),
            other => other?,
        }
        let mut count = 0usize;
        loop {
            match self.reader.next_significant() {
                Err(VrmlError::EndOfFile) => break,
                other => other?,
            }
            let Some(id) = self.read_node(NodeConstraint::Any)? else {
                continue;
            };
            count += 1;
            match &self.data.nodes[id.index].kind {
                NodeKind::WorldInfo(info) => {
                    if !info.is_default() {
                        let info = info.clone();
                        self.data.merge_world_info(&info);
                        log::debug!("Merged WorldInfo declared at line {}", self.line());
                    }
                }
                NodeKind::Unknown(unknown) => {
                    log::debug!("Dropping top-level {:?} placeholder", unknown.title);
                }
                _ => self.data.top_level.push(id),
            }
        }
        log::info!(
            "Read {} top-level declarations over {} lines",
            count,
            self.line()
        );
        Ok(())
    }

    /// Check the first line of the input.
    fn read_header(&mut self) -> VrmlResult<()> {
        let cursor = self.reader.cursor();
        cursor.read_raw_line()?;
        let line = cursor.rest();
        let line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
        if line.starts_with(HEADER_PREFIX) {
            Ok(())
        } else {
            Err(VrmlError::NotVrmlFile)
        }
    }

    /// Read one node declaration: `USE name`, `NULL`, `DEF name Type { ... }`
    /// or `Type { ... }`. `ROUTE` and `EXTERNPROTO` statements are consumed
    /// and yield `None`, like `NULL`.
    pub fn read_node(&mut self, constraint: NodeConstraint) -> VrmlResult<Option<NodeId>> {
        let keyword = self.reader.read_word()?;
        match keyword.as_str() {
            "USE" => {
                let name = self.reader.read_word()?;
                let id = self
                    .data
                    .find_node(&name, None)
                    .ok_or_else(|| VrmlError::NodeNameUnknown(name.clone()))?;
                if self.open.contains(&id) {
                    return Err(VrmlError::format(format!("USE {name} inside its own definition")));
                }
                let ty = self.data.nodes[id.index].node_type();
                if !constraint.accepts(ty) {
                    return Err(VrmlError::format(format!(
                        "USE {name}: {} node is not allowed here",
                        ty.name()
                    )));
                }
                Ok(Some(id))
            }
            "NULL" => Ok(None),
            "DEF" => {
                let name = self.reader.read_word()?;
                let keyword = self.reader.read_word()?;
                self.create_node(name, keyword, constraint).map(Some)
            }
            "ROUTE" => {
                for _ in 0..3 {
                    self.reader.read_word()?;
                }
                Ok(None)
            }
            "EXTERNPROTO" => {
                let title = self.reader.read_word()?;
                self.reader.expect(b'[')?;
                self.reader.skip_bracketed(b'[', b']')?;
                self.reader.read_string_list()?;
                log::debug!("Skipped EXTERNPROTO {title}");
                Ok(None)
            }
            _ => self.create_node(String::new(), keyword, constraint).map(Some),
        }
    }

    fn create_node(
        &mut self,
        name: String,
        keyword: String,
        constraint: NodeConstraint,
    ) -> VrmlResult<NodeId> {
        let kind = if keyword == "PROTO" {
            let title = self.reader.read_word()?;
            self.reader.expect(b'[')?;
            self.reader.skip_bracketed(b'[', b']')?;
            log::debug!("Skipped declaration of PROTO {title}");
            NodeKind::Unknown(Unknown { title })
        } else {
            NodeKind::for_keyword(&keyword)
                .unwrap_or_else(|| NodeKind::Unknown(Unknown { title: keyword }))
        };

        let ty = kind.node_type();
        let id = self.data.insert(Node::new(name, kind));
        if !constraint.accepts(ty) {
            return Err(VrmlError::format(format!(
                "{} node is not allowed here",
                ty.name()
            )));
        }
        self.reader.expect(b'{')?;

        let mut kind = mem::take(&mut self.data.nodes[id.index].kind);
        self.open.push(id);
        let result = kind.read_fields(self);
        self.open.pop();
        self.data.nodes[id.index].kind = kind;
        result?;
        Ok(id)
    }

    /// Read a node-valued field. Placeholders for unsupported nodes are
    /// dropped and read as `NULL`.
    pub fn read_link(&mut self, constraint: NodeConstraint) -> VrmlResult<Option<NodeId>> {
        let id = self.read_node(constraint)?;
        Ok(id.filter(|&id| {
            let unknown = self.data.nodes[id.index].node_type() == NodeType::Unknown;
            if unknown {
                log::debug!("Ignoring link to unsupported node at line {}", self.reader.line_count());
            }
            !unknown
        }))
    }

    /// Read an MFNode field: a bracketed list or a single node.
    pub fn read_children(&mut self, constraint: NodeConstraint) -> VrmlResult<Vec<NodeId>> {
        let mut children = Vec::new();
        if self.reader.accept(b'[')? {
            while !self.reader.accept(b']')? {
                children.extend(self.read_link(constraint)?);
            }
        } else {
            children.extend(self.read_link(constraint)?);
        }
        Ok(children)
    }
}
