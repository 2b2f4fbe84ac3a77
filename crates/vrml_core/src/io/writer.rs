//! VRML text export.
//!
//! Export runs the same traversal twice. The first pass has no output stream:
//! it only discovers anonymous nodes that are referenced more than once and
//! gives them synthetic names (`_1`, `_2`, ...). The second pass writes the
//! text, emitting `DEF name` on the first occurrence of a named node and
//! `USE name` on every later one.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use vrml_math::{DVec2, DVec3, Rotation, CONFUSION};

use crate::error::{VrmlError, VrmlResult};
use crate::node::{IndexBlock, NodeId};
use crate::scene::SceneData;

/// Header line of every exported file.
pub const VRML_HEADER: &str = "#VRML V2.0 utf8";

const MAX_INDENT: usize = 80;

/// How a written line changes the indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Keep,
    /// Increase after the line (opening a body).
    Increase,
    /// Decrease before the line (closing a body).
    Decrease,
}

/// State of one export pass.
pub struct WriteSession<'a> {
    data: &'a SceneData,
    out: Option<&'a mut dyn Write>,
    indent: usize,
    step: usize,
    emitted: HashSet<NodeId>,
    seen: HashSet<NodeId>,
    synthesized: HashMap<NodeId, String>,
    counter: usize,
}

impl<'a> WriteSession<'a> {
    /// Discovery pass: nothing is written.
    pub fn discovery(data: &'a SceneData) -> Self {
        Self::new(data, None)
    }

    /// Emission pass writing to `out`.
    pub fn emission(data: &'a SceneData, out: &'a mut dyn Write) -> Self {
        Self::new(data, Some(out))
    }

    fn new(data: &'a SceneData, out: Option<&'a mut dyn Write>) -> Self {
        Self {
            data,
            out,
            indent: 0,
            step: data.indent_step,
            emitted: HashSet::new(),
            seen: HashSet::new(),
            synthesized: HashMap::new(),
            counter: 0,
        }
    }

    pub fn is_discovery(&self) -> bool {
        self.out.is_none()
    }

    /// Names assigned to shared anonymous nodes during discovery.
    pub fn into_synthesized_names(self) -> HashMap<NodeId, String> {
        self.synthesized
    }

    /// Traverse the top-level sequence. The world-info node comes first when
    /// it carries anything.
    pub fn write_scene(&mut self) -> VrmlResult<()> {
        if !self.is_discovery() {
            self.write_raw(VRML_HEADER)?;
            self.write_raw("")?;
        }
        let data = self.data;
        let world_info = std::iter::once(data.world_info);
        for id in world_info.chain(data.top_level.iter().copied()) {
            match self.write_node(None, Some(id)) {
                Ok(()) | Err(VrmlError::NotImplemented(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn name_of(&self, id: NodeId) -> &str {
        if let Some(name) = self.synthesized.get(&id) {
            return name;
        }
        self.data.node(id).map(|node| node.name()).unwrap_or("")
    }

    fn name_taken(&self, name: &str) -> bool {
        self.data.names.contains_key(name) || self.synthesized.values().any(|n| n == name)
    }

    /// Write one node reference. `None` and anonymous default-valued nodes
    /// produce nothing; a named node is always written so its name survives.
    pub fn write_node(&mut self, prefix: Option<&str>, id: Option<NodeId>) -> VrmlResult<()> {
        let Some(id) = id else {
            return Ok(());
        };
        let data = self.data;
        let node = data
            .node(id)
            .ok_or_else(|| VrmlError::format(format!("dangling node handle {}", id.index())))?;
        let name = self.name_of(id).to_string();
        let blank = name.trim_matches([' ', '\t']).is_empty();
        if blank && node.kind.is_default(data) {
            return Ok(());
        }

        if name.is_empty() {
            if self.is_discovery() && !self.seen.insert(id) {
                let auto = loop {
                    self.counter += 1;
                    let candidate = format!("_{}", self.counter);
                    if !self.name_taken(&candidate) {
                        break candidate;
                    }
                };
                log::debug!("Shared anonymous {} node named {auto}", node.node_type().name());
                self.synthesized.insert(id, auto);
                // do not descend again below a shared node
                return Ok(());
            }
            return node.kind.write(self, prefix);
        }

        if blank {
            return node.kind.write(self, prefix);
        }

        if self.emitted.contains(&id) {
            return self.write_line(prefix, &format!("USE {name}"), Indent::Keep);
        }
        let def = match prefix {
            Some(prefix) => format!("{prefix} DEF {name}"),
            None => format!("DEF {name}"),
        };
        let result = node.kind.write(self, Some(&def));
        self.emitted.insert(id);
        result
    }

    /// Write a line at the current indentation. Indentation never goes
    /// below zero and is capped at 80 spaces.
    pub fn write_line(&mut self, lin0: Option<&str>, lin1: &str, indent: Indent) -> VrmlResult<()> {
        if indent == Indent::Decrease {
            self.indent = self.indent.saturating_sub(self.step);
        }
        if let Some(out) = self.out.as_mut() {
            let spaces = self.indent.min(MAX_INDENT);
            match lin0 {
                Some(lin0) => writeln!(out, "{:spaces$}{lin0} {lin1}", "")?,
                None => writeln!(out, "{:spaces$}{lin1}", "")?,
            }
        }
        if indent == Indent::Increase {
            self.indent += self.step;
        }
        Ok(())
    }

    fn write_raw(&mut self, line: &str) -> VrmlResult<()> {
        if let Some(out) = self.out.as_mut() {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    /// Opening line of a node body, e.g. `geometry DEF Ball Sphere {`.
    pub fn begin_node(&mut self, prefix: Option<&str>, keyword: &str) -> VrmlResult<()> {
        self.write_line(prefix, &format!("{keyword} {{"), Indent::Increase)
    }

    pub fn end_node(&mut self) -> VrmlResult<()> {
        self.write_line(None, "}", Indent::Decrease)
    }

    fn unscale(&self, value: f64, is_scale: bool) -> f64 {
        if is_scale && self.data.linear_scale > CONFUSION {
            value / self.data.linear_scale
        } else {
            value
        }
    }

    pub fn write_scalar(&mut self, label: &str, value: f64, is_scale: bool) -> VrmlResult<()> {
        let text = format_real(self.unscale(value, is_scale));
        self.write_line(Some(label), &text, Indent::Keep)
    }

    pub fn write_vec3(&mut self, label: &str, value: DVec3, is_scale: bool) -> VrmlResult<()> {
        let text = self.vec3_text(value, is_scale);
        self.write_line(Some(label), &text, Indent::Keep)
    }

    pub fn write_bool(&mut self, label: &str, value: bool) -> VrmlResult<()> {
        self.write_line(Some(label), if value { "TRUE" } else { "FALSE" }, Indent::Keep)
    }

    pub fn write_rotation(&mut self, label: &str, value: Rotation) -> VrmlResult<()> {
        let text = format!("{} {}", self.vec3_text(value.axis, false), format_real(value.angle));
        self.write_line(Some(label), &text, Indent::Keep)
    }

    pub fn write_string(&mut self, label: &str, value: &str) -> VrmlResult<()> {
        self.write_line(Some(label), &quote(value), Indent::Keep)
    }

    pub fn write_string_list(&mut self, label: &str, values: &[String]) -> VrmlResult<()> {
        match values {
            [] => Ok(()),
            [single] => self.write_string(label, single),
            _ => {
                self.write_line(Some(label), "[", Indent::Increase)?;
                for value in values {
                    self.write_line(None, &format!("{},", quote(value)), Indent::Keep)?;
                }
                self.write_line(None, "]", Indent::Decrease)
            }
        }
    }

    /// Bracketed MFVec3f / MFColor, one triple per line. Empty arrays are
    /// not written.
    pub fn write_vec3_array(&mut self, label: &str, values: &[DVec3], is_scale: bool) -> VrmlResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.write_line(Some(label), "[", Indent::Increase)?;
        for &value in values {
            let text = format!("{},", self.vec3_text(value, is_scale));
            self.write_line(None, &text, Indent::Keep)?;
        }
        self.write_line(None, "]", Indent::Decrease)
    }

    pub fn write_vec2_array(&mut self, label: &str, values: &[DVec2]) -> VrmlResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.write_line(Some(label), "[", Indent::Increase)?;
        for value in values {
            let text = format!("{} {},", format_real(value.x), format_real(value.y));
            self.write_line(None, &text, Indent::Keep)?;
        }
        self.write_line(None, "]", Indent::Decrease)
    }

    /// Index blocks as `a,b,c,-1,`; the last block ends with `-1`. Long
    /// blocks wrap once the line passes the width limit.
    pub fn write_index_blocks(&mut self, label: &str, blocks: &[IndexBlock]) -> VrmlResult<()> {
        if blocks.is_empty() || self.is_discovery() {
            return Ok(());
        }
        self.write_line(Some(label), "[", Indent::Increase)?;
        let limit = if self.indent < 41 { 36 } else { 100 };
        for (i, block) in blocks.iter().enumerate() {
            let mut buf = String::new();
            for value in block.iter() {
                buf.push_str(&value.to_string());
                buf.push(',');
                if buf.len() > limit {
                    self.write_line(None, &buf, Indent::Keep)?;
                    buf.clear();
                }
            }
            let terminator = if i + 1 < blocks.len() { "-1," } else { "-1" };
            if buf.is_empty() {
                self.write_line(None, terminator, Indent::Keep)?;
            } else {
                self.write_line(Some(&buf), terminator, Indent::Keep)?;
            }
        }
        self.write_line(None, "]", Indent::Decrease)
    }

    /// A node-valued field holding a list, e.g. `children [ ... ]`.
    pub fn write_node_list(&mut self, label: &str, ids: &[NodeId]) -> VrmlResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.write_line(Some(label), "[", Indent::Increase)?;
        for &id in ids {
            match self.write_node(None, Some(id)) {
                Ok(()) | Err(VrmlError::NotImplemented(_)) => {}
                Err(err) => return Err(err),
            }
        }
        self.write_line(None, "]", Indent::Decrease)
    }

    fn vec3_text(&self, value: DVec3, is_scale: bool) -> String {
        format!(
            "{} {} {}",
            format_real(self.unscale(value.x, is_scale)),
            format_real(self.unscale(value.y, is_scale)),
            format_real(self.unscale(value.z, is_scale))
        )
    }
}

/// Shortest text that reads back to the same value. Very large or very small
/// magnitudes use exponent notation.
pub fn format_real(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if (1.0e-5..1.0e15).contains(&magnitude) {
        value.to_string()
    } else {
        format!("{value:e}")
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
