use std::io::BufRead;

use super::unknown_field;
use crate::error::VrmlResult;
use crate::io::import::Importer;
use crate::io::writer::WriteSession;

/// Document title and free-form information lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldInfo {
    pub title: String,
    pub info: Vec<String>,
}

impl WorldInfo {
    pub fn is_default(&self) -> bool {
        self.title.is_empty() && self.info.is_empty()
    }

    /// Fold another declaration into this one: info lines are appended and
    /// a non-empty title replaces the current one.
    pub fn merge(&mut self, other: &WorldInfo) {
        if !other.title.is_empty() {
            self.title = other.title.clone();
        }
        self.info.extend(other.info.iter().cloned());
    }

    pub(crate) fn read_field<R: BufRead>(&mut self, imp: &mut Importer<'_, R>, field: &str) -> VrmlResult<()> {
        match field {
            "title" => self.title = imp.reader().read_string()?,
            "info" => self.info = imp.reader().read_string_list()?,
            _ => return Err(unknown_field("WorldInfo", field)),
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut WriteSession<'_>, prefix: Option<&str>) -> VrmlResult<()> {
        w.begin_node(prefix, "WorldInfo")?;
        if !self.title.is_empty() {
            w.write_string("title", &self.title)?;
        }
        w.write_string_list("info", &self.info)?;
        w.end_node()
    }
}

/// Placeholder for a node of an unsupported type or a PROTO declaration.
/// Its body is skipped on import and it is never written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unknown {
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_world_info() {
        let mut base = WorldInfo::default();
        assert!(base.is_default());

        base.merge(&WorldInfo {
            title: "First".into(),
            info: vec!["a".into()],
        });
        base.merge(&WorldInfo {
            title: String::new(),
            info: vec!["b".into()],
        });
        assert_eq!(base.title, "First");
        assert_eq!(base.info, vec!["a", "b"]);
        assert!(!base.is_default());
    }
}
