//! The slice of the host platform's provenance model the hooks consume.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub path: PathBuf,
    pub checksum: String,
}

impl Entity {
    /// Describe a file on disk, checksumming its content.
    pub fn from_file(id: impl Into<String>, path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            id: id.into(),
            path: path.to_path_buf(),
            checksum: file_checksum(path)?,
        })
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

/// Upstream data may attach a single entity or a sequence to one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    One(Entity),
    Many(Vec<Entity>),
}

impl EntityRef {
    /// The entity used for extraction: the first one when several are attached.
    pub fn first(&self) -> Option<&Entity> {
        match self {
            EntityRef::One(entity) => Some(entity),
            EntityRef::Many(list) => list.first(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub entity: EntityRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(default)]
    pub generations: Vec<Generation>,
}

impl Activity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            generations: Vec::new(),
        }
    }

    pub fn with_generation(mut self, entity: Entity) -> Self {
        self.generations.push(Generation {
            entity: EntityRef::One(entity),
        });
        self
    }
}

/// Descriptor of the tool about to run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tool {
    pub command: Vec<String>,
}

/// Last path segment of an activity id.
pub fn run_id(activity_id: &str) -> &str {
    activity_id.rsplit('/').next().unwrap_or(activity_id)
}

/// Hex SHA-256 of a file's content.
pub fn file_checksum(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_is_last_segment() {
        assert_eq!(run_id("https://renkulab.io/activities/abc123"), "abc123");
        assert_eq!(run_id("plain"), "plain");
    }

    #[test]
    fn generation_accepts_single_entity_or_sequence() {
        let single: Generation = serde_json::from_value(serde_json::json!({
            "entity": {"id": "e1", "path": "out.ipynb", "checksum": "c1"}
        }))
        .unwrap();
        assert_eq!(single.entity.first().map(|e| e.id.as_str()), Some("e1"));

        let many: Generation = serde_json::from_value(serde_json::json!({
            "entity": [
                {"id": "e2", "path": "a.ipynb", "checksum": "c2"},
                {"id": "e3", "path": "b.ipynb", "checksum": "c3"}
            ]
        }))
        .unwrap();
        assert_eq!(many.entity.first().map(|e| e.id.as_str()), Some("e2"));

        let empty = EntityRef::Many(Vec::new());
        assert!(empty.first().is_none());
    }

    #[test]
    fn checksum_is_stable_hex() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("x.txt");
        std::fs::write(&p, b"abc").unwrap();
        assert_eq!(
            file_checksum(&p).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
