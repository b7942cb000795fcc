//! Annotation Store Scanner.
//!
//! The auto-logging hook running inside the tool leaves one file per logged
//! call in the annotation directory. Each `.jsonld` file is read, turned into
//! an [`Annotation`] and deleted; deletion marks it as consumed, so a file is
//! never harvested twice. Plain `.json` files are only reported.
//!
//! There is no transactional guarantee: a failure on one file leaves the
//! files visited before it consumed and the rest untouched.

use crate::annotation::Annotation;
use crate::error::{GraphVisError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct AnnotationStore {
    dir: PathBuf,
}

impl AnnotationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Entries of the store, sorted by file name. Empty when the directory
    /// does not exist.
    fn entries(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                GraphVisError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
                }))
            })?;
            if entry.file_type().is_file() {
                out.push(entry.into_path());
            }
        }
        Ok(out)
    }

    /// Harvest every `.jsonld` record into an annotation of `activity_id`.
    pub fn harvest(&self, activity_id: &str) -> Result<Vec<Annotation>> {
        let entries = self.entries()?;
        if entries.is_empty() {
            tracing::info!(dir = %self.dir.display(), "nothing to harvest");
            return Ok(Vec::new());
        }

        let mut annotations = Vec::new();
        for path in entries {
            match path.extension().and_then(|e| e.to_str()) {
                Some("json") => {
                    tracing::info!(path = %path.display(), "found json annotation");
                    let content = fs::read_to_string(&path)?;
                    tracing::debug!(path = %path.display(), %content);
                }
                Some("jsonld") => {
                    let record = load_record(&path)?;
                    tracing::info!(path = %path.display(), "found jsonLD annotation");
                    tracing::debug!(
                        path = %path.display(),
                        record = %serde_json::to_string_pretty(&record).unwrap_or_default()
                    );
                    let annotation = Annotation::from_record(activity_id, record, &path)?;
                    fs::remove_file(&path)?;
                    annotations.push(annotation);
                }
                _ => {}
            }
        }
        Ok(annotations)
    }
}

fn load_record(path: &Path) -> Result<serde_json::Map<String, Value>> {
    let text = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(GraphVisError::NotAnObject(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("absent"));
        assert!(store.harvest("act").unwrap().is_empty());
    }

    #[test]
    fn non_object_record_is_rejected_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("list.jsonld");
        fs::write(&p, "[1, 2]").unwrap();
        let err = AnnotationStore::new(dir.path()).harvest("act").unwrap_err();
        assert!(matches!(err, GraphVisError::NotAnObject(_)));
        assert!(p.exists());
    }

    #[test]
    fn unreadable_json_report_aborts_the_harvest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0001.json"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(dir.path().join("0002.jsonld"), r#"{"@id": "urn:q"}"#).unwrap();
        let err = AnnotationStore::new(dir.path()).harvest("act").unwrap_err();
        assert!(matches!(err, GraphVisError::Io(_)));
        assert!(dir.path().join("0002.jsonld").exists());
    }

    #[test]
    fn other_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sitecustomize.py"), "print()").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert!(AnnotationStore::new(dir.path()).harvest("act").unwrap().is_empty());
        assert!(dir.path().join("sitecustomize.py").exists());
    }
}
