//! Plugin configuration.
//!
//! Defaults match a Renku project layout; every field can be overridden
//! through a `GRAPHVIS_*` environment variable.

use crate::error::{GraphVisError, Result};
use std::path::{Path, PathBuf};

pub const BOOTSTRAP_FILE_NAME: &str = "sitecustomize.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphVisConfig {
    /// Project metadata root (relative paths resolve against the project dir).
    pub metadata_path: PathBuf,
    /// Sub-directory of `metadata_path` holding sidecar annotations and the bootstrap file.
    pub graphvis_dir: String,
    /// Interpreter used for notebook extraction and exported in child environments.
    pub python: String,
    /// Graphviz program used to render images.
    pub dot_program: String,
    /// Renku CLI used to export the provenance graph.
    pub renku_program: String,
    /// Host serving the project sessions.
    pub session_host: String,
}

impl Default for GraphVisConfig {
    fn default() -> Self {
        Self {
            metadata_path: PathBuf::from(".renku"),
            graphvis_dir: "graphvis".to_string(),
            python: "python3".to_string(),
            dot_program: "dot".to_string(),
            renku_program: "renku".to_string(),
            session_host: "renkulab.io".to_string(),
        }
    }
}

impl GraphVisConfig {
    /// Defaults overridden by `GRAPHVIS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup("GRAPHVIS_METADATA_PATH") {
            config.metadata_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("GRAPHVIS_DIR") {
            config.graphvis_dir = v;
        }
        if let Some(v) = lookup("GRAPHVIS_PYTHON") {
            config.python = v;
        }
        if let Some(v) = lookup("GRAPHVIS_DOT") {
            config.dot_program = v;
        }
        if let Some(v) = lookup("GRAPHVIS_RENKU") {
            config.renku_program = v;
        }
        if let Some(v) = lookup("GRAPHVIS_SESSION_HOST") {
            config.session_host = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.graphvis_dir.trim().is_empty() {
            return Err(GraphVisError::Config("GRAPHVIS_DIR must not be empty".to_string()));
        }
        if Path::new(&self.graphvis_dir).is_absolute() {
            return Err(GraphVisError::Config(format!(
                "GRAPHVIS_DIR must be relative to the metadata path, got `{}`",
                self.graphvis_dir
            )));
        }
        if self.session_host.trim().is_empty() || self.session_host.contains('/') {
            return Err(GraphVisError::Config(format!(
                "GRAPHVIS_SESSION_HOST must be a bare host name, got `{}`",
                self.session_host
            )));
        }
        Ok(())
    }

    /// Resolve a relative `metadata_path` against `project_dir`.
    pub fn for_project(mut self, project_dir: &Path) -> Self {
        if self.metadata_path.is_relative() {
            self.metadata_path = project_dir.join(&self.metadata_path);
        }
        self
    }

    /// Directory scanned for sidecar annotations.
    pub fn annotation_dir(&self) -> PathBuf {
        self.metadata_path.join(&self.graphvis_dir)
    }

    /// Location of the interpreter bootstrap file.
    pub fn bootstrap_path(&self) -> PathBuf {
        self.annotation_dir().join(BOOTSTRAP_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_follow_renku_layout() {
        let config = GraphVisConfig::default().for_project(Path::new("/work/proj"));
        assert_eq!(config.annotation_dir(), PathBuf::from("/work/proj/.renku/graphvis"));
        assert_eq!(
            config.bootstrap_path(),
            PathBuf::from("/work/proj/.renku/graphvis/sitecustomize.py")
        );
    }

    #[test]
    fn env_overrides_apply() -> Result<()> {
        let config = GraphVisConfig::from_lookup(lookup(&[
            ("GRAPHVIS_METADATA_PATH", "/abs/meta"),
            ("GRAPHVIS_SESSION_HOST", "gitlab.example.org"),
            ("GRAPHVIS_DOT", "/opt/graphviz/bin/dot"),
        ]))?
        .for_project(Path::new("/ignored"));
        assert_eq!(config.annotation_dir(), PathBuf::from("/abs/meta/graphvis"));
        assert_eq!(config.session_host, "gitlab.example.org");
        assert_eq!(config.dot_program, "/opt/graphviz/bin/dot");
        assert_eq!(config.python, "python3");
        Ok(())
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        assert!(matches!(
            GraphVisConfig::from_lookup(lookup(&[("GRAPHVIS_DIR", "  ")])),
            Err(GraphVisError::Config(_))
        ));
        assert!(matches!(
            GraphVisConfig::from_lookup(lookup(&[("GRAPHVIS_SESSION_HOST", "https://x/y")])),
            Err(GraphVisError::Config(_))
        ));
    }
}
