//! Environment Hook Installer.
//!
//! Before a tool runs, a `sitecustomize.py` is written into the annotation
//! directory. Python imports that module at start-up when its directory is on
//! `PYTHONPATH`, which switches on auto-logging in the query library; the
//! logged calls come back as sidecar files for the scanner.
//!
//! The search path is not mutated process-wide. The installer returns a
//! [`ChildEnvironment`] that is applied to each child [`Command`], composed
//! from the inherited value every time, so repeated installs never stack
//! duplicate prefixes.

use crate::config::GraphVisConfig;
use crate::error::Result;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const SEARCH_PATH_VAR: &str = "PYTHONPATH";

pub const BOOTSTRAP_SOURCE: &str = r#"
import sys
sys.stderr.write("\033[31menabling hooks for astroquery\033[0m\n")

import aqsconverters.aq

aqsconverters.aq.autolog()
"#;

/// Environment overrides for a tool process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEnvironment {
    vars: Vec<(String, OsString)>,
}

impl ChildEnvironment {
    pub fn vars(&self) -> &[(String, OsString)] {
        &self.vars
    }

    pub fn get(&self, key: &str) -> Option<&OsString> {
        self.vars.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn apply<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.envs(self.vars.iter().map(|(k, v)| (k.as_str(), v.as_os_str())))
    }
}

/// Prepend `dir` to an inherited search path.
pub fn compose_search_path(dir: &Path, inherited: Option<OsString>) -> Result<OsString> {
    let mut parts: Vec<PathBuf> = vec![dir.to_path_buf()];
    if let Some(inherited) = inherited.filter(|v| !v.is_empty()) {
        parts.extend(std::env::split_paths(&inherited));
    }
    std::env::join_paths(parts).map_err(|e| {
        crate::error::GraphVisError::Config(format!("cannot build {SEARCH_PATH_VAR}: {e}"))
    })
}

pub struct HookInstaller {
    dir: PathBuf,
}

impl HookInstaller {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &GraphVisConfig) -> Self {
        Self::new(config.annotation_dir())
    }

    pub fn bootstrap_path(&self) -> PathBuf {
        self.dir.join(crate::config::BOOTSTRAP_FILE_NAME)
    }

    /// Ensure the directory, (over)write the bootstrap file, and compose the
    /// child environment from this process's current `PYTHONPATH`.
    pub fn install(&self) -> Result<ChildEnvironment> {
        self.install_with(std::env::var_os(SEARCH_PATH_VAR))
    }

    pub fn install_with(&self, inherited: Option<OsString>) -> Result<ChildEnvironment> {
        fs::create_dir_all(&self.dir)?;

        let path = self.bootstrap_path();
        tracing::info!(path = %path.display(), "writing interpreter bootstrap");
        fs::write(&path, BOOTSTRAP_SOURCE)?;

        let search_path = compose_search_path(&self.dir, inherited)?;
        Ok(ChildEnvironment {
            vars: vec![(SEARCH_PATH_VAR.to_string(), search_path)],
        })
    }

    /// Delete a bootstrap left from a previous run. Returns whether one existed.
    pub fn remove_bootstrap(&self) -> Result<bool> {
        let path = self.bootstrap_path();
        if path.exists() {
            fs::remove_file(&path)?;
            return Ok(true);
        }
        Ok(false)
    }
}
