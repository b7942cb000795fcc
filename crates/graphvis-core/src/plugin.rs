//! The hook pair the host platform calls around an activity.

use crate::annotation::Annotation;
use crate::config::GraphVisConfig;
use crate::error::Result;
use crate::hook::{ChildEnvironment, HookInstaller};
use crate::model::{Activity, Tool};
use crate::notebook::{extract_notebook_annotations, NotebookOntology, PythonNb2Rdf};
use crate::scanner::AnnotationStore;

/// Host plugin contract.
pub trait PluginHooks {
    /// Called before a tool executes. The returned environment must be
    /// applied to the tool's process.
    fn pre_run(&self, tool: &Tool) -> Result<ChildEnvironment>;

    /// Called once an activity completed; returns the annotations to attach.
    fn activity_annotations(&self, activity: &Activity) -> Result<Vec<Annotation>>;
}

pub struct GraphVisPlugin {
    config: GraphVisConfig,
    ontology: Box<dyn NotebookOntology>,
}

impl GraphVisPlugin {
    /// Plugin using the configured Python interpreter for notebook extraction.
    pub fn new(config: GraphVisConfig) -> Self {
        let ontology = Box::new(PythonNb2Rdf::new(config.python.clone()));
        Self { config, ontology }
    }

    pub fn with_ontology(config: GraphVisConfig, ontology: Box<dyn NotebookOntology>) -> Self {
        Self { config, ontology }
    }

    pub fn config(&self) -> &GraphVisConfig {
        &self.config
    }

    fn installer(&self) -> HookInstaller {
        HookInstaller::from_config(&self.config)
    }
}

impl PluginHooks for GraphVisPlugin {
    fn pre_run(&self, tool: &Tool) -> Result<ChildEnvironment> {
        tracing::info!(command = ?tool.command, "preparing query auto-logging hooks");
        self.installer().install()
    }

    fn activity_annotations(&self, activity: &Activity) -> Result<Vec<Annotation>> {
        if self.installer().remove_bootstrap()? {
            tracing::debug!(path = %self.config.bootstrap_path().display(), "removed interpreter bootstrap");
        }

        let mut annotations = extract_notebook_annotations(activity, self.ontology.as_ref())?;
        let store = AnnotationStore::new(self.config.annotation_dir());
        annotations.extend(store.harvest(&activity.id)?);

        tracing::info!(
            activity = %activity.id,
            count = annotations.len(),
            "collected annotations"
        );
        Ok(annotations)
    }
}
