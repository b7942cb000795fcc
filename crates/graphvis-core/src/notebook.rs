//! Notebook Annotation Extractor.
//!
//! Executed notebooks produced by an activity are described with the
//! notebook ontology: the extractor turns a notebook into RDF (Turtle), the
//! RDF is re-serialized as expanded JSON-LD, and every top-level record
//! becomes an annotation stamped with the notebook's checksum.

use crate::annotation::{Annotation, ENTITY_CHECKSUM_KEY};
use crate::command::capture_stdout;
use crate::error::Result;
use crate::model::Activity;
use graphvis_rdf::{jsonld, RdfFormat, RdfGraph};
use serde_json::Value;
use std::path::Path;
use std::process::Command;

pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Notebook-to-RDF extraction backend.
pub trait NotebookOntology {
    /// Describe the notebook at `path` as Turtle.
    fn nb2rdf(&self, path: &Path) -> Result<String>;
}

/// Calls `nb2workflow.ontology.nb2rdf` through a Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonNb2Rdf {
    pub python: String,
}

impl PythonNb2Rdf {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

const NB2RDF_SCRIPT: &str = "import sys\nfrom nb2workflow import ontology\nsys.stdout.write(ontology.nb2rdf(sys.argv[1]))\n";

impl NotebookOntology for PythonNb2Rdf {
    fn nb2rdf(&self, path: &Path) -> Result<String> {
        capture_stdout(
            Command::new(&self.python)
                .arg("-c")
                .arg(NB2RDF_SCRIPT)
                .arg(path),
        )
    }
}

/// Annotations for every notebook generated by `activity`.
///
/// The first failing extraction aborts the whole call.
pub fn extract_notebook_annotations(
    activity: &Activity,
    ontology: &dyn NotebookOntology,
) -> Result<Vec<Annotation>> {
    let mut annotations = Vec::new();

    for generation in &activity.generations {
        let Some(entity) = generation.entity.first() else {
            continue;
        };
        if entity.extension() != Some(NOTEBOOK_EXTENSION) {
            continue;
        }

        tracing::info!(
            path = %entity.path.display(),
            id = %entity.id,
            "extracting metadata from the output notebook"
        );
        let turtle = ontology.nb2rdf(&entity.path)?;
        tracing::debug!(rdf = %turtle);

        let graph = RdfGraph::parse_str(&turtle, RdfFormat::Turtle)?;
        let records = jsonld::records(jsonld::to_expanded(&graph)?)?;

        for mut record in records {
            record.insert(
                ENTITY_CHECKSUM_KEY.to_string(),
                Value::String(entity.checksum.clone()),
            );
            let annotation = Annotation::from_record(&activity.id, record, &entity.path)?;
            tracing::debug!(id = %annotation.id, "found jsonLD annotation");
            annotations.push(annotation);
        }
    }

    Ok(annotations)
}
