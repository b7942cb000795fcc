//! Annotation records attached to an activity.

use crate::error::{GraphVisError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// `source` of every annotation produced by this plugin.
pub const ANNOTATION_SOURCE: &str = "AQS plugin";

/// Key injected into notebook records, holding the notebook's checksum.
pub const ENTITY_CHECKSUM_KEY: &str = "http://odahub.io/ontology#entity_checksum";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub source: String,
    pub body: Map<String, Value>,
}

impl Annotation {
    /// Build the annotation for one JSON-LD record of `activity_id`.
    ///
    /// `origin` names where the record came from and only appears in the
    /// error when `@id` is missing.
    pub fn from_record(activity_id: &str, body: Map<String, Value>, origin: &Path) -> Result<Self> {
        let model_id = match body.get("@id") {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(GraphVisError::MissingField {
                    path: origin.to_path_buf(),
                    field: "@id",
                })
            }
        };
        Ok(Self {
            id: annotation_id(activity_id, &model_id),
            source: ANNOTATION_SOURCE.to_string(),
            body,
        })
    }
}

pub fn annotation_id(activity_id: &str, model_id: &str) -> String {
    format!("{activity_id}/annotations/aqs/{model_id}")
}
