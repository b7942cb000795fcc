//! JSON-LD output and record splitting.
//!
//! Serialization goes through Sophia's JSON-LD serializer, which emits the
//! expanded form: an array of node objects whose keys are full IRIs, with
//! `rdf:type` folded into `@type`. Parsing is handled by
//! [`RdfGraph::parse`](crate::RdfGraph::parse).

use crate::parse::sophia_graph;
use crate::{RdfError, RdfGraph, Result};
use serde_json::{Map, Value};
use sophia::api::prelude::*;
use sophia::jsonld::JsonLdSerializer;

/// Expanded JSON-LD text.
pub fn to_string(graph: &RdfGraph) -> Result<String> {
    let triples = sophia_graph(graph);
    let mut serializer = JsonLdSerializer::new_stringifier();
    serializer
        .serialize_dataset(&triples.as_dataset())
        .map_err(|e| RdfError::Serialize {
            format: "JSON-LD",
            message: e.to_string(),
        })?;
    Ok(serializer.as_str().to_string())
}

/// Serialize a graph as an expanded JSON-LD array of node objects.
pub fn to_expanded(graph: &RdfGraph) -> Result<Value> {
    serde_json::from_str(&to_string(graph)?).map_err(|e| RdfError::JsonLd(e.to_string()))
}

/// Split an expanded JSON-LD array into its top-level records.
pub fn records(value: Value) -> Result<Vec<Map<String, Value>>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(obj) => vec![Value::Object(obj)],
        other => {
            return Err(RdfError::JsonLd(format!(
                "expected an array of node objects, got {other}"
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(obj) => Ok(obj),
            other => Err(RdfError::JsonLd(format!("expected a node object, got {other}"))),
        })
        .collect()
}
