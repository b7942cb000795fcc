//! Text serializations (Turtle, N-Triples, RDF/XML) through Sophia.

use crate::parse::sophia_graph;
use crate::{RdfError, RdfGraph, RdfNode, RdfObject, Result};
use sophia::api::prefix::{Prefix, PrefixMapPair};
use sophia::api::prelude::*;
use sophia::turtle::serializer::nt::NtSerializer;
use sophia::turtle::serializer::turtle::{TurtleConfig, TurtleSerializer};
use sophia::xml::serializer::RdfXmlSerializer;
use std::collections::BTreeSet;

/// Prefixes used when compacting IRIs, both in Turtle output and in labels.
pub const KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("schema", "http://schema.org/"),
    ("oa", "http://www.w3.org/ns/oa#"),
    ("renku", "https://swissdatasciencecenter.github.io/renku-ontology#"),
    ("oda", "http://odahub.io/ontology#"),
];

fn is_pn_local(s: &str) -> bool {
    !s.is_empty()
        && !s.ends_with('.')
        && s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// `prefix:local` for IRIs under a known namespace, if the local part is a
/// valid Turtle local name.
pub fn compact_iri(iri: &str) -> Option<String> {
    KNOWN_PREFIXES.iter().find_map(|(prefix, ns)| {
        let local = iri.strip_prefix(ns)?;
        is_pn_local(local).then(|| format!("{prefix}:{local}"))
    })
}

fn used_prefixes(graph: &RdfGraph) -> Vec<PrefixMapPair> {
    let mut used = BTreeSet::new();
    let mut note = |iri: &str| {
        if let Some(curie) = compact_iri(iri) {
            if let Some((prefix, _)) = curie.split_once(':') {
                used.insert(prefix.to_string());
            }
        }
    };
    for t in graph {
        if let RdfNode::Iri(iri) = &t.subject {
            note(iri);
        }
        note(&t.predicate);
        match &t.object {
            RdfObject::Node(RdfNode::Iri(iri)) => note(iri),
            RdfObject::Literal(lit) => {
                if let Some(dt) = lit.effective_datatype() {
                    note(dt);
                }
            }
            RdfObject::Node(RdfNode::BlankNode(_)) => {}
        }
    }
    KNOWN_PREFIXES
        .iter()
        .filter(|(prefix, _)| used.contains(*prefix))
        .map(|(prefix, ns)| {
            (
                Prefix::new_unchecked(Box::from(*prefix)),
                Iri::new_unchecked(Box::from(*ns)),
            )
        })
        .collect()
}

fn serialize_error(format: &'static str, e: impl std::fmt::Display) -> RdfError {
    RdfError::Serialize {
        format,
        message: e.to_string(),
    }
}

/// Serialize as N-Triples, one statement per line in graph order.
pub fn to_ntriples(graph: &RdfGraph) -> Result<String> {
    let mut nt = NtSerializer::new_stringifier();
    nt.serialize_graph(&sophia_graph(graph))
        .map_err(|e| serialize_error("N-Triples", e))?;
    Ok(nt.as_str().to_string())
}

/// Serialize as Turtle, grouping statements by subject and predicate.
///
/// Only the prefixes actually used are declared.
pub fn to_turtle(graph: &RdfGraph) -> Result<String> {
    let config = TurtleConfig::new()
        .with_pretty(true)
        .with_own_prefix_map(used_prefixes(graph));
    let mut ttl = TurtleSerializer::new_stringifier_with_config(config);
    ttl.serialize_graph(&sophia_graph(graph))
        .map_err(|e| serialize_error("Turtle", e))?;
    Ok(ttl.as_str().to_string())
}

pub fn to_rdfxml(graph: &RdfGraph) -> Result<String> {
    let mut xml = RdfXmlSerializer::new_stringifier();
    xml.serialize_graph(&sophia_graph(graph))
        .map_err(|e| serialize_error("RDF/XML", e))?;
    Ok(xml.as_str().to_string())
}
