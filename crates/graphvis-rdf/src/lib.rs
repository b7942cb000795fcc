//! RDF graph model for GraphVis.
//!
//! This crate holds the small amount of RDF machinery the plugin needs:
//!
//! - parsing and serializing Turtle, N-Triples, RDF/XML (`turtle`) and
//!   JSON-LD (`jsonld`) through **Sophia**,
//! - narrowing a provenance graph to a path selection (`select`),
//! - rendering a graph as Graphviz DOT (`dot`).
//!
//! The term model is plain (owned strings, total ordering): a graph
//! iterates in a stable order and every rendering is deterministic for
//! identical graph content.

pub mod dot;
pub mod jsonld;
mod parse;
pub mod select;
pub mod turtle;

use std::collections::BTreeSet;
use std::path::Path;

pub const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_STRING_IRI: &str = "http://www.w3.org/2001/XMLSchema#string";

#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("failed to serialize {format}: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },
    #[error("invalid JSON-LD: {0}")]
    JsonLd(String),
    #[error("unsupported RDF format: .{0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, RdfError>;

// ============================================================================
// Term model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfNode {
    Iri(String),
    BlankNode(String),
}

impl RdfNode {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    /// The IRI, or `_:label` for a blank node.
    pub fn as_id(&self) -> String {
        match self {
            RdfNode::Iri(iri) => iri.clone(),
            RdfNode::BlankNode(bn) => format!("_:{bn}"),
        }
    }

    /// Inverse of [`RdfNode::as_id`].
    pub fn from_id(id: &str) -> Self {
        match id.strip_prefix("_:") {
            Some(bn) => RdfNode::BlankNode(bn.to_string()),
            None => RdfNode::Iri(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RdfLiteral {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl RdfLiteral {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Datatype, with `xsd:string` folded into "no datatype".
    pub fn effective_datatype(&self) -> Option<&str> {
        self.datatype
            .as_deref()
            .filter(|dt| *dt != XSD_STRING_IRI)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

impl RdfObject {
    pub fn as_literal(&self) -> Option<&RdfLiteral> {
        match self {
            RdfObject::Literal(lit) => Some(lit),
            RdfObject::Node(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: RdfNode,
    pub predicate: String,
    pub object: RdfObject,
}

impl Triple {
    pub fn new(subject: RdfNode, predicate: impl Into<String>, object: RdfObject) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// Last `#`/`/` segment of an IRI.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

// ============================================================================
// Graph
// ============================================================================

/// A set of triples (RDF set semantics, stable iteration order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdfGraph {
    triples: BTreeSet<Triple>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    RdfXml,
    JsonLd,
}

impl RdfFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "nt" | "ntriples" => Ok(Self::NTriples),
            "ttl" | "turtle" => Ok(Self::Turtle),
            "rdf" | "owl" | "xml" => Ok(Self::RdfXml),
            "jsonld" | "json" => Ok(Self::JsonLd),
            other => Err(RdfError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl RdfGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the triple was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Distinct subjects, in order.
    pub fn subjects(&self) -> BTreeSet<&RdfNode> {
        self.triples.iter().map(|t| &t.subject).collect()
    }

    /// Objects of `subject` whose predicate IRI has the given local name.
    pub fn objects_by_local_name<'a>(
        &'a self,
        subject: &'a RdfNode,
        predicate_local: &'a str,
    ) -> impl Iterator<Item = &'a RdfObject> + 'a {
        self.triples
            .iter()
            .filter(move |t| &t.subject == subject && local_name(&t.predicate) == predicate_local)
            .map(|t| &t.object)
    }

    /// `rdf:type` IRIs of `subject`.
    pub fn types_of<'a>(&'a self, subject: &'a RdfNode) -> impl Iterator<Item = &'a str> + 'a {
        self.triples
            .iter()
            .filter(move |t| &t.subject == subject && t.predicate == RDF_TYPE_IRI)
            .filter_map(|t| match &t.object {
                RdfObject::Node(RdfNode::Iri(iri)) => Some(iri.as_str()),
                _ => None,
            })
    }

    pub fn parse_str(text: &str, format: RdfFormat) -> Result<Self> {
        Self::parse(text.as_bytes(), format)
    }

    pub fn parse(bytes: &[u8], format: RdfFormat) -> Result<Self> {
        Ok(parse::parse_with_sophia(bytes, format)?.into_iter().collect())
    }

    /// Render in the given serialization.
    pub fn serialize(&self, format: RdfFormat) -> Result<String> {
        match format {
            RdfFormat::NTriples => turtle::to_ntriples(self),
            RdfFormat::Turtle => turtle::to_turtle(self),
            RdfFormat::RdfXml => turtle::to_rdfxml(self),
            RdfFormat::JsonLd => jsonld::to_string(self),
        }
    }

    /// Load a graph from a file, choosing the parser from its extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let format = RdfFormat::from_extension(&ext)?;
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes, format)
    }
}

impl FromIterator<Triple> for RdfGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RdfGraph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTEBOOK_TTL: &str = r#"
@prefix oda: <http://odahub.io/ontology#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

<http://odahub.io/ontology#notebook_final> a oda:Workflow ;
    rdfs:label "final notebook"@en ;
    oda:has_input <http://odahub.io/ontology#nb_param_ra> .

<http://odahub.io/ontology#nb_param_ra> oda:default_value "83.63"^^<http://www.w3.org/2001/XMLSchema#double> .
"#;

    #[test]
    fn turtle_parses_into_stable_triples() -> Result<()> {
        let g = RdfGraph::parse_str(NOTEBOOK_TTL, RdfFormat::Turtle)?;
        assert_eq!(g.len(), 4);

        let nb = RdfNode::iri("http://odahub.io/ontology#notebook_final");
        let types: Vec<&str> = g.types_of(&nb).collect();
        assert_eq!(types, vec!["http://odahub.io/ontology#Workflow"]);

        let label = g
            .objects_by_local_name(&nb, "label")
            .find_map(RdfObject::as_literal)
            .expect("label literal");
        assert_eq!(label.lexical, "final notebook");
        assert_eq!(label.language.as_deref(), Some("en"));
        Ok(())
    }

    #[test]
    fn duplicate_triples_collapse() -> Result<()> {
        let nt = "<http://a> <http://p> \"x\" .\n<http://a> <http://p> \"x\" .\n";
        let g = RdfGraph::parse_str(nt, RdfFormat::NTriples)?;
        assert_eq!(g.len(), 1);
        Ok(())
    }

    #[test]
    fn garbage_turtle_is_a_parse_error() {
        let err = RdfGraph::parse_str("this is not turtle", RdfFormat::Turtle).unwrap_err();
        assert!(matches!(err, RdfError::Parse { format: "Turtle", .. }));
    }

    #[test]
    fn serialize_dispatches_on_format() -> Result<()> {
        let g = RdfGraph::parse_str(NOTEBOOK_TTL, RdfFormat::Turtle)?;
        for format in [
            RdfFormat::NTriples,
            RdfFormat::Turtle,
            RdfFormat::RdfXml,
            RdfFormat::JsonLd,
        ] {
            let text = g.serialize(format)?;
            assert_eq!(RdfGraph::parse_str(&text, format)?, g, "{format:?}");
        }
        Ok(())
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            RdfFormat::from_extension("csv"),
            Err(RdfError::UnsupportedFormat(ext)) if ext == "csv"
        ));
    }
}
