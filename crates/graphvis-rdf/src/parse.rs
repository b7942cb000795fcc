//! Bridge between Sophia terms and the owned term model.
//!
//! Parsing walks the Sophia triple (or quad) source and reads each term
//! through the `Term` accessors; serialization lends the graph back to
//! Sophia as borrowed `SimpleTerm`s.

use crate::{RdfError, RdfFormat, RdfLiteral, RdfNode, RdfObject, Result, Triple as GraphTriple};
use crate::{RdfGraph, XSD_STRING_IRI};
use sophia::api::prelude::*;
use sophia::api::term::{BnodeId, LanguageTag, SimpleTerm};
use sophia::api::MownStr;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct SinkError {
    message: String,
}

impl From<RdfError> for SinkError {
    fn from(value: RdfError) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

fn node_from_term<T: Term>(term: &T) -> Option<RdfNode> {
    if let Some(iri) = term.iri() {
        return Some(RdfNode::Iri(iri.as_str().to_string()));
    }
    term.bnode_id()
        .map(|id| RdfNode::BlankNode(id.as_str().to_string()))
}

fn literal_from_term<T: Term>(term: &T) -> Option<RdfLiteral> {
    let lexical = term.lexical_form()?.to_string();
    if let Some(tag) = term.language_tag() {
        return Some(RdfLiteral {
            lexical,
            datatype: None,
            language: Some(tag.as_str().to_string()),
        });
    }
    let datatype = term
        .datatype()
        .map(|dt| dt.as_str().to_string())
        .filter(|dt| dt != XSD_STRING_IRI);
    Some(RdfLiteral {
        lexical,
        datatype,
        language: None,
    })
}

fn object_from_term<T: Term>(term: &T) -> Result<RdfObject> {
    match term.kind() {
        TermKind::Iri | TermKind::BlankNode => node_from_term(term).map(RdfObject::Node),
        TermKind::Literal => literal_from_term(term).map(RdfObject::Literal),
        _ => None,
    }
    .ok_or_else(|| RdfError::Parse {
        format: "term",
        message: format!("unsupported object term kind {:?}", term.kind()),
    })
}

/// Convert one parsed statement; statements with a non-IRI predicate are skipped.
fn push_triple<T: Term>(
    out: &mut Vec<GraphTriple>,
    subject: &T,
    predicate: &T,
    object: &T,
) -> std::result::Result<(), SinkError> {
    let Some(predicate) = predicate.iri() else {
        return Ok(());
    };
    let subject = node_from_term(subject).ok_or_else(|| RdfError::Parse {
        format: "term",
        message: format!("subject must be an IRI or a blank node, got {:?}", subject.kind()),
    })?;
    out.push(GraphTriple {
        subject,
        predicate: predicate.as_str().to_string(),
        object: object_from_term(object)?,
    });
    Ok(())
}

fn parse_error(format: &'static str, e: impl std::fmt::Display) -> RdfError {
    RdfError::Parse {
        format,
        message: e.to_string(),
    }
}

pub(crate) fn parse_with_sophia(bytes: &[u8], format: RdfFormat) -> Result<Vec<GraphTriple>> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(bytes));
    let mut out: Vec<GraphTriple> = Vec::new();

    match format {
        RdfFormat::NTriples => {
            let mut parser = sophia::turtle::parser::nt::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| push_triple(&mut out, &t.s(), &t.p(), &t.o()))
                .map_err(|e| parse_error("N-Triples", e))?;
        }
        RdfFormat::Turtle => {
            let mut parser = sophia::turtle::parser::turtle::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| push_triple(&mut out, &t.s(), &t.p(), &t.o()))
                .map_err(|e| parse_error("Turtle", e))?;
        }
        RdfFormat::RdfXml => {
            let mut parser = sophia::xml::parser::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| push_triple(&mut out, &t.s(), &t.p(), &t.o()))
                .map_err(|e| parse_error("RDF/XML", e))?;
        }
        RdfFormat::JsonLd => {
            // named graphs are folded into the default graph
            let mut quads = sophia::jsonld::JsonLdParser::new().parse(reader);
            quads
                .try_for_each_quad(|q| push_triple(&mut out, &q.s(), &q.p(), &q.o()))
                .map_err(|e| parse_error("JSON-LD", e))?;
        }
    }

    Ok(out)
}

// ============================================================================
// Serialization side
// ============================================================================

fn node_term(node: &RdfNode) -> SimpleTerm<'_> {
    match node {
        RdfNode::Iri(iri) => SimpleTerm::Iri(IriRef::new_unchecked(MownStr::from(iri.as_str()))),
        RdfNode::BlankNode(bn) => {
            SimpleTerm::BlankNode(BnodeId::new_unchecked(MownStr::from(bn.as_str())))
        }
    }
}

fn object_term(object: &RdfObject) -> SimpleTerm<'_> {
    match object {
        RdfObject::Node(node) => node_term(node),
        RdfObject::Literal(lit) => {
            let lexical = MownStr::from(lit.lexical.as_str());
            match &lit.language {
                Some(lang) => SimpleTerm::LiteralLanguage(
                    lexical,
                    LanguageTag::new_unchecked(MownStr::from(lang.as_str())),
                ),
                None => {
                    let datatype = lit.datatype.as_deref().unwrap_or(XSD_STRING_IRI);
                    SimpleTerm::LiteralDatatype(
                        lexical,
                        IriRef::new_unchecked(MownStr::from(datatype)),
                    )
                }
            }
        }
    }
}

/// The graph as a Sophia graph borrowing its strings.
pub(crate) fn sophia_graph(graph: &RdfGraph) -> Vec<[SimpleTerm<'_>; 3]> {
    graph
        .iter()
        .map(|t| {
            [
                node_term(&t.subject),
                SimpleTerm::Iri(IriRef::new_unchecked(MownStr::from(t.predicate.as_str()))),
                object_term(&t.object),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_kinds_map_onto_the_owned_model() -> Result<()> {
        let nt = concat!(
            "<http://x/s> <http://x/p> _:b7 .\n",
            "_:b7 <http://x/p> \"a \\\"q\\\"\\nz\" .\n",
            "_:b7 <http://x/n> \"3\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
            "_:b7 <http://x/l> \"chat\"@fr .\n",
        );
        let triples = parse_with_sophia(nt.as_bytes(), RdfFormat::NTriples)?;
        assert_eq!(triples.len(), 4);
        assert_eq!(triples[0].subject, RdfNode::iri("http://x/s"));
        assert!(matches!(&triples[0].object, RdfObject::Node(RdfNode::BlankNode(_))));
        assert_eq!(
            triples[1].object,
            RdfObject::Literal(RdfLiteral::plain("a \"q\"\nz"))
        );
        assert_eq!(
            triples[2].object.as_literal().and_then(|l| l.datatype.as_deref()),
            Some("http://www.w3.org/2001/XMLSchema#integer")
        );
        let lang = triples[3].object.as_literal().expect("literal");
        assert_eq!(lang.language.as_deref(), Some("fr"));
        assert_eq!(lang.datatype, None);
        Ok(())
    }

    #[test]
    fn sophia_view_keeps_literal_forms() {
        let g: RdfGraph = [GraphTriple::new(
            RdfNode::BlankNode("n".to_string()),
            "http://x/p",
            RdfObject::Literal(RdfLiteral::plain("v")),
        )]
        .into_iter()
        .collect();
        let view = sophia_graph(&g);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0][0].bnode_id().map(|b| b.as_str().to_string()).as_deref(), Some("n"));
        assert_eq!(
            view[0][2].datatype().map(|d| d.as_str().to_string()).as_deref(),
            Some(XSD_STRING_IRI)
        );
    }
}
