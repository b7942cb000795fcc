//! Graphviz DOT rendering of an RDF graph.
//!
//! Every IRI / blank node becomes a DOT node. Literal-valued properties are
//! folded into the node label instead of getting their own nodes, and
//! `rdf:type` is shown as the label header. Node ids are assigned in graph
//! order, so identical graphs render to identical DOT.

use crate::turtle::compact_iri;
use crate::{local_name, RdfGraph, RdfNode, RdfObject, RDF_TYPE_IRI};
use std::collections::BTreeMap;

/// Literal values longer than this are shortened in labels.
const MAX_LITERAL_CHARS: usize = 48;

#[derive(Default)]
struct NodeView {
    types: Vec<String>,
    properties: Vec<(String, String)>,
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn short_iri(iri: &str) -> String {
    compact_iri(iri).unwrap_or_else(|| {
        let local = local_name(iri);
        if local.is_empty() {
            iri.to_string()
        } else {
            local.to_string()
        }
    })
}

fn node_title(node: &RdfNode) -> String {
    match node {
        RdfNode::Iri(iri) => short_iri(iri),
        RdfNode::BlankNode(bn) => format!("_:{bn}"),
    }
}

fn shorten(s: &str) -> String {
    let flat = s.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_LITERAL_CHARS {
        return flat;
    }
    let mut out: String = flat.chars().take(MAX_LITERAL_CHARS - 1).collect();
    out.push('…');
    out
}

fn style_for(types: &[String]) -> [&'static str; 3] {
    let has = |suffix: &str| types.iter().any(|t| t.ends_with(suffix));
    if has("Activity") || has("Plan") {
        ["box", "\"rounded,filled\"", "\"#c6f6d5\""]
    } else if has("Usage") || has("Generation") {
        ["ellipse", "filled", "\"#f3f3f3\""]
    } else if has("Entity") || has("Dataset") || has("Collection") {
        ["box", "filled", "\"#fff3c7\""]
    } else {
        ["box", "filled", "\"#eaf2ff\""]
    }
}

/// Render `graph` as a DOT digraph.
pub fn render_dot(graph: &RdfGraph) -> String {
    let mut ids: BTreeMap<&RdfNode, usize> = BTreeMap::new();
    let mut views: BTreeMap<&RdfNode, NodeView> = BTreeMap::new();
    let mut edges: Vec<(&RdfNode, &RdfNode, String)> = Vec::new();

    for t in graph {
        let next = ids.len();
        ids.entry(&t.subject).or_insert(next);
        let view = views.entry(&t.subject).or_default();
        match &t.object {
            RdfObject::Node(RdfNode::Iri(ty)) if t.predicate == RDF_TYPE_IRI => {
                view.types.push(short_iri(ty));
            }
            RdfObject::Node(obj) => {
                let next = ids.len();
                ids.entry(obj).or_insert(next);
                views.entry(obj).or_default();
                edges.push((&t.subject, obj, short_iri(&t.predicate)));
            }
            RdfObject::Literal(lit) => {
                view.properties
                    .push((short_iri(&t.predicate), shorten(&lit.lexical)));
            }
        }
    }

    let mut out = String::new();
    out.push_str("digraph provenance {\n");
    out.push_str("  rankdir=BT;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\", fontsize=10];\n");
    out.push_str("  edge [fontname=\"Helvetica\", fontsize=9, color=gray40];\n\n");

    for (node, view) in &views {
        let id = ids[node];
        // each part is escaped on its own; `\n` is the DOT line separator
        let mut lines = Vec::new();
        if !view.types.is_empty() {
            lines.push(dot_escape(&view.types.join(", ")));
        }
        lines.push(dot_escape(&node_title(node)));
        lines.extend(
            view.properties
                .iter()
                .map(|(k, v)| dot_escape(&format!("{k} = {v}"))),
        );
        let label = lines.join("\\n");
        let [shape, style, fill] = style_for(&view.types);
        let mut attrs = vec![
            format!("shape={shape}"),
            format!("style={style}"),
            format!("fillcolor={fill}"),
            format!("label=\"{label}\""),
        ];
        if let RdfNode::Iri(iri) = node {
            attrs.push(format!("tooltip=\"{}\"", dot_escape(iri)));
        }
        out.push_str(&format!("  n{id} [{}];\n", attrs.join(", ")));
    }

    if !edges.is_empty() {
        out.push('\n');
    }
    for (src, dst, label) in &edges {
        out.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"];\n",
            ids[src],
            ids[dst],
            dot_escape(label)
        ));
    }

    out.push_str("}\n");
    out
}
