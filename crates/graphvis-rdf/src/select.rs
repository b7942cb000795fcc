//! Path selection and input inspection over a provenance graph.
//!
//! Provenance exports locate files with a literal `prov:atLocation` (or a
//! `path`-like) property on the entity node. A selection keeps the
//! neighborhood of every entity whose location matches one of the requested
//! paths.

use crate::{local_name, RdfGraph, RdfNode, RdfObject, RDF_TYPE_IRI};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Properties that carry a file location.
const LOCATION_PREDICATES: &[&str] = &["atLocation", "path"];

/// Undirected hops kept around each matching entity: entity → activity → siblings.
pub const SELECTION_HOPS: usize = 2;

fn normalize(path: &str) -> &str {
    let p = path.trim();
    let p = p.strip_prefix("./").unwrap_or(p);
    p.trim_end_matches('/')
}

fn location_matches(location: &str, selected: &str) -> bool {
    let location = normalize(location);
    if selected.is_empty() || selected == "." {
        return true;
    }
    location == selected
        || location
            .strip_prefix(selected)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Location literal of every node that has one.
pub fn locations(graph: &RdfGraph) -> BTreeMap<&RdfNode, &str> {
    let mut out = BTreeMap::new();
    for t in graph {
        if !LOCATION_PREDICATES.contains(&local_name(&t.predicate)) {
            continue;
        }
        if let RdfObject::Literal(lit) = &t.object {
            out.entry(&t.subject).or_insert(lit.lexical.as_str());
        }
    }
    out
}

/// Restrict `graph` to the neighborhood of the selected paths: every
/// statement whose subject or node object lies within [`SELECTION_HOPS`]
/// undirected hops of a matching entity.
///
/// An empty selection returns the graph unchanged. A selection that matches
/// no entity yields an empty graph.
pub fn select_paths<S: AsRef<str>>(graph: &RdfGraph, paths: &[S]) -> RdfGraph {
    if paths.is_empty() {
        return graph.clone();
    }
    let selected: Vec<&str> = paths.iter().map(|p| normalize(p.as_ref())).collect();

    let seeds: Vec<&RdfNode> = locations(graph)
        .into_iter()
        .filter(|(_, loc)| selected.iter().any(|s| location_matches(loc, s)))
        .map(|(node, _)| node)
        .collect();
    if seeds.is_empty() {
        return RdfGraph::new();
    }

    let mut neighbors: HashMap<&RdfNode, Vec<&RdfNode>> = HashMap::new();
    for t in graph {
        // class nodes would connect every instance of a type
        if t.predicate == RDF_TYPE_IRI {
            continue;
        }
        if let RdfObject::Node(obj) = &t.object {
            neighbors.entry(&t.subject).or_default().push(obj);
            neighbors.entry(obj).or_default().push(&t.subject);
        }
    }

    let mut kept: BTreeSet<&RdfNode> = BTreeSet::new();
    let mut queue: VecDeque<(&RdfNode, usize)> = seeds.into_iter().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = queue.pop_front() {
        if !kept.insert(node) || depth >= SELECTION_HOPS {
            continue;
        }
        if let Some(list) = neighbors.get(node) {
            for &next in list {
                if !kept.contains(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }
    }

    graph
        .iter()
        .filter(|t| {
            kept.contains(&t.subject)
                || matches!(&t.object, RdfObject::Node(obj) if kept.contains(obj))
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct InputEntity {
    pub location: String,
    pub entity: String,
    pub activity: String,
}

/// Entities consumed by activities, via `prov:used` or a qualified usage's
/// `prov:entity`, sorted by location.
pub fn input_entities(graph: &RdfGraph) -> Vec<InputEntity> {
    let locs = locations(graph);

    // usage node -> activity that holds it
    let mut usage_owner: HashMap<&RdfNode, &RdfNode> = HashMap::new();
    for t in graph {
        if local_name(&t.predicate) == "qualifiedUsage" {
            if let RdfObject::Node(usage) = &t.object {
                usage_owner.insert(usage, &t.subject);
            }
        }
    }

    let mut out: BTreeSet<InputEntity> = BTreeSet::new();
    for t in graph {
        let RdfObject::Node(entity) = &t.object else {
            continue;
        };
        let activity = match local_name(&t.predicate) {
            "used" => &t.subject,
            "entity" => match usage_owner.get(&t.subject) {
                Some(activity) => *activity,
                None => continue,
            },
            _ => continue,
        };
        out.insert(InputEntity {
            location: locs
                .get(entity)
                .map(|l| l.to_string())
                .unwrap_or_else(|| entity.as_id()),
            entity: entity.as_id(),
            activity: activity.as_id(),
        });
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RdfLiteral, Triple};

    const PROV: &str = "http://www.w3.org/ns/prov#";

    fn iri(s: &str) -> RdfNode {
        RdfNode::iri(format!("https://example.org/{s}"))
    }

    fn link(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(iri(s), format!("{PROV}{p}"), RdfObject::Node(iri(o)))
    }

    fn at(s: &str, loc: &str) -> Triple {
        Triple::new(
            iri(s),
            format!("{PROV}atLocation"),
            RdfObject::Literal(RdfLiteral::plain(loc)),
        )
    }

    /// act1 uses data/in.csv (qualified) and generates out/nb.ipynb;
    /// act2 is unrelated and uses other.txt.
    fn provenance() -> RdfGraph {
        [
            link("act1", "qualifiedUsage", "usage1"),
            link("usage1", "entity", "in"),
            at("in", "data/in.csv"),
            link("gen1", "activity", "act1"),
            link("nb", "qualifiedGeneration", "gen1"),
            at("nb", "out/nb.ipynb"),
            link("act2", "used", "other"),
            at("other", "other.txt"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let g = provenance();
        assert_eq!(select_paths::<&str>(&g, &[]), g);
    }

    #[test]
    fn selecting_a_directory_keeps_its_neighborhood_only() {
        let g = select_paths(&provenance(), &["./out/"]);
        let subjects: Vec<String> = g.subjects().into_iter().map(|n| n.as_id()).collect();
        assert!(subjects.contains(&"https://example.org/nb".to_string()));
        assert!(subjects.contains(&"https://example.org/gen1".to_string()));
        assert!(!subjects.contains(&"https://example.org/act2".to_string()));
        assert!(!subjects.contains(&"https://example.org/other".to_string()));
    }

    #[test]
    fn edges_into_the_neighborhood_are_kept() {
        let mut g = provenance();
        let informed = link("act0", "wasInformedBy", "act1");
        let beyond = link("act0", "used", "other");
        g.insert(informed.clone());
        g.insert(beyond.clone());

        // act1 is two hops from out/nb.ipynb, act0 is three
        let selected = select_paths(&g, &["out"]);
        assert!(selected.contains(&informed));
        assert!(!selected.contains(&beyond));
    }

    #[test]
    fn unmatched_selection_is_empty_not_an_error() {
        assert!(select_paths(&provenance(), &["nope.txt"]).is_empty());
        // prefix match is per path segment
        assert!(select_paths(&provenance(), &["data/in"]).is_empty());
    }

    proptest::proptest! {
        #[test]
        fn selection_is_a_subgraph(
            picks in proptest::collection::vec(
                proptest::sample::select(vec!["data", "data/in.csv", "out", "other.txt", "missing"]),
                0..4,
            )
        ) {
            let g = provenance();
            let selected = select_paths(&g, &picks);
            proptest::prop_assert!(selected.iter().all(|t| g.contains(t)));
            if picks.iter().all(|p| *p == "missing") && !picks.is_empty() {
                proptest::prop_assert!(selected.is_empty());
            }
        }
    }

    #[test]
    fn inputs_cover_plain_and_qualified_usage() {
        let inputs = input_entities(&provenance());
        let locations: Vec<&str> = inputs.iter().map(|i| i.location.as_str()).collect();
        assert_eq!(locations, vec!["data/in.csv", "other.txt"]);
        assert_eq!(inputs[0].activity, "https://example.org/act1");
    }
}
