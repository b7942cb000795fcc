//! Graph Rendering Facade.
//!
//! A [`ProvenanceSource`] produces the project's provenance graph for a git
//! revision; the facade narrows it to a path selection and renders it as an
//! image (through Graphviz) or as an interactive HTML page plus its Turtle
//! serialization.
//!
//! Output files are written to caller-chosen names and overwritten on every
//! call.

use crate::command::{capture_stdout, run_with_stdin};
use crate::error::{GraphVisError, Result};
use graphvis_rdf::select::{input_entities, select_paths, InputEntity};
use graphvis_rdf::turtle::{compact_iri, to_turtle};
use graphvis_rdf::{dot, local_name, RdfFormat, RdfGraph, RdfNode, RdfObject, RDF_TYPE_IRI};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_IMAGE_FILENAME: &str = "graph.png";
pub const GRAPH_HTML_FILENAME: &str = "graph.html";
pub const GRAPH_TTL_FILENAME: &str = "graph.ttl";

const REMOTE_SCRIPT_SRC: &str = "https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js";
const LOCAL_SCRIPT_SRC: &str = "graph_template/vis-network.min.js";

// ============================================================================
// Sources
// ============================================================================

/// Where the provenance graph comes from.
pub trait ProvenanceSource {
    /// The full provenance graph at `revision` (`None`: current state).
    fn export(&self, revision: Option<&str>) -> Result<RdfGraph>;
}

/// `renku graph export --format jsonld`, run inside the project.
#[derive(Debug, Clone)]
pub struct RenkuGraphExport {
    pub program: String,
    pub project_dir: PathBuf,
}

impl RenkuGraphExport {
    pub fn new(program: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            project_dir: project_dir.into(),
        }
    }
}

impl ProvenanceSource for RenkuGraphExport {
    fn export(&self, revision: Option<&str>) -> Result<RdfGraph> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.project_dir)
            .args(["graph", "export", "--format", "jsonld"]);
        if let Some(revision) = revision {
            cmd.arg("--revision").arg(revision);
        }
        let text = capture_stdout(&mut cmd)?;
        if text.trim().is_empty() {
            return Ok(RdfGraph::new());
        }
        Ok(RdfGraph::parse_str(&text, RdfFormat::JsonLd)?)
    }
}

/// A graph stored in a file; the revision is ignored.
#[derive(Debug, Clone)]
pub struct GraphFile {
    pub path: PathBuf,
}

impl ProvenanceSource for GraphFile {
    fn export(&self, _revision: Option<&str>) -> Result<RdfGraph> {
        Ok(RdfGraph::from_file(&self.path)?)
    }
}

// ============================================================================
// Output formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// DOT text written as-is.
    Dot,
    /// Rendered by Graphviz with `-T<name>`.
    Graphviz(&'static str),
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "dot" | "gv" => Ok(Self::Dot),
            "png" => Ok(Self::Graphviz("png")),
            "svg" => Ok(Self::Graphviz("svg")),
            "pdf" => Ok(Self::Graphviz("pdf")),
            "jpg" | "jpeg" => Ok(Self::Graphviz("jpg")),
            "gif" => Ok(Self::Graphviz("gif")),
            other => Err(GraphVisError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateLocation {
    /// Script shipped next to the page under `graph_template/`.
    #[default]
    Local,
    /// Script loaded from a CDN.
    Remote,
}

impl TemplateLocation {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" | "cdn" => Ok(Self::Remote),
            other => Err(GraphVisError::Config(format!(
                "unknown template location `{other}` (expected local|remote)"
            ))),
        }
    }

    fn script_src(self) -> &'static str {
        match self {
            Self::Local => LOCAL_SCRIPT_SRC,
            Self::Remote => REMOTE_SCRIPT_SRC,
        }
    }
}

// ============================================================================
// Facade
// ============================================================================

pub struct GraphRenderer<'a> {
    source: &'a dyn ProvenanceSource,
    dot_program: String,
}

impl<'a> GraphRenderer<'a> {
    pub fn new(source: &'a dyn ProvenanceSource, dot_program: impl Into<String>) -> Self {
        Self {
            source,
            dot_program: dot_program.into(),
        }
    }

    /// Provenance graph narrowed to `paths` (plus `input_notebook` when a
    /// selection is given).
    pub fn build_graph(
        &self,
        revision: Option<&str>,
        paths: &[String],
        input_notebook: Option<&str>,
    ) -> Result<RdfGraph> {
        let graph = self.source.export(revision)?;
        let mut selection: Vec<&str> = paths.iter().map(String::as_str).collect();
        if !selection.is_empty() {
            selection.extend(input_notebook);
        }
        let selected = select_paths(&graph, &selection);
        tracing::debug!(
            total = graph.len(),
            selected = selected.len(),
            "built provenance graph"
        );
        Ok(selected)
    }

    /// Render the selected graph to `filename`; the extension picks the
    /// format. Returns `filename` unchanged.
    pub fn build_graph_image(
        &self,
        revision: Option<&str>,
        paths: &[String],
        filename: &Path,
        input_notebook: Option<&str>,
    ) -> Result<PathBuf> {
        let format = ImageFormat::from_path(filename)?;
        let graph = self.build_graph(revision, paths, input_notebook)?;
        let dot_text = dot::render_dot(&graph);
        render_image(&dot_text, filename, format, &self.dot_program)?;
        tracing::info!(path = %filename.display(), triples = graph.len(), "wrote graph image");
        Ok(filename.to_path_buf())
    }

    /// Interactive page and Turtle text for the selected graph. Nothing is
    /// written to disk; see [`write_graph_files`].
    pub fn build_graph_html(
        &self,
        revision: Option<&str>,
        paths: &[String],
        template_location: TemplateLocation,
        include_title: bool,
    ) -> Result<(String, String)> {
        let graph = self.build_graph(revision, paths, None)?;
        let ttl = to_turtle(&graph)?;
        let html = render_html(&graph, &ttl, template_location, include_title)?;
        Ok((html, ttl))
    }

    /// Write the selected graph as RDF, the serialization following the
    /// file extension (`.ttl`, `.nt`, `.rdf`, `.jsonld`).
    pub fn export_graph(
        &self,
        revision: Option<&str>,
        paths: &[String],
        input_notebook: Option<&str>,
        filename: &Path,
    ) -> Result<PathBuf> {
        let ext = filename
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = RdfFormat::from_extension(ext)?;
        let graph = self.build_graph(revision, paths, input_notebook)?;
        let text = graph.serialize(format)?;
        if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(filename, text)?;
        tracing::info!(path = %filename.display(), ?format, triples = graph.len(), "exported graph");
        Ok(filename.to_path_buf())
    }

    /// Input entities of the activities in the selected graph.
    pub fn inspect_inputs(
        &self,
        revision: Option<&str>,
        paths: &[String],
        input_notebook: Option<&str>,
    ) -> Result<Vec<InputEntity>> {
        let graph = self.build_graph(revision, paths, input_notebook)?;
        Ok(input_entities(&graph))
    }
}

/// Write DOT text as an image.
pub fn render_image(dot_text: &str, filename: &Path, format: ImageFormat, dot_program: &str) -> Result<()> {
    if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    match format {
        ImageFormat::Dot => fs::write(filename, dot_text)?,
        ImageFormat::Graphviz(kind) => run_with_stdin(
            Command::new(dot_program)
                .arg(format!("-T{kind}"))
                .arg("-o")
                .arg(filename),
            dot_text.as_bytes(),
        )?,
    }
    Ok(())
}

/// Write the page and the Turtle file under their conventional names in `dir`.
pub fn write_graph_files(html: &str, ttl: &str, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;
    let html_path = dir.join(GRAPH_HTML_FILENAME);
    let ttl_path = dir.join(GRAPH_TTL_FILENAME);
    fs::write(&html_path, html)?;
    fs::write(&ttl_path, ttl)?;
    Ok((html_path, ttl_path))
}

/// Whether the graphviz program can be started.
pub fn graphviz_available(dot_program: &str) -> bool {
    capture_stdout(Command::new(dot_program).arg("-V")).is_ok()
}

// ============================================================================
// HTML
// ============================================================================

fn short_label(node: &RdfNode) -> String {
    match node {
        RdfNode::Iri(iri) => compact_iri(iri).unwrap_or_else(|| local_name(iri).to_string()),
        RdfNode::BlankNode(bn) => format!("_:{bn}"),
    }
}

fn group_for(types: &[&str]) -> &'static str {
    let has = |suffix: &str| types.iter().any(|t| t.ends_with(suffix));
    if has("Activity") || has("Plan") {
        "activity"
    } else if has("Usage") || has("Generation") || has("Association") {
        "qualifier"
    } else if has("Entity") || has("Dataset") || has("Collection") {
        "entity"
    } else {
        "other"
    }
}

/// Nodes and edges in the shape the page's network view expects.
pub fn vis_graph(graph: &RdfGraph) -> Value {
    let mut ids: BTreeMap<&RdfNode, usize> = BTreeMap::new();
    let mut details: BTreeMap<&RdfNode, Vec<String>> = BTreeMap::new();
    let mut edges: Vec<Value> = Vec::new();

    for t in graph {
        let next = ids.len();
        ids.entry(&t.subject).or_insert(next);
        match &t.object {
            RdfObject::Node(obj) if t.predicate != RDF_TYPE_IRI => {
                let next = ids.len();
                let to = *ids.entry(obj).or_insert(next);
                edges.push(json!({
                    "from": ids[&t.subject],
                    "to": to,
                    "label": compact_iri(&t.predicate).unwrap_or_else(|| local_name(&t.predicate).to_string()),
                }));
            }
            RdfObject::Node(_) => {}
            RdfObject::Literal(lit) => {
                details.entry(&t.subject).or_default().push(format!(
                    "{} = {}",
                    compact_iri(&t.predicate).unwrap_or_else(|| t.predicate.clone()),
                    lit.lexical
                ));
            }
        }
    }

    let nodes: Vec<Value> = ids
        .iter()
        .map(|(node, id)| {
            let types: Vec<&str> = graph.types_of(node).collect();
            let mut title = vec![node.as_id()];
            title.extend(types.iter().map(|t| format!("a {t}")));
            if let Some(lines) = details.get(node) {
                title.extend(lines.iter().cloned());
            }
            json!({
                "id": id,
                "label": short_label(node),
                "title": title.join("\n"),
                "group": group_for(&types),
            })
        })
        .collect();

    json!({ "nodes": nodes, "edges": edges })
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_html(
    graph: &RdfGraph,
    ttl: &str,
    template_location: TemplateLocation,
    include_title: bool,
) -> Result<String> {
    // `</` is escaped so embedded data cannot close the script tag.
    let json = serde_json::to_string(&vis_graph(graph))?.replace("</", "<\\/");
    let ttl = ttl.replace("</", "<\\/");

    let title = "Project provenance graph";
    let title_block = if include_title {
        format!(
            "<header><h1>{}</h1><div class=\"stats\">{} triples</div></header>",
            html_escape(title),
            graph.len()
        )
    } else {
        String::new()
    };
    let graph_top = if include_title { "56px" } else { "0px" };

    let title = html_escape(title);
    let html = fill_template(
        include_str!("../templates/graph.html"),
        &[
            ("TITLE", title.as_str()),
            ("SCRIPT_SRC", template_location.script_src()),
            ("GRAPH_TOP", graph_top),
            ("TITLE_BLOCK", title_block.as_str()),
            ("TTL", ttl.as_str()),
            ("GRAPH_JSON", json.as_str()),
        ],
    );
    Ok(html)
}

/// Substitute `{{NAME}}` placeholders in one left-to-right pass; substituted
/// text is never rescanned. Unknown placeholders are kept as they are.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(RdfGraph);

    impl ProvenanceSource for Fixed {
        fn export(&self, _revision: Option<&str>) -> Result<RdfGraph> {
            Ok(self.0.clone())
        }
    }

    const TTL: &str = r#"
@prefix prov: <http://www.w3.org/ns/prov#> .
<https://example.org/activities/1> a prov:Activity ;
    prov:used <https://example.org/entities/in.csv> .
<https://example.org/entities/in.csv> a prov:Entity ; prov:atLocation "data/in.csv" .
<https://example.org/entities/nb> a prov:Entity ; prov:atLocation "nb/analysis.ipynb" .
"#;

    fn source() -> Fixed {
        Fixed(RdfGraph::parse_str(TTL, RdfFormat::Turtle).unwrap())
    }

    #[test]
    fn image_format_comes_from_extension() {
        assert_eq!(ImageFormat::from_path(Path::new("g.PNG")).unwrap(), ImageFormat::Graphviz("png"));
        assert_eq!(ImageFormat::from_path(Path::new("g.gv")).unwrap(), ImageFormat::Dot);
        assert!(matches!(
            ImageFormat::from_path(Path::new("g.bmp")),
            Err(GraphVisError::UnsupportedFormat(ext)) if ext == "bmp"
        ));
    }

    #[test]
    fn input_notebook_extends_a_selection() -> Result<()> {
        let src = source();
        let r = GraphRenderer::new(&src, "dot");
        let only_data = r.build_graph(None, &["data".to_string()], None)?;
        let with_nb = r.build_graph(None, &["data".to_string()], Some("nb/analysis.ipynb"))?;
        assert!(with_nb.len() > only_data.len());
        // with no selection the notebook does not narrow the graph
        assert_eq!(r.build_graph(None, &[], Some("nb/analysis.ipynb"))?.len(), src.0.len());
        Ok(())
    }

    #[test]
    fn html_embeds_graph_and_turtle() -> Result<()> {
        let src = source();
        let (html, ttl) = GraphRenderer::new(&src, "dot").build_graph_html(
            None,
            &[],
            TemplateLocation::Remote,
            true,
        )?;
        assert!(ttl.contains("prov:atLocation \"data/in.csv\""));
        assert!(html.contains(REMOTE_SCRIPT_SRC));
        assert!(html.contains("<h1>Project provenance graph</h1>"));
        assert!(html.contains("\"label\":\"prov:used\""));
        assert!(!html.contains("{{"));
        Ok(())
    }

    #[test]
    fn html_without_title_uses_local_script() -> Result<()> {
        let html = render_html(&RdfGraph::new(), "", TemplateLocation::Local, false)?;
        assert!(html.contains(LOCAL_SCRIPT_SRC));
        assert!(!html.contains("<h1>"));
        Ok(())
    }

    #[test]
    fn script_tags_cannot_be_closed_by_data() -> Result<()> {
        let html = render_html(&RdfGraph::new(), "\"</script>\"", TemplateLocation::Local, false)?;
        assert_eq!(html.matches("</script>").count(), 3);
        Ok(())
    }

    #[test]
    fn placeholders_inside_data_stay_literal() -> Result<()> {
        let html = render_html(&RdfGraph::new(), "# {{GRAPH_JSON}}", TemplateLocation::Local, false)?;
        assert!(html.contains("# {{GRAPH_JSON}}"));
        assert_eq!(html.matches("\"nodes\":[]").count(), 1);
        Ok(())
    }

    #[test]
    fn fill_template_keeps_unknown_names() {
        assert_eq!(
            fill_template("a {{X}} {{Y}} {{", &[("X", "{{Y}}")]),
            "a {{Y}} {{Y}} {{"
        );
    }

    #[test]
    fn export_follows_the_extension() -> Result<()> {
        let src = source();
        let dir = tempfile::tempdir()?;
        let r = GraphRenderer::new(&src, "dot");
        for name in ["g.nt", "g.ttl", "g.jsonld", "g.rdf"] {
            let path = r.export_graph(None, &[], None, &dir.path().join(name))?;
            assert_eq!(RdfGraph::from_file(&path)?, src.0);
        }
        let nt = fs::read_to_string(dir.path().join("g.nt"))?;
        assert_eq!(nt.lines().count(), src.0.len());
        assert!(matches!(
            r.export_graph(None, &[], None, &dir.path().join("g.csv")),
            Err(GraphVisError::Rdf(_))
        ));
        Ok(())
    }

    #[test]
    fn template_location_parses() {
        assert_eq!(TemplateLocation::parse("CDN").unwrap(), TemplateLocation::Remote);
        assert!(TemplateLocation::parse("ftp").is_err());
    }
}
