use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GraphVisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RDF error: {0}")]
    Rdf(#[from] graphvis_rdf::RdfError),
    #[error("{path}: missing required field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    #[error("run `{run}` reports the metric but has no `{field}`")]
    MissingRunField { run: String, field: &'static str },
    #[error("{0}: expected a JSON object")]
    NotAnObject(PathBuf),
    #[error("unsupported output format `.{0}` (expected dot, gv, png, svg, pdf, jpg, jpeg or gif)")]
    UnsupportedFormat(String),
    #[error("unable to find any session URLs for remote `{0}`")]
    NoSessionUrl(String),
    #[error("`{program}` failed ({status}):\n{stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GraphVisError>;
