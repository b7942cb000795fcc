//! GraphVis core: provenance annotations and graph rendering for Renku projects.
//!
//! Two sides share this crate:
//!
//! - **Run side**: before a tracked command runs, [`hook::HookInstaller`] drops
//!   a bootstrap module into the annotation directory and hands back the child
//!   environment that loads it. After the run, [`plugin::GraphVisPlugin`]
//!   collects the annotations the command left behind ([`scanner`]) together
//!   with those extracted from produced notebooks ([`notebook`]).
//! - **Inspection side**: [`render::GraphRenderer`] narrows the project's
//!   provenance graph to selected paths and renders it as an image, an
//!   interactive page, or a list of inputs. [`leaderboard`] ranks logged runs
//!   and [`session`] opens a hosted session for the project.
//!
//! Graph parsing and serialization live in `graphvis-rdf`.

pub mod annotation;
mod command;
pub mod config;
pub mod error;
pub mod hook;
pub mod leaderboard;
pub mod model;
pub mod notebook;
pub mod plugin;
pub mod render;
pub mod scanner;
pub mod session;

pub use annotation::Annotation;
pub use config::GraphVisConfig;
pub use error::{GraphVisError, Result};
pub use hook::{ChildEnvironment, HookInstaller};
pub use leaderboard::{create_leaderboard, Leaderboard, RunRecord};
pub use model::{Activity, Entity, Tool};
pub use notebook::{NotebookOntology, PythonNb2Rdf};
pub use plugin::{GraphVisPlugin, PluginHooks};
pub use render::{GraphFile, GraphRenderer, ProvenanceSource, RenkuGraphExport, TemplateLocation};
pub use scanner::AnnotationStore;
