//! GraphVis CLI
//!
//! Command group for inspecting a project's provenance graph:
//! - `inspect` / `display` / `show-graph` render or list a path selection
//! - `export` writes a path selection as RDF
//! - `start-session` opens a hosted session for the project's remote
//! - `pre-run` / `harvest` drive the plugin hooks by hand
//! - `leaderboard` ranks logged runs by a metric

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use graphvis_core::leaderboard::{create_leaderboard, RunRecord};
use graphvis_core::render::{
    graphviz_available, write_graph_files, ImageFormat, DEFAULT_IMAGE_FILENAME,
};
use graphvis_core::session::{git_remote_url, open_in_browser, select_session_url};
use graphvis_core::{
    Activity, GraphFile, GraphRenderer, GraphVisConfig, GraphVisPlugin, PluginHooks,
    ProvenanceSource, RenkuGraphExport, TemplateLocation, Tool,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::Level;

#[derive(Parser)]
#[command(name = "graphvis")]
#[command(author, version, about = "Provenance graph visualization for Renku projects")]
struct Cli {
    /// Project directory (defaults to the current directory).
    #[arg(long, global = true)]
    project: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Selection {
    /// The git revision to generate the graph for.
    #[arg(long, default_value = "HEAD")]
    revision: String,
    /// Input notebook to add to the selection.
    #[arg(long)]
    input_notebook: Option<String>,
    /// Read the provenance graph from a file instead of `renku graph export`.
    #[arg(long)]
    graph_file: Option<PathBuf>,
    /// Paths to restrict the graph to (default: whole graph).
    paths: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the input entities within the graph.
    Inspect {
        #[command(flatten)]
        selection: Selection,
    },

    /// Render the graph to an image file.
    Display {
        #[command(flatten)]
        selection: Selection,
        /// Output image; the extension picks the format.
        #[arg(long, default_value = DEFAULT_IMAGE_FILENAME)]
        filename: PathBuf,
    },

    /// Write the selected graph as RDF (Turtle, N-Triples, RDF/XML or JSON-LD).
    Export {
        #[command(flatten)]
        selection: Selection,
        /// Output file; the extension picks the serialization.
        #[arg(long, default_value = "graph.nt")]
        filename: PathBuf,
    },

    /// Write the interactive graph page and open it.
    ShowGraph {
        #[arg(long)]
        graph_file: Option<PathBuf>,
        /// Write the files without opening a browser.
        #[arg(long)]
        no_open: bool,
        #[arg(long)]
        include_title: bool,
        /// Where the page loads its script from: local or remote.
        #[arg(long, default_value = "local")]
        template_location: String,
    },

    /// Open a new interactive session for this project.
    StartSession {
        /// Print the URL only.
        #[arg(long)]
        no_open: bool,
    },

    /// Install the auto-logging hook and run a command with it enabled.
    PreRun {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Collect the annotations of a completed activity (JSON description).
    Harvest {
        #[arg(long)]
        activity: PathBuf,
    },

    /// Rank logged runs by a metric.
    Leaderboard {
        #[arg(long)]
        metric: String,
        /// JSON object of run id -> {module, query, <metrics>...}.
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let project = match cli.project {
        Some(p) => p,
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let config = GraphVisConfig::from_env()
        .context("invalid GRAPHVIS_* configuration")?
        .for_project(&project);

    match cli.command {
        Commands::Inspect { selection } => cmd_inspect(&config, &project, &selection),
        Commands::Display {
            selection,
            filename,
        } => cmd_display(&config, &project, &selection, &filename),
        Commands::Export {
            selection,
            filename,
        } => cmd_export(&config, &project, &selection, &filename),
        Commands::ShowGraph {
            graph_file,
            no_open,
            include_title,
            template_location,
        } => cmd_show_graph(
            &config,
            &project,
            graph_file,
            no_open,
            include_title,
            &template_location,
        ),
        Commands::StartSession { no_open } => cmd_start_session(&config, &project, no_open),
        Commands::PreRun { command } => cmd_pre_run(config, &project, command),
        Commands::Harvest { activity } => cmd_harvest(config, &activity),
        Commands::Leaderboard { metric, input } => cmd_leaderboard(&metric, &input),
    }
}

fn provenance_source(
    config: &GraphVisConfig,
    project: &Path,
    graph_file: Option<PathBuf>,
) -> Box<dyn ProvenanceSource> {
    match graph_file {
        Some(path) => Box::new(GraphFile { path }),
        None => Box::new(RenkuGraphExport::new(config.renku_program.clone(), project)),
    }
}

fn cmd_inspect(config: &GraphVisConfig, project: &Path, selection: &Selection) -> Result<()> {
    let source = provenance_source(config, project, selection.graph_file.clone());
    let renderer = GraphRenderer::new(source.as_ref(), config.dot_program.clone());
    let inputs = renderer.inspect_inputs(
        Some(&selection.revision),
        &selection.paths,
        selection.input_notebook.as_deref(),
    )?;

    if inputs.is_empty() {
        eprintln!("{} no input entities in the selection", "info:".yellow().bold());
        return Ok(());
    }
    for input in &inputs {
        println!(
            "{}  {}  {}",
            input.location.bold(),
            input.entity,
            format!("(used by {})", input.activity).dimmed()
        );
    }
    Ok(())
}

fn cmd_display(
    config: &GraphVisConfig,
    project: &Path,
    selection: &Selection,
    filename: &Path,
) -> Result<()> {
    if let ImageFormat::Graphviz(kind) = ImageFormat::from_path(filename)? {
        if !graphviz_available(&config.dot_program) {
            return Err(anyhow!(
                "`{}` was not found; install Graphviz or choose a .dot output instead of .{kind}",
                config.dot_program
            ));
        }
    }

    let source = provenance_source(config, project, selection.graph_file.clone());
    let renderer = GraphRenderer::new(source.as_ref(), config.dot_program.clone());
    let written = renderer.build_graph_image(
        Some(&selection.revision),
        &selection.paths,
        filename,
        selection.input_notebook.as_deref(),
    )?;
    eprintln!("{} {}", "wrote".green().bold(), written.display().to_string().bold());
    println!("{}", written.display());
    Ok(())
}

fn cmd_export(
    config: &GraphVisConfig,
    project: &Path,
    selection: &Selection,
    filename: &Path,
) -> Result<()> {
    let source = provenance_source(config, project, selection.graph_file.clone());
    let renderer = GraphRenderer::new(source.as_ref(), config.dot_program.clone());
    let written = renderer.export_graph(
        Some(&selection.revision),
        &selection.paths,
        selection.input_notebook.as_deref(),
        filename,
    )?;
    eprintln!("{} {}", "wrote".green().bold(), written.display().to_string().bold());
    println!("{}", written.display());
    Ok(())
}

fn cmd_show_graph(
    config: &GraphVisConfig,
    project: &Path,
    graph_file: Option<PathBuf>,
    no_open: bool,
    include_title: bool,
    template_location: &str,
) -> Result<()> {
    let template_location = TemplateLocation::parse(template_location)?;
    let source = provenance_source(config, project, graph_file);
    let renderer = GraphRenderer::new(source.as_ref(), config.dot_program.clone());
    let (html, ttl) = renderer.build_graph_html(None, &[], template_location, include_title)?;
    let (html_path, ttl_path) = write_graph_files(&html, &ttl, project)?;

    eprintln!("{} {}", "wrote".green().bold(), html_path.display().to_string().bold());
    eprintln!("{} {}", "wrote".green().bold(), ttl_path.display().to_string().bold());
    if !no_open {
        open_in_browser(&html_path.to_string_lossy())?;
    }
    Ok(())
}

fn cmd_start_session(config: &GraphVisConfig, project: &Path, no_open: bool) -> Result<()> {
    let remote = git_remote_url(project).context("cannot read the `origin` remote")?;
    let url = select_session_url(&remote, &config.session_host)?;
    println!("will open new session: {}", url.cyan());
    if !no_open {
        open_in_browser(&url)?;
    }
    Ok(())
}

fn cmd_pre_run(config: GraphVisConfig, project: &Path, command: Vec<String>) -> Result<()> {
    let plugin = GraphVisPlugin::new(config);
    let tool = Tool { command };
    let env = plugin.pre_run(&tool)?;

    let (program, args) = tool
        .command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(project);
    env.apply(&mut cmd);

    let status = cmd
        .status()
        .with_context(|| format!("failed to start `{program}`"))?;
    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}

fn cmd_harvest(config: GraphVisConfig, activity_path: &Path) -> Result<()> {
    let text = fs::read_to_string(activity_path)
        .with_context(|| format!("failed to read {}", activity_path.display()))?;
    let activity: Activity = serde_json::from_str(&text)
        .with_context(|| format!("invalid activity description {}", activity_path.display()))?;

    let plugin = GraphVisPlugin::new(config);
    let annotations = plugin.activity_annotations(&activity)?;
    println!("{}", serde_json::to_string_pretty(&annotations)?);
    Ok(())
}

fn cmd_leaderboard(metric: &str, input: &Path) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let data: BTreeMap<String, RunRecord> = serde_json::from_str(&text)
        .with_context(|| format!("invalid run records in {}", input.display()))?;

    let board = create_leaderboard(&data, metric)?;
    if board.rows.is_empty() {
        eprintln!("{} no run reports `{metric}`", "info:".yellow().bold());
    }
    println!("{board}");
    Ok(())
}
