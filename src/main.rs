//! Command line front end: batch annotation, deck conversion and classification summaries

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rve_mesh::{
    batch::BatchRunner,
    classify::{Classification, Classifier},
    config::PipelineConfig,
    deck::{default_deck_path, write_model},
    layout::{InclusionLayout, LayoutError},
    mesh::Mesh,
    unv::read_unv,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "rve_mesh")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify RVE meshes and convert them to Abaqus input decks", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every mesh file below a directory and append the groups to each file
    Annotate(AnnotateArgs),
    /// Write an Abaqus deck and its dimension summary for one mesh file
    Convert(ConvertArgs),
    /// Print the classification of one mesh file
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct AnnotateArgs {
    /// Directory searched (recursively) for mesh files
    root: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Error log location (defaults to a file in the root directory)
    #[arg(long)]
    error_log: Option<PathBuf>,
}

#[derive(Args)]
struct ConvertArgs {
    mesh: PathBuf,

    /// Deck path (defaults to `<mesh stem>-model.inp` next to the mesh)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Envelope thickness recorded in the dimension summary
    #[arg(long)]
    ep: Option<f64>,

    /// Inclusion layout (defaults to the layout matching the mesh path, if present)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ClassifyArgs {
    mesh: PathBuf,

    /// Inclusion layout (defaults to the layout matching the mesh path)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Annotate(args) => annotate(args),
        Commands::Convert(args) => convert(args),
        Commands::Classify(args) => classify(args),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn annotate(args: AnnotateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut runner = BatchRunner::new(config);
    if let Some(error_log) = &args.error_log {
        runner = runner.with_error_log(error_log);
    }

    let report = runner
        .run(&args.root)
        .with_context(|| format!("Batch over {} did not run", args.root.display()))?;

    println!(
        "{} files: {} annotated, {} failed",
        report.num_files(),
        report.annotated.len(),
        report.failures.len()
    );
    if !report.log_lines().is_empty() {
        println!("See {} for details", runner.error_log_path(&args.root).display());
    }

    Ok(())
}

fn convert(args: ConvertArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ep) = args.ep {
        config.envelope_thickness = ep;
    }

    let mesh = read_unv(&args.mesh)
        .with_context(|| format!("Failed to read {}", args.mesh.display()))?;

    let classification = match find_layout(&args.mesh, args.layout.as_deref(), &config)? {
        Some(layout) => Some(classify_mesh(&mesh, &layout, &config)),
        None => {
            warn!(mesh = %args.mesh.display(), "no inclusion layout; element sets come from the mesh file");
            None
        }
    };

    let deck_path = args
        .output
        .unwrap_or_else(|| default_deck_path(&args.mesh));
    let files = write_model(&mesh, classification.as_ref(), &config, &deck_path)
        .with_context(|| format!("Failed to write {}", deck_path.display()))?;

    println!("{}", files.deck.display());
    println!("{}", files.dimensions.display());
    Ok(())
}

fn classify(args: ClassifyArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mesh = read_unv(&args.mesh)
        .with_context(|| format!("Failed to read {}", args.mesh.display()))?;

    let layout = match find_layout(&args.mesh, args.layout.as_deref(), &config)? {
        Some(layout) => layout,
        None => bail!("No inclusion layout found for {}", args.mesh.display()),
    };

    let classification = classify_mesh(&mesh, &layout, &config);
    print_summary(&classification);
    Ok(())
}

/// Load the layout given on the command line, or the one matching the mesh path if it exists
fn find_layout(
    mesh_path: &Path,
    layout_path: Option<&Path>,
    config: &PipelineConfig,
) -> Result<Option<InclusionLayout>> {
    if let Some(path) = layout_path {
        return InclusionLayout::from_file(path)
            .map(Some)
            .with_context(|| format!("Failed to load inclusion layout {}", path.display()));
    }

    match InclusionLayout::for_mesh(mesh_path, config) {
        Ok(layout) => Ok(Some(layout)),
        Err(LayoutError::MissingInclusionData { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn classify_mesh(mesh: &Mesh, layout: &InclusionLayout, config: &PipelineConfig) -> Classification {
    let classification = Classifier::new(layout, config).classify(mesh);
    for (region, count) in classification.counts() {
        info!(%region, count, "classified");
    }
    classification
}

#[cfg(feature = "json_export")]
fn print_summary(classification: &Classification) {
    println!("{}", classification.to_json().pretty(4));
}

#[cfg(not(feature = "json_export"))]
fn print_summary(classification: &Classification) {
    for (region, count) in classification.counts() {
        println!("{}: {}", region, count);
    }
    for issue in classification.issues() {
        println!("{}", issue);
    }
}
