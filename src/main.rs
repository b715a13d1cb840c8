use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use metadata_transform::Result;
use metadata_transform::config::TransformConfig;
use metadata_transform::output::OutputLayout;
use metadata_transform::pipeline::{BatchReport, Mode, Pipeline};
use metadata_transform::provenance::{CatalogIndex, FileCatalog, SourceTable};
use metadata_transform::render::Template;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "metadata-transform")]
#[command(about = "Transform dataset metadata documents through a template", long_about = None)]
struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Directory searched recursively for metadata documents.
    path: PathBuf,

    /// Dataset YAML template.
    #[arg(long)]
    template: PathBuf,

    /// `dataset_source` export (YAML or JSON rows) used to resolve lineage.
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Transform configuration (grids, property offsets, file names).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the metadata file name to search for.
    #[arg(long)]
    metadata_filename: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform every metadata document and write the results.
    Transform {
        #[command(flatten)]
        inputs: Inputs,

        /// Mirror outputs under this directory instead of next to each input.
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Override the output file name.
        #[arg(long)]
        output_filename: Option<String>,
    },

    /// Render and validate every metadata document without writing.
    Check {
        #[command(flatten)]
        inputs: Inputs,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(inputs: &Inputs, output_filename: Option<String>) -> Result<TransformConfig> {
    let mut config = match &inputs.config {
        Some(path) => TransformConfig::from_file(path)?,
        None => TransformConfig::default(),
    };
    if let Some(name) = &inputs.metadata_filename {
        config.metadata_filename = name.clone();
    }
    if let Some(name) = output_filename {
        config.output_filename = name;
    }
    config.validate().context("invalid transform configuration")?;
    Ok(config)
}

fn open_catalog(sources: Option<&Path>) -> Result<Box<dyn CatalogIndex>> {
    match sources {
        Some(path) => {
            if !path.is_file() {
                bail!("sources export not found: {}", path.display());
            }
            Ok(Box::new(FileCatalog::new(path)))
        }
        None => {
            warn!("no --sources given; lineage will be empty");
            Ok(Box::new(SourceTable::default()))
        }
    }
}

fn run(inputs: &Inputs, config: &TransformConfig, layout: &OutputLayout, mode: Mode) -> Result<BatchReport> {
    if !inputs.path.is_dir() {
        bail!("input path is not a directory: {}", inputs.path.display());
    }

    let template = Template::from_file(&inputs.template)?;
    for p in template.placeholders() {
        debug!(path = %p.path, optional = p.optional, line = p.line, "template placeholder");
    }

    let catalog = open_catalog(inputs.sources.as_deref())?;
    let pipeline = Pipeline::new(&template, config, catalog.as_ref());
    Ok(pipeline.run(&inputs.path, layout, mode))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let report = match cli.cmd {
        Commands::Transform {
            inputs,
            output_dir,
            output_filename,
        } => {
            let config = load_config(&inputs, output_filename)?;
            let layout = OutputLayout::new(&inputs.path, output_dir, &config.output_filename);
            let report = run(&inputs, &config, &layout, Mode::Write)?;
            println!("Wrote {} of {} documents", report.written.len(), report.processed());
            report
        }
        Commands::Check { inputs } => {
            let config = load_config(&inputs, None)?;
            let layout = OutputLayout::new(&inputs.path, None, &config.output_filename);
            let report = run(&inputs, &config, &layout, Mode::Check)?;
            println!("{} of {} documents valid", report.validated, report.processed());
            report
        }
    };

    if report.processed() == 0 {
        info!("no metadata documents found");
    }
    if !report.is_clean() {
        for failure in &report.failures {
            eprintln!("{}: {}", failure.path.display(), failure.error);
        }
        bail!("{} document(s) failed", report.failures.len());
    }

    Ok(())
}
