//
// cli.rs
// Mammo-Prep-rs
//
// Defines the CLI surface with Clap and dispatches user-selected commands to the corresponding modules.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use crate::backend::Backend;
use crate::bbox::PaddingAxis;
use crate::config::PrepConfig;
use crate::models::BatchReport;
use crate::{batch, metadata, source, table};

/// Command-line interface glue code: defines the available verbs and dispatches to modules.
#[derive(Parser)]
#[command(name = "mammo-prep")]
#[command(about = "Mammography image and annotation preprocessing for detector training", long_about = None)]
pub struct Cli {
    /// JSON settings file; flags below override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize and letterbox one DICOM or raster image
    Image {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum)]
        backend: Option<Backend>,
        #[arg(long)]
        export_size: Option<u32>,
    },
    /// Enrich an annotation table with numbering, labels, names and normalized boxes
    Annotate {
        table: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long)]
        target_size: Option<u32>,
        #[arg(long, value_enum)]
        padding_axis: Option<PaddingAxis>,
        /// Also write the square training images into this directory
        #[arg(long)]
        images_out: Option<PathBuf>,
    },
    /// Write square training images for every image of an enriched table
    Export {
        enriched: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long)]
        export_size: Option<u32>,
    },
    /// Convert every DICOM/raster file below a directory
    ConvertDir {
        directory: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Show the attributes that drive intensity normalization
    Info {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<PrepConfig> {
    match path {
        Some(path) => PrepConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path)),
        None => Ok(PrepConfig::default()),
    }
}

pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

pub fn run() -> Result<()> {
    // Parse the raw CLI arguments once and dispatch to a subcommand handler.
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Image {
            input,
            output,
            backend,
            export_size,
        } => {
            config.backend = backend.unwrap_or(config.backend);
            config.export_size = export_size.or(config.export_size);
            let square = source::prepare_training_image(&input, &config.normalizer())
                .with_context(|| format!("Failed to prepare {:?}", input))?;
            square
                .save(&output, config.export_size)
                .with_context(|| format!("Failed to save image to {:?}", output))?;
            info!(side = square.side(), "Image saved to {:?}", output);
        }
        Commands::Annotate {
            table: table_path,
            output,
            report,
            target_size,
            padding_axis,
            images_out,
        } => {
            config.target_size = target_size.unwrap_or(config.target_size);
            config.padding_axis = padding_axis.unwrap_or(config.padding_axis);

            let rows = table::read_annotations(&table_path)
                .with_context(|| format!("Failed to read table {:?}", table_path))?;
            let rows_read = rows.len();
            let outcome = batch::enrich_rows(rows, &config).context("Failed to enrich table")?;
            table::write_enriched(&output, &outcome.rows)
                .with_context(|| format!("Failed to write table {:?}", output))?;
            info!(
                rows = outcome.rows.len(),
                failed = outcome.failures.len(),
                "Enriched table saved to {:?}",
                output
            );

            let export = match images_out {
                Some(dir) => batch::export_images(&batch::distinct_images(&outcome.rows), &dir, &config)?,
                None => batch::ExportOutcome::default(),
            };

            if let Some(report_path) = report {
                let report = BatchReport {
                    generated_at: chrono::Local::now().to_rfc3339(),
                    rows_read,
                    rows_enriched: outcome.rows.len(),
                    distinct_images: outcome.distinct_images,
                    images_written: export.written.len(),
                    row_failures: outcome.failures,
                    image_failures: export.failures,
                };
                write_report(&report_path, &report)?;
            }
        }
        Commands::Export {
            enriched,
            out_dir,
            export_size,
        } => {
            config.export_size = export_size.or(config.export_size);
            let mut images = table::read_enriched_images(&enriched)
                .with_context(|| format!("Failed to read table {:?}", enriched))?;
            images.dedup_by(|a, b| a.0 == b.0);
            let outcome = batch::export_images(&images, &out_dir, &config)?;
            for failure in &outcome.failures {
                eprintln!("Error in {:?}: {}", failure.path, failure.message);
            }
        }
        Commands::ConvertDir { directory, out_dir } => {
            let outcome = batch::convert_directory(&directory, &out_dir, &config)?;
            println!(
                "Converted {} file(s), {} failure(s).",
                outcome.written.len(),
                outcome.failures.len()
            );
            for failure in &outcome.failures {
                eprintln!("Error in {:?}: {}", failure.path, failure.message);
            }
        }
        Commands::Info { file, json } => {
            metadata::print_info(&file, config.strict_device_models, json)?
        }
    }

    Ok(())
}

fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create report {:?}", path))?;
    serde_json::to_writer_pretty(file, report).context("Failed to serialize report")?;
    info!("Report saved to {:?}", path);
    Ok(())
}
