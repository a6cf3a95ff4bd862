//! Seglabel: interactive two-class polygon labeling into COCO datasets.
//!
//! An operator walks through a directory of images and outlines objects of
//! two classes with the mouse. Every finished image is written straight into
//! a COCO manifest plus a plain index of processed paths, so a session can
//! be stopped at any point and resumed later.
//!
//! # Modules
//!
//! - [`geometry`]: points, polygons, and bounding boxes
//! - [`label`]: the per-image labeling state machine
//! - [`dataset`]: the session-wide accumulator of labeled images
//! - [`export`]: COCO manifest and path index persistence
//! - [`session`]: the driver loop and its external-service seams
//! - [`check`]: structural checks over a written manifest
//! - [`backfill`]: rectangle segmentation rewrite
//! - [`error`]: error types

pub mod backfill;
pub mod check;
pub mod dataset;
pub mod error;
pub mod export;
pub mod geometry;
pub mod label;
pub mod session;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::LabelError;

/// The seglabel CLI application.
#[derive(Parser)]
#[command(name = "seglabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Label images, resuming from any previous session.
    Label(LabelArgs),
    /// Check a manifest for errors and warnings.
    Check(CheckArgs),
    /// Replace every segmentation with its bounding-box rectangle.
    Backfill(BackfillArgs),
}

/// Arguments for the label subcommand.
#[derive(clap::Args)]
struct LabelArgs {
    /// Directory searched recursively for images.
    #[arg(long, env = "SEGLABEL_IMAGES", default_value = "data/images")]
    images: PathBuf,

    /// Index of already processed image paths.
    #[arg(long, env = "SEGLABEL_INDEX", default_value = "data/paths.txt")]
    index: PathBuf,

    /// COCO manifest to write.
    #[arg(
        long,
        env = "SEGLABEL_MANIFEST",
        default_value = "data/_annotations.coco.json"
    )]
    manifest: PathBuf,

    /// Event script to replay (reads stdin when omitted).
    #[arg(long, env = "SEGLABEL_EVENTS")]
    events: Option<PathBuf>,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    /// Manifest to check.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the backfill subcommand.
#[derive(clap::Args)]
struct BackfillArgs {
    /// Manifest to rewrite in place.
    input: PathBuf,
}

/// Run the seglabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Label(args)) => run_label(args),
        Some(Commands::Check(args)) => run_check(args),
        Some(Commands::Backfill(args)) => run_backfill(args),
        None => {
            println!("seglabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Interactive two-class polygon labeling into COCO datasets.");
            println!();
            println!("Run 'seglabel --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the label subcommand.
fn run_label(args: LabelArgs) -> Result<(), LabelError> {
    let config = session::SessionConfig {
        images: args.images,
        artifacts: export::Artifacts::new(args.index, args.manifest),
    };

    let mut images = session::ImagesizeSource;
    let mut surface = session::LogSurface;
    let summary = match args.events {
        Some(path) => {
            let file = File::open(&path)?;
            let mut input = session::ScriptedInput::new(BufReader::new(file));
            session::run_session(&config, &mut images, &mut input, &mut surface)?
        }
        None => {
            let mut input = session::ScriptedInput::new(io::stdin().lock());
            session::run_session(&config, &mut images, &mut input, &mut surface)?
        }
    };

    println!(
        "Labeled {} image(s), skipped {} already indexed, {} unreadable",
        summary.labeled, summary.skipped, summary.unreadable
    );
    if let Some(path) = summary.abandoned {
        println!("Stopped while labeling {} (not saved)", path);
    }
    Ok(())
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs) -> Result<(), LabelError> {
    let manifest = export::read_manifest(&args.input)?;
    let report = check::check_manifest(&manifest);

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report.to_json()).map_err(|source| {
                LabelError::ManifestWrite {
                    path: args.input.clone(),
                    source,
                }
            })?;
            println!("{}", json);
        }
        "text" => print!("{}", report),
        other => {
            return Err(LabelError::UnsupportedOutput(format!(
                "'{}' (supported: text, json)",
                other
            )));
        }
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(LabelError::CheckFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the backfill subcommand.
fn run_backfill(args: BackfillArgs) -> Result<(), LabelError> {
    let count = backfill::backfill_rect_segmentation(&args.input)?;
    println!(
        "Rewrote {} segmentation(s) in {}",
        count,
        args.input.display()
    );
    Ok(())
}
