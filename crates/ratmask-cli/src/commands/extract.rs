//! Extract command - turn one RAT PDF into its closing mask.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::{debug, info};

use ratmask_core::{RatConfig, RatExtractor};

/// Input file does not exist.
pub const EXIT_NOT_FOUND: u8 = 2;
/// Input is not a readable PDF document.
pub const EXIT_OPEN_FAILURE: u8 = 3;
/// Anything else: unreadable file, bad configuration.
pub const EXIT_OTHER: u8 = 4;

/// Arguments for extraction.
#[derive(Args)]
pub struct ExtractArgs {
    /// RAT PDF file
    pub pdf_path: PathBuf,

    /// Print the raw field map as JSON to stderr
    #[arg(long)]
    pub fields: bool,

    /// Enable the OCR fallback with models from this directory
    #[arg(long, value_name = "DIR")]
    pub ocr_models: Option<PathBuf>,
}

/// A failed run and the exit code it maps to.
#[derive(Debug)]
pub struct Failure {
    pub code: u8,
    pub error: anyhow::Error,
}

impl Failure {
    fn new(code: u8, error: anyhow::Error) -> Self {
        Self { code, error }
    }
}

pub fn run(args: &ExtractArgs, config_path: Option<&Path>) -> Result<(), Failure> {
    if !args.pdf_path.exists() {
        return Err(Failure::new(
            EXIT_NOT_FOUND,
            anyhow::anyhow!("file not found: {}", args.pdf_path.display()),
        ));
    }

    let mut config = load_config(config_path).map_err(|e| Failure::new(EXIT_OTHER, e))?;
    if let Some(dir) = &args.ocr_models {
        config.ocr.enabled = true;
        config.ocr.model_dir = dir.clone();
    }

    let data = fs::read(&args.pdf_path)
        .with_context(|| format!("failed to read {}", args.pdf_path.display()))
        .map_err(|e| Failure::new(EXIT_OTHER, e))?;

    let extractor = RatExtractor::from_config(config);
    let result = extractor.extract(&data).map_err(|e| {
        let code = if e.is_open_failure() {
            EXIT_OPEN_FAILURE
        } else {
            EXIT_OTHER
        };
        let error = anyhow::Error::new(e)
            .context(format!("failed to open {}", args.pdf_path.display()));
        Failure::new(code, error)
    })?;

    info!(
        "Extracted {} fields ({:?}) in {}ms",
        result.fields.len(),
        result.mode,
        result.processing_time_ms
    );

    for warning in &result.warnings {
        eprintln!("{} {}", style("warning:").yellow(), warning);
    }

    if args.fields {
        let json = serde_json::to_string_pretty(&result.fields)
            .context("failed to serialize fields")
            .map_err(|e| Failure::new(EXIT_OTHER, e))?;
        eprintln!("{}", json);
    }

    print!("{}", result.mask);
    Ok(())
}

/// Explicit `--config`, else the user config file when present, else defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<RatConfig> {
    if let Some(path) = explicit {
        return RatConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            debug!("Using config {}", path.display());
            RatConfig::from_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        _ => Ok(RatConfig::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ratmask").join("config.json"))
}
