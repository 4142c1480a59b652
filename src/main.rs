// src/main.rs
// ============================================================================
// WMMF-CONVERT CLI
// ============================================================================
//
// Uso:
//   wmmf-convert igrf13coeffs.txt
//   wmmf-convert https://www.ngdc.noaa.gov/IAGA/vmod/coeffs/igrf13coeffs.txt \
//       -o /tmp/magnetic --force
//
// ============================================================================

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use wmmf_convert::{data, import_igrf_txt};

/// Variable de entorno con el directorio de datos de GeographicLib
const DATA_ENV: &str = "GEOGRAPHICLIB_DATA";
const DEFAULT_DATA_DIR: &str = "/usr/local/share/GeographicLib";

#[derive(Parser, Debug)]
#[command(name = "wmmf-convert")]
#[command(about = "Convert IGRF coefficient tables to WMMF magnetic models")]
#[command(version)]
struct Args {
    /// IGRF text table (path, file:// or http(s) URL)
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Output directory or .wmm file [default: <DATADIR>/magnetic]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing files
    #[arg(short, long)]
    force: bool,

    /// GeographicLib data directory
    #[arg(long, env = DATA_ENV, default_value = DEFAULT_DATA_DIR)]
    datadir: PathBuf,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else if self.verbose {
            LevelFilter::Info
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();
    let start = Instant::now();

    let output = match &args.output {
        Some(path) => path.clone(),
        None => {
            let dir = data::magnetic_dir(&args.datadir);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            dir
        }
    };

    let model = import_igrf_txt(&args.source)
        .with_context(|| format!("Failed to import {}", args.source))?;
    let saved = model
        .save(&output, args.force)
        .with_context(|| format!("Failed to save {} to {}", model.metadata.name, output.display()))?;

    info!("conversion done in {:.2}s", start.elapsed().as_secs_f64());
    if !args.quiet {
        println!("{}", saved.metadata.display());
        println!("{}", saved.coeffs.display());
    }

    Ok(())
}
