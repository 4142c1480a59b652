// src/bin/inspect.rs
// ============================================================================
// WMMF INSPECTOR - Inspecciona un modelo .wmm + .wmm.cof
// ============================================================================
//
// Uso: wmmf-inspect igrf13.wmm [--json] [--coeffs]
//      wmmf-inspect --list /usr/local/share/GeographicLib/magnetic
//
// ============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use wmmf_convert::{data, wmmf::metadata::FIELDS, Model, SphCoeffSet};

#[derive(Parser)]
#[command(name = "wmmf-inspect")]
#[command(about = "Inspect WMMF magnetic model files")]
struct Args {
    /// .wmm metadata file (the .wmm.cof companion is read too)
    #[arg(required_unless_present = "list")]
    file: Option<PathBuf>,

    /// List the models installed in a directory
    #[arg(long, value_name = "DIR", conflicts_with = "file")]
    list: Option<PathBuf>,

    /// Print metadata as JSON
    #[arg(long)]
    json: bool,

    /// Print non-zero coefficients of each entry
    #[arg(long)]
    coeffs: bool,
}

fn format_size(size: u64) -> String {
    if size < 1024 {
        format!("{} B", size)
    } else if size < 1024 * 1024 {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / 1024.0 / 1024.0)
    }
}

fn print_coeffs(set: &SphCoeffSet) {
    for (n, m, value) in set.c.nonzeros() {
        println!("    g {:3} {:3} {:14.4}", n, m, value);
    }
    for (n, m, value) in set.s.nonzeros() {
        println!("    h {:3} {:3} {:14.4}", n, m, value);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Some(dir) = &args.list {
        let names = data::find_models(dir)
            .with_context(|| format!("Cannot list {}", dir.display()))?;
        for name in names {
            println!("{}", data::metadata_path(dir, &name).display());
        }
        return Ok(());
    }

    let Some(file) = args.file else {
        anyhow::bail!("No model file specified");
    };
    let model = Model::load(&file)
        .with_context(|| format!("Cannot load {}", file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&model.metadata)?);
        return Ok(());
    }

    let bin_path = data::coeffs_path(&file);
    let bin_size = std::fs::metadata(&bin_path)?.len();

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("  WMMF INSPECTOR");
    println!("════════════════════════════════════════════════════════════════");
    println!("  Metadata:      {}", file.display());
    println!("  Coeficientes:  {} ({})", bin_path.display(), format_size(bin_size));
    println!();

    println!("┌──────────────────────────────────────────────────────────────┐");
    println!("│ METADATA (WMMF-{})", model.metadata.format_version);
    println!("├──────────────────────────────────────────────────────────────┤");
    for spec in FIELDS {
        if let Some(value) = model.metadata.value(spec.name) {
            println!("│  {:16} {}", spec.name, value);
        }
    }
    println!("└──────────────────────────────────────────────────────────────┘");
    println!();

    println!("┌──────────────────────────────────────────────────────────────┐");
    println!("│ COEFICIENTES");
    println!("├──────────────────────────────────────────────────────────────┤");
    println!("│  {:>8}  {:>4}  {:>4}  {:>10}", "entry", "N", "M", "packed");
    for (key, set) in model.iter() {
        let packed = set.pack()?;
        println!(
            "│  {:>8}  {:>4}  {:>4}  {:>10}",
            key.to_string(),
            packed.n,
            packed.m,
            format_size(packed.byte_len() as u64)
        );
        if args.coeffs {
            print_coeffs(set);
        }
    }
    println!("└──────────────────────────────────────────────────────────────┘");

    Ok(())
}
