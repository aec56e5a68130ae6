//! cc-bindings-ir CLI
//!
//! Entry point for the command-line tool: deserialize a translation unit,
//! run the importer, write the IR as JSON. Declarations that could not be
//! imported are data in the output, not failures; only I/O and
//! configuration problems exit non-zero.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use cc_bindings_ir::{ImportConfig, TranslationUnit, import_translation_unit};

#[derive(Parser, Debug)]
#[command(name = "cc-bindings-ir")]
#[command(about = "Lower C++ header declarations into a binding IR", long_about = None)]
struct Args {
    /// Path to the translation unit JSON produced by the front-end
    #[arg(long)]
    ast: PathBuf,

    /// Path to configuration file
    #[arg(short, long, default_value = "cc-bindings-ir.toml")]
    config: PathBuf,

    /// Write the IR here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the IR JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ImportConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;

    let tu_json = std::fs::read_to_string(&args.ast)
        .with_context(|| format!("Failed to read translation unit {}", args.ast.display()))?;
    let tu: TranslationUnit =
        serde_json::from_str(&tu_json).context("Failed to parse translation unit JSON")?;

    let ir = import_translation_unit(&tu, &config);

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&ir)?
    } else {
        serde_json::to_string(&ir)?
    };

    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write IR to {}", path.display()))?,
        None => println!("{rendered}"),
    }

    Ok(())
}
