//! CEUR page numbering CLI tool
//!
//! Adds page ranges to the `CEURPAGES` fields of a volume's index.html.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process;

use ceur_tools::pagenum::{add_page_numbers, backup_path, INDEX_FILE};

const USAGE: &str = "\
Usage: ceur-add-pagenum [-h|<dir>]

where <dir> is the directory containing the index.html file and all paper PDFs.
If <dir> is omitted, the current directory is assumed. The original file is
saved with the bak extension.";

/// Add page numbers to a CEUR-WS index.html
#[derive(Parser)]
#[command(name = "ceur-add-pagenum")]
#[command(version, about, disable_help_flag = true)]
struct Cli {
    /// Print usage and exit
    #[arg(short, long, action = ArgAction::SetTrue)]
    help: bool,

    /// Directory containing index.html and the paper PDFs
    dir: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) if !cli.help => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => e.exit(),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(cli.dir.unwrap_or_else(|| PathBuf::from("."))) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(dir: PathBuf) -> Result<()> {
    let index = dir.join(INDEX_FILE);

    let numbered = add_page_numbers(&dir)
        .with_context(|| format!("Failed to add page numbers to {}", index.display()))?;

    match numbered.last() {
        Some(last) => eprintln!(
            "Numbered {} papers, {} pages in total (original saved as {})",
            numbered.len(),
            last.range.last,
            backup_path(&index).display()
        ),
        None => eprintln!("No linked paper entries found in {}", index.display()),
    }

    Ok(())
}
