//! Heading font check CLI tool
//!
//! Exits with status 0 if the headings on page 1 of the given PDF are set in
//! Libertinus, 1 otherwise. Nothing is printed on success or failure; set
//! `RUST_LOG=info` (or `debug`) to see the measurements.

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process;

use ceur_tools::headings::{check_pdf, CheckOptions};

const USAGE: &str = "Usage: check-libbyhead <pdffile>";

/// Check that page-1 headings of a paper use the Libertinus font
#[derive(Parser)]
#[command(name = "check-libbyhead")]
#[command(version, about, disable_help_flag = true)]
struct Cli {
    /// Print usage and exit
    #[arg(short, long, action = ArgAction::SetTrue)]
    help: bool,

    /// PDF file to check
    pdf_file: PathBuf,
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

    let check = check_pdf(&cli.pdf_file, &CheckOptions::default());

    process::exit(if check.passed { 0 } else { 1 });
}
