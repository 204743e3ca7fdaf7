//! CEUR Tools Library
//!
//! Helpers for preparing CEUR-WS proceedings volumes.
//! This library provides functionality to:
//! - Stamp page ranges into the `CEURPAGES` fields of a volume's `index.html`
//! - Count pages of the referenced paper PDFs
//! - Check that the headings on page 1 of a paper use the Libertinus font
//!
//! # Example
//!
//! ```no_run
//! use ceur_tools::pagenum::add_page_numbers;
//! use ceur_tools::headings::{check_pdf, CheckOptions};
//! use std::path::Path;
//!
//! let numbered = add_page_numbers(Path::new("vol-1234")).expect("Failed to number pages");
//! println!("{} papers numbered", numbered.len());
//!
//! let check = check_pdf(Path::new("vol-1234/paper1.pdf"), &CheckOptions::default());
//! println!("headings ok: {}", check.passed);
//! ```

pub mod error;
pub mod pdf;
pub mod stats;
pub mod pagenum;
pub mod headings;

// Re-export commonly used items
pub use error::{Error, Result};
