//! Heading font check for page 1 of a paper
//!
//! The body text size is inferred from all characters on the checked pages;
//! characters at least [`SIZE_FACTOR`] times larger count as headings, and a
//! paper passes when at least [`SUCCESS_THRESHOLD`] of them use the
//! [`TARGET_FONT`] family.

use std::path::Path;
use log::{debug, error, info};
use crate::pdf::{extract_chars, CharSample};
use crate::stats::{body_font_size, round2};

/// Font family the headings must use (matched as a case-insensitive substring)
pub const TARGET_FONT: &str = "Libertinus";

/// Characters this many times the body size or larger are headings
pub const SIZE_FACTOR: f64 = 1.3;

/// Minimum share of heading characters in the target font
pub const SUCCESS_THRESHOLD: f64 = 0.80;

/// Zero-based page indices inspected
pub const PAGES_TO_CHECK: [usize; 1] = [0];

/// Parameters of a heading check
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub target_font: String,
    pub size_factor: f64,
    pub success_threshold: f64,
    pub pages: Vec<usize>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            target_font: TARGET_FONT.to_string(),
            size_factor: SIZE_FACTOR,
            success_threshold: SUCCESS_THRESHOLD,
            pages: PAGES_TO_CHECK.to_vec(),
        }
    }
}

/// Outcome of a heading check
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCheck {
    pub passed: bool,
    /// Share of heading characters in the target font (0.0 to 1.0)
    pub usage: f64,
    pub heading_chars: usize,
    pub target_chars: usize,
    /// Inferred body text size, if any characters were found
    pub body_size: Option<f64>,
}

impl HeadingCheck {
    fn fail(body_size: Option<f64>) -> Self {
        Self {
            passed: false,
            usage: 0.0,
            heading_chars: 0,
            target_chars: 0,
            body_size,
        }
    }
}

/// Evaluate already extracted character samples
pub fn evaluate(samples: &[CharSample], options: &CheckOptions) -> HeadingCheck {
    let sizes: Vec<f64> = samples.iter().map(|s| round2(s.size)).collect();
    let Some(body_size) = body_font_size(&sizes) else {
        debug!("No characters found");
        return HeadingCheck::fail(None);
    };

    let threshold = body_size * options.size_factor;
    let target = options.target_font.to_uppercase();

    let mut heading_chars = 0;
    let mut target_chars = 0;
    for sample in samples.iter().filter(|s| s.size >= threshold) {
        heading_chars += 1;
        if sample.font_name.to_uppercase().contains(&target) {
            target_chars += 1;
        }
    }

    debug!(
        "Body size {:.2}, heading threshold {:.2}, {} heading characters",
        body_size, threshold, heading_chars
    );

    if heading_chars == 0 {
        return HeadingCheck::fail(Some(body_size));
    }

    let usage = target_chars as f64 / heading_chars as f64;
    HeadingCheck {
        passed: usage >= options.success_threshold,
        usage,
        heading_chars,
        target_chars,
        body_size: Some(body_size),
    }
}

/// Check the headings of a PDF file
///
/// Extraction problems (missing file, unparsable PDF or content stream) are
/// reported and yield a failed check rather than an error.
pub fn check_pdf(path: &Path, options: &CheckOptions) -> HeadingCheck {
    let samples = match extract_chars(path, &options.pages) {
        Ok(samples) => samples,
        Err(e) => {
            error!("Error during font size collection: {}", e);
            return HeadingCheck::fail(None);
        }
    };

    let check = evaluate(&samples, options);
    info!(
        "RESULT: {} ({:.1}% of {} heading characters in {})",
        if check.passed { "pass" } else { "fail" },
        check.usage * 100.0,
        check.heading_chars,
        options.target_font
    );
    check
}
