//! PDF inspection module

pub mod metadata;
pub mod text;

// Re-export commonly used items
pub use metadata::count_pages;
pub use text::{extract_chars, extract_page_chars, CharSample};
