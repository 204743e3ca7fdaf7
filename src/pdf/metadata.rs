//! Page counting for paper PDFs

use std::path::Path;
use lopdf::{Document, Object};
use log::warn;
use crate::error::{Error, Result};

/// Count pages by walking the page tree from the catalog
///
/// The root's /Count is only a cross-check: some producers write a wrong
/// value, and the leaves of the tree are what a reader actually shows.
pub fn count_pages_in(doc: &Document) -> Result<usize> {
    let catalog_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(Error::General("Root is not a reference".to_string())),
        Err(_) => return Err(Error::General("No Root in trailer".to_string())),
    };

    let catalog_dict = match doc.get_object(catalog_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::General("Catalog is not a dictionary".to_string())),
    };

    let pages_id = match catalog_dict.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(Error::General("Pages is not a reference".to_string())),
        Err(_) => return Err(Error::General("No Pages in catalog".to_string())),
    };

    let pages_dict = match doc.get_object(pages_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::General("Pages is not a dictionary".to_string())),
    };

    let declared = match pages_dict.get(b"Count") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
        Ok(other) => Some(other),
        Err(_) => None,
    };
    let declared = match declared {
        Some(Object::Integer(n)) if *n >= 0 => Some(*n as usize),
        _ => None,
    };

    let counted = doc.get_pages().len();
    match declared {
        Some(n) if n != counted => {
            warn!("Pages /Count says {} but the page tree has {} pages", n, counted)
        }
        None => warn!("Pages has no usable /Count; using the {} pages in the tree", counted),
        _ => {}
    }

    Ok(counted)
}

/// Count the number of pages in a PDF file
///
/// Fails if the file is missing, cannot be parsed, or has zero pages.
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = count_pages_in(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}
