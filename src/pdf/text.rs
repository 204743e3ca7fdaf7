//! Character-level text extraction using lopdf
//!
//! This module interprets a page's content stream just far enough to know,
//! for every glyph shown, which font draws it and how tall it is rendered.
//! Glyph positions are not tracked; text and graphics transforms only matter
//! for their scaling part.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use log::{debug, warn};
use crate::error::{Error, Result};

/// Nesting limit for Form XObjects invoked from a content stream
const MAX_FORM_DEPTH: usize = 16;

/// Name reported for glyphs whose font resource cannot be resolved
const UNKNOWN_FONT: &str = "unknown";

/// Glyph space to text space for all fonts except Type3
const GLYPH_SCALE: f64 = 0.001;

/// One rendered glyph: the font that draws it and its rendered size
#[derive(Debug, Clone, PartialEq)]
pub struct CharSample {
    /// Base font name, including any subset prefix (e.g. `ABCDEF+LibertinusSerif-Bold`)
    pub font_name: String,
    /// Height of the glyph box in device space
    pub size: f64,
}

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let nums: Vec<f64> = operands.iter().filter_map(number).collect();
        if nums.len() != 6 {
            return None;
        }
        Some(Self { a: nums[0], b: nums[1], c: nums[2], d: nums[3], e: nums[4], f: nums[5] })
    }

    /// Concatenate: apply `self` first, then `other`
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }
}

/// Font metrics needed to split strings into glyphs and size their boxes
#[derive(Debug, Clone)]
struct FontInfo {
    name: String,
    /// Type0 fonts use two-byte codes
    composite: bool,
    first_char: i64,
    widths: Vec<f64>,
    cid_widths: CidWidths,
    default_width: f64,
    /// Type3 fonts scale glyph space by their /FontMatrix
    width_scale: f64,
}

impl FontInfo {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN_FONT.to_string(),
            composite: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: CidWidths::default(),
            default_width: 0.0,
            width_scale: GLYPH_SCALE,
        }
    }

    fn load(doc: &Document, font: &Dictionary) -> Self {
        let name = match dict_get(doc, font, b"BaseFont") {
            Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
            _ => UNKNOWN_FONT.to_string(),
        };

        let composite = matches!(dict_get(doc, font, b"Subtype"), Some(Object::Name(s)) if s == b"Type0");

        if composite {
            let cid_font = dict_get(doc, font, b"DescendantFonts")
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| resolve(doc, o).as_dict().ok());

            let (default_width, cid_widths) = match cid_font {
                Some(cid_font) => (
                    dict_get(doc, cid_font, b"DW").and_then(number).unwrap_or(1000.0),
                    dict_get(doc, cid_font, b"W")
                        .and_then(|o| o.as_array().ok())
                        .map(|w| parse_cid_widths(doc, w))
                        .unwrap_or_default(),
                ),
                None => (1000.0, CidWidths::default()),
            };

            return Self {
                name,
                composite,
                first_char: 0,
                widths: Vec::new(),
                cid_widths,
                default_width,
                width_scale: GLYPH_SCALE,
            };
        }

        let first_char = match dict_get(doc, font, b"FirstChar") {
            Some(Object::Integer(n)) => *n,
            _ => 0,
        };
        let widths: Vec<f64> = dict_get(doc, font, b"Widths")
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().map(|w| number(resolve(doc, w)).unwrap_or(0.0)).collect())
            .unwrap_or_default();
        let default_width = dict_get(doc, font, b"FontDescriptor")
            .and_then(|o| o.as_dict().ok())
            .and_then(|desc| dict_get(doc, desc, b"MissingWidth"))
            .and_then(number)
            .unwrap_or(0.0);
        let width_scale = match dict_get(doc, font, b"Subtype") {
            Some(Object::Name(s)) if s == b"Type3" => dict_get(doc, font, b"FontMatrix")
                .and_then(|o| o.as_array().ok())
                .and_then(|m| m.first())
                .and_then(|a| number(resolve(doc, a)))
                .unwrap_or(GLYPH_SCALE),
            _ => GLYPH_SCALE,
        };

        Self {
            name,
            composite,
            first_char,
            widths,
            cid_widths: CidWidths::default(),
            default_width,
            width_scale,
        }
    }

    /// Split a shown string into character codes
    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        }
    }

    /// Glyph width in text space units (before applying the font size)
    fn width(&self, code: u32) -> f64 {
        let glyph_width = if self.composite {
            self.cid_widths.get(code).unwrap_or(self.default_width)
        } else {
            let index = i64::from(code) - self.first_char;
            usize::try_from(index)
                .ok()
                .and_then(|i| self.widths.get(i))
                .copied()
                .unwrap_or(self.default_width)
        };
        glyph_width * self.width_scale
    }
}

/// CIDFont glyph widths from a /W array
///
/// `c_first c_last w` entries stay as spans so a huge range costs one entry.
#[derive(Debug, Clone, Default)]
struct CidWidths {
    single: HashMap<u32, f64>,
    ranges: Vec<(u32, u32, f64)>,
}

impl CidWidths {
    fn get(&self, cid: u32) -> Option<f64> {
        self.single.get(&cid).copied().or_else(|| {
            self.ranges
                .iter()
                .find(|(first, last, _)| (*first..=*last).contains(&cid))
                .map(|(_, _, width)| *width)
        })
    }
}

fn cid(value: f64) -> Option<u32> {
    if value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

/// Parse a CIDFont /W array: `c [w1 w2 ...]` and `c_first c_last w` forms
fn parse_cid_widths(doc: &Document, w: &[Object]) -> CidWidths {
    let mut widths = CidWidths::default();
    let mut i = 0;
    while i < w.len() {
        let Some(first) = number(resolve(doc, &w[i])).and_then(cid) else { break };
        match w.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    let Some(code) = u32::try_from(offset).ok().and_then(|o| first.checked_add(o)) else {
                        break;
                    };
                    if let Some(width) = number(resolve(doc, width)) {
                        widths.single.insert(code, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(width)) = (
                    number(last).and_then(cid),
                    w.get(i + 2).and_then(|o| number(resolve(doc, o))),
                ) else {
                    break;
                };
                if first <= last {
                    widths.ranges.push((first, last, width));
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Graphics state entries that affect glyph size (saved and restored by q/Q)
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Rc<FontInfo>>,
    font_size: f64,
    /// Tz operand divided by 100
    horizontal_scaling: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::identity(),
            font: None,
            font_size: 0.0,
            horizontal_scaling: 1.0,
        }
    }
}

struct PageInterpreter<'a> {
    doc: &'a Document,
    samples: Vec<CharSample>,
}

impl<'a> PageInterpreter<'a> {
    fn new(doc: &'a Document) -> Self {
        Self { doc, samples: Vec::new() }
    }

    fn run(
        &mut self,
        content: &[u8],
        resources: &'a Dictionary,
        state: GraphicsState,
        depth: usize,
    ) -> Result<()> {
        let content = Content::decode(content)?;

        let mut gs = state;
        let mut saved: Vec<GraphicsState> = Vec::new();
        let mut text_matrix = Matrix::identity();

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => saved.push(gs.clone()),
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        gs = previous;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
                "BT" => text_matrix = Matrix::identity(),
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        text_matrix = m;
                    }
                }
                "Tf" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        gs.font = Some(Rc::new(self.load_font(resources, name)));
                    }
                    if let Some(size) = operands.get(1).and_then(number) {
                        gs.font_size = size;
                    }
                }
                "Tz" => {
                    if let Some(scale) = operands.first().and_then(number) {
                        gs.horizontal_scaling = scale / 100.0;
                    }
                }
                "Tj" | "'" => {
                    if let Some(Object::String(bytes, _)) = operands.last() {
                        self.show(&gs, &text_matrix, bytes);
                    }
                }
                "\"" => {
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.show(&gs, &text_matrix, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            if let Object::String(bytes, _) = item {
                                self.show(&gs, &text_matrix, bytes);
                            }
                        }
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.run_form(resources, name, &gs, depth)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn show(&mut self, gs: &GraphicsState, text_matrix: &Matrix, bytes: &[u8]) {
        let Some(font) = &gs.font else {
            debug!("Ignoring text shown before any font was selected");
            return;
        };

        let rendering = text_matrix.then(&gs.ctm);
        for code in font.codes(bytes) {
            let advance = font.width(code) * gs.font_size * gs.horizontal_scaling;
            let size = (rendering.b * advance).abs() + (rendering.d * gs.font_size).abs();
            self.samples.push(CharSample {
                font_name: font.name.clone(),
                size,
            });
        }
    }

    fn load_font(&self, resources: &Dictionary, name: &[u8]) -> FontInfo {
        let font = dict_get(self.doc, resources, b"Font")
            .and_then(|o| o.as_dict().ok())
            .and_then(|fonts| dict_get(self.doc, fonts, name))
            .and_then(|o| o.as_dict().ok());

        match font {
            Some(font) => FontInfo::load(self.doc, font),
            None => {
                warn!("Font resource /{} not found", String::from_utf8_lossy(name));
                FontInfo::unknown()
            }
        }
    }

    fn run_form(
        &mut self,
        resources: &'a Dictionary,
        name: &[u8],
        gs: &GraphicsState,
        depth: usize,
    ) -> Result<()> {
        let Some(Object::Stream(stream)) = dict_get(self.doc, resources, b"XObject")
            .and_then(|o| o.as_dict().ok())
            .and_then(|xobjects| dict_get(self.doc, xobjects, name))
        else {
            return Ok(());
        };

        if !matches!(dict_get(self.doc, &stream.dict, b"Subtype"), Some(Object::Name(s)) if s == b"Form") {
            return Ok(());
        }

        if depth >= MAX_FORM_DEPTH {
            warn!("Form XObjects nested deeper than {}; skipping", MAX_FORM_DEPTH);
            return Ok(());
        }

        let form_resources = dict_get(self.doc, &stream.dict, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .unwrap_or(resources);

        let mut form_state = gs.clone();
        if let Some(m) = stream.dict.get(b"Matrix").ok()
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| Matrix::from_operands(arr))
        {
            form_state.ctm = m.then(&gs.ctm);
        }

        let content = if stream.dict.get(b"Filter").is_ok() {
            stream.decompressed_content()?
        } else {
            stream.content.clone()
        };

        self.run(&content, form_resources, form_state, depth + 1)
    }
}

/// Extract character samples from one page (zero-based index) of a loaded document
pub fn extract_page_chars(doc: &Document, page_index: usize) -> Result<Vec<CharSample>> {
    let pages = doc.get_pages();
    let page_id = u32::try_from(page_index + 1)
        .ok()
        .and_then(|page_number| pages.get(&page_number))
        .copied()
        .ok_or(Error::PageNotFound(page_index))?;

    let content = doc.get_page_content(page_id)?;

    let no_resources = Dictionary::new();
    let resources = page_resources(doc, page_id).unwrap_or(&no_resources);

    let mut interpreter = PageInterpreter::new(doc);
    interpreter.run(&content, resources, GraphicsState::default(), 0)?;

    debug!("Page {}: {} characters", page_index, interpreter.samples.len());
    Ok(interpreter.samples)
}

/// Extract character samples from the given pages (zero-based) of a PDF file
///
/// Pages the document does not have are skipped.
pub fn extract_chars(path: &Path, page_indices: &[usize]) -> Result<Vec<CharSample>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;

    let mut samples = Vec::new();
    for &index in page_indices {
        match extract_page_chars(&doc, index) {
            Ok(page_samples) => samples.extend(page_samples),
            Err(Error::PageNotFound(_)) => debug!("{} has no page {}", path.display(), index),
            Err(e) => return Err(e),
        }
    }
    Ok(samples)
}

/// Look up /Resources on the page, walking up the page tree via /Parent
///
/// A /Parent chain that revisits a node ends the walk with no resources.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut visited = HashSet::new();
    let mut current = page_id;
    while visited.insert(current) {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Some(resources) = dict_get(doc, dict, b"Resources") {
            return resources.as_dict().ok();
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    warn!("Page tree /Parent chain loops back to {:?}", current);
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|o| resolve(doc, o))
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
