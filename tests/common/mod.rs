//! PDF fixtures generated on the fly with lopdf

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// A line of text on page 1: (base font name, font size, text)
pub type TextLine<'a> = (&'a str, i64, &'a str);

/// Write a PDF with `page_count` pages; `lines` are drawn on the first page
pub fn write_pdf(path: &Path, page_count: usize, lines: &[TextLine]) {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let mut fonts = Dictionary::new();
    let mut font_keys: Vec<(String, String)> = Vec::new();
    for (font, _, _) in lines {
        if font_keys.iter().any(|(name, _)| name == font) {
            continue;
        }
        let key = format!("F{}", font_keys.len() + 1);
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => *font,
        });
        fonts.set(key.as_bytes().to_vec(), font_id);
        font_keys.push((font.to_string(), key));
    }

    let mut operations = Vec::new();
    let mut y = 780;
    for (font, size, text) in lines {
        let key = &font_keys.iter().find(|(name, _)| name == font).unwrap().1;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![Object::Name(key.as_bytes().to_vec()), (*size).into()]));
        operations.push(Operation::new("Td", vec![72.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        operations.push(Operation::new("ET", vec![]));
        y -= 20;
    }
    let content = Content { operations }.encode().expect("failed to encode content");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let mut kids: Vec<Object> = Vec::new();
    for index in 0..page_count {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! { "Font" => fonts.clone() },
        };
        if index == 0 {
            page.set("Contents", content_id);
        }
        kids.push(doc.add_object(page).into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).expect("failed to save test PDF");
}

/// Write a PDF whose pages carry no text
pub fn write_blank_pdf(path: &Path, page_count: usize) {
    write_pdf(path, page_count, &[]);
}
