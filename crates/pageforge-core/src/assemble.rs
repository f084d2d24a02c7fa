//! Document assembly.
//!
//! Turns an instruction list plus the loaded sources into one new document.
//! The algorithm follows the usual lopdf merge shape:
//!
//! 1. Validate every instruction up front (no partial output on error).
//! 2. For each referenced source, import its objects once with an
//!    object-id offset so ids never collide.
//! 3. Give every instruction its own page dictionary (cloned from the
//!    imported page) so duplicate references stay independent, compose the
//!    rotation delta onto the stored `/Rotate`, and reparent it.
//! 4. Rebuild the page tree in instruction order and prune everything the
//!    output no longer reaches.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::PageForgeError;
use crate::instruction::PageInstruction;
use crate::source::SourceSet;

/// Default size for synthesized blank pages (US Letter at 72 DPI).
const BLANK_PAGE_SIZE: (i64, i64) = (612, 792);

/// Assemble one output document from an instruction list.
///
/// Output page order exactly matches instruction order. Any page index
/// outside its source's range fails the whole request before anything is
/// copied; indices are never clamped.
pub fn assemble(
    instructions: &[PageInstruction],
    sources: &SourceSet,
) -> Result<Document, PageForgeError> {
    if instructions.is_empty() {
        return Err(PageForgeError::InvalidInstruction(
            "instruction list is empty".into(),
        ));
    }
    validate(instructions, sources)?;

    let mut dest = Document::with_version("1.5");
    let pages_id = dest.new_object_id();

    // Remapped page object ids per source, filled in on first use.
    let mut imported: BTreeMap<usize, Vec<ObjectId>> = BTreeMap::new();
    let mut kids: Vec<Object> = Vec::with_capacity(instructions.len());

    for instruction in instructions {
        match *instruction {
            PageInstruction::Blank => {
                let mut page = Dictionary::new();
                page.set("Type", Object::Name(b"Page".to_vec()));
                page.set("Parent", Object::Reference(pages_id));
                page.set(
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(BLANK_PAGE_SIZE.0),
                        Object::Integer(BLANK_PAGE_SIZE.1),
                    ]),
                );
                let id = dest.add_object(page);
                kids.push(Object::Reference(id));
            }
            PageInstruction::Copy {
                source,
                page,
                rotation,
            } => {
                if !imported.contains_key(&source) {
                    let remapped = import_source(&mut dest, sources, source)?;
                    imported.insert(source, remapped);
                }
                let src_page_id = imported[&source][page];
                let id = copy_page(&mut dest, src_page_id, pages_id, rotation)?;
                kids.push(Object::Reference(id));
            }
        }
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    dest.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = dest.add_object(catalog);
    dest.trailer.set("Root", Object::Reference(catalog_id));

    // Imported objects the new page tree does not reach (old catalogs, pages
    // we never referenced) go away here.
    dest.prune_objects();

    Ok(dest)
}

/// Check every copy instruction against the loaded sources before touching
/// any document.
fn validate(
    instructions: &[PageInstruction],
    sources: &SourceSet,
) -> Result<(), PageForgeError> {
    for instruction in instructions {
        if let PageInstruction::Copy { source, page, .. } = *instruction {
            let page_count = sources.page_count(source).ok_or_else(|| {
                PageForgeError::InvalidInstruction(format!(
                    "instruction references source {}, but only {} file(s) were provided",
                    source,
                    sources.len()
                ))
            })?;
            if page >= page_count {
                return Err(PageForgeError::PageOutOfRange {
                    source_index: source,
                    page,
                    page_count,
                });
            }
        }
    }
    Ok(())
}

/// Import all objects of one source into `dest` with remapped ids, returning
/// the remapped page ids in page order.
fn import_source(
    dest: &mut Document,
    sources: &SourceSet,
    source: usize,
) -> Result<Vec<ObjectId>, PageForgeError> {
    let loaded = sources.loaded(source).ok_or_else(|| {
        PageForgeError::InvalidInstruction(format!("unknown source {}", source))
    })?;

    let offset = dest.max_id;
    for (old_id, object) in &loaded.doc.objects {
        let new_id = (old_id.0 + offset, old_id.1);
        dest.objects
            .insert(new_id, remap_object_refs(object.clone(), offset));
    }
    dest.max_id = dest.max_id.max(loaded.doc.max_id + offset);

    Ok(loaded
        .pages
        .iter()
        .map(|id| (id.0 + offset, id.1))
        .collect())
}

/// Clone one imported page into a fresh object with composed rotation.
fn copy_page(
    dest: &mut Document,
    src_page_id: ObjectId,
    pages_id: ObjectId,
    rotation: i32,
) -> Result<ObjectId, PageForgeError> {
    let mut page_dict = dest
        .objects
        .get(&src_page_id)
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .ok_or_else(|| {
            PageForgeError::Operation(format!("imported page object {:?} missing", src_page_id))
        })?;

    // Inheritable attributes must be materialized on the copy: its new parent
    // is our page tree root, which carries none of them.
    for key in [
        b"Resources".as_slice(),
        b"MediaBox".as_slice(),
        b"CropBox".as_slice(),
    ] {
        if page_dict.get(key).is_err() {
            if let Some(value) = resolve_inherited(dest, src_page_id, key) {
                page_dict.set(key, value);
            }
        }
    }

    let existing = resolve_inherited(dest, src_page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0) as i32;
    let composed = (existing + rotation).rem_euclid(360);
    if composed == 0 {
        page_dict.remove(b"Rotate");
    } else {
        page_dict.set("Rotate", Object::Integer(composed as i64));
    }

    page_dict.set("Parent", Object::Reference(pages_id));
    Ok(dest.add_object(Object::Dictionary(page_dict)))
}

/// Look up a page attribute, walking the `/Parent` chain for inherited
/// values. The depth cap guards against reference cycles in malformed files.
pub(crate) fn resolve_inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..64 {
        let dict = doc.objects.get(&current)?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        match dict.get(b"Parent").ok().and_then(|p| p.as_reference().ok()) {
            Some(parent) => current = parent,
            None => return None,
        }
    }
    None
}

/// Recursively remap object references by an id offset.
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::all_pages;
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    /// Build a PDF where each page carries identifiable content and an
    /// optional /Rotate value.
    fn create_test_pdf(num_pages: u32, rotation: Option<i64>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for i in 0..num_pages {
            let content = format!("BT /F1 12 Tf 50 700 Td (Page-{}) Tj ET", i + 1);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => Object::Reference(content_id),
            };
            if let Some(r) = rotation {
                page.set("Rotate", Object::Integer(r));
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => num_pages as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn reload(doc: Document) -> Document {
        let mut doc = doc;
        let mut buffer = Vec::new();
        doc.compress();
        doc.save_to(&mut buffer).unwrap();
        Document::load_mem(&buffer).unwrap()
    }

    fn page_rotations(doc: &Document) -> Vec<i64> {
        doc.get_pages()
            .values()
            .map(|&id| {
                doc.get_object(id)
                    .ok()
                    .and_then(|o| o.as_dict().ok())
                    .and_then(|d| d.get(b"Rotate").ok())
                    .and_then(|r| r.as_i64().ok())
                    .unwrap_or(0)
            })
            .collect()
    }

    fn page_text(doc: &Document, page_number: u32) -> String {
        let pages = doc.get_pages();
        let page_id = pages[&page_number];
        let content = doc.get_page_content(page_id).unwrap();
        String::from_utf8_lossy(&content).into_owned()
    }

    #[test]
    fn empty_instruction_list_fails() {
        let sources = SourceSet::load(&[create_test_pdf(2, None)]).unwrap();
        let result = assemble(&[], &sources);
        assert!(matches!(
            result,
            Err(PageForgeError::InvalidInstruction(_))
        ));
    }

    #[test]
    fn output_page_count_matches_instruction_count() {
        let sources = SourceSet::load(&[create_test_pdf(5, None)]).unwrap();
        let instructions = vec![
            PageInstruction::copy(0, 4, 0),
            PageInstruction::copy(0, 0, 0),
            PageInstruction::Blank,
        ];
        let doc = reload(assemble(&instructions, &sources).unwrap());
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn output_order_follows_instruction_order() {
        let sources = SourceSet::load(&[create_test_pdf(3, None)]).unwrap();
        let instructions = vec![
            PageInstruction::copy(0, 2, 0),
            PageInstruction::copy(0, 0, 0),
        ];
        let doc = reload(assemble(&instructions, &sources).unwrap());
        assert!(page_text(&doc, 1).contains("Page-3"));
        assert!(page_text(&doc, 2).contains("Page-1"));
    }

    #[test]
    fn page_index_one_past_last_is_rejected_not_clamped() {
        let sources = SourceSet::load(&[create_test_pdf(3, None)]).unwrap();
        let instructions = vec![PageInstruction::copy(0, 3, 0)];
        let result = assemble(&instructions, &sources);
        assert!(matches!(
            result,
            Err(PageForgeError::PageOutOfRange {
                source_index: 0,
                page: 3,
                page_count: 3
            })
        ));
    }

    #[test]
    fn out_of_range_error_reports_source_and_bounds() {
        let sources = SourceSet::load(&[create_test_pdf(2, None)]).unwrap();
        let err = assemble(&[PageInstruction::copy(0, 5, 0)], &sources).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Page index 5 out of range for source 0 (2 pages)"
        );
        // The offending source index is plain data, not a chained cause.
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn unknown_source_index_is_rejected() {
        let sources = SourceSet::load(&[create_test_pdf(3, None)]).unwrap();
        let instructions = vec![PageInstruction::copy(1, 0, 0)];
        assert!(matches!(
            assemble(&instructions, &sources),
            Err(PageForgeError::InvalidInstruction(_))
        ));
    }

    #[test]
    fn rotation_composes_with_existing_rotation() {
        let sources = SourceSet::load(&[create_test_pdf(1, Some(90))]).unwrap();
        let instructions = vec![PageInstruction::copy(0, 0, 90)];
        let doc = reload(assemble(&instructions, &sources).unwrap());
        assert_eq!(page_rotations(&doc), vec![180]);
    }

    #[test]
    fn repeated_deltas_equal_their_sum() {
        let sources = SourceSet::load(&[create_test_pdf(1, None)]).unwrap();

        // Two passes of 90...
        let first = reload(assemble(&[PageInstruction::copy(0, 0, 90)], &sources).unwrap());
        let mut buffer = Vec::new();
        let mut first = first;
        first.save_to(&mut buffer).unwrap();
        let intermediate = SourceSet::load(&[buffer]).unwrap();
        let twice = reload(assemble(&[PageInstruction::copy(0, 0, 90)], &intermediate).unwrap());

        // ...match one pass of 180.
        let once = reload(assemble(&[PageInstruction::copy(0, 0, 180)], &sources).unwrap());

        assert_eq!(page_rotations(&twice), page_rotations(&once));
    }

    #[test]
    fn full_turn_delta_is_identity() {
        let sources = SourceSet::load(&[create_test_pdf(2, None)]).unwrap();
        let doc = reload(assemble(&all_pages(0, 2, 360), &sources).unwrap());
        assert_eq!(page_rotations(&doc), vec![0, 0]);
    }

    #[test]
    fn negative_delta_normalizes_into_range() {
        let sources = SourceSet::load(&[create_test_pdf(1, None)]).unwrap();
        let doc = reload(assemble(&[PageInstruction::copy(0, 0, -90)], &sources).unwrap());
        assert_eq!(page_rotations(&doc), vec![270]);
    }

    #[test]
    fn duplicate_references_rotate_independently() {
        let sources = SourceSet::load(&[create_test_pdf(1, None)]).unwrap();
        let instructions = vec![
            PageInstruction::copy(0, 0, 90),
            PageInstruction::copy(0, 0, 270),
        ];
        let doc = reload(assemble(&instructions, &sources).unwrap());
        assert_eq!(page_rotations(&doc), vec![90, 270]);
        // Same content behind both copies.
        assert_eq!(page_text(&doc, 1), page_text(&doc, 2));
    }

    #[test]
    fn blank_instruction_inserts_letter_page() {
        let sources = SourceSet::load(&[create_test_pdf(1, None)]).unwrap();
        let instructions = vec![PageInstruction::copy(0, 0, 0), PageInstruction::Blank];
        let doc = reload(assemble(&instructions, &sources).unwrap());
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let blank = doc
            .get_object(pages[&2])
            .unwrap()
            .as_dict()
            .unwrap();
        let media_box = blank.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 612);
        assert_eq!(media_box[3].as_i64().unwrap(), 792);
    }

    #[test]
    fn identity_instruction_list_round_trips() {
        let sources = SourceSet::load(&[create_test_pdf(4, Some(90))]).unwrap();
        let doc = reload(assemble(&all_pages(0, 4, 0), &sources).unwrap());
        assert_eq!(doc.get_pages().len(), 4);
        assert_eq!(page_rotations(&doc), vec![90, 90, 90, 90]);
        for i in 1..=4u32 {
            assert!(page_text(&doc, i).contains(&format!("Page-{}", i)));
        }
    }

    #[test]
    fn merge_across_sources_with_per_file_rotations() {
        let files = vec![create_test_pdf(2, None), create_test_pdf(2, None)];
        let sources = SourceSet::load(&files).unwrap();
        let mut instructions = all_pages(0, 2, 0);
        instructions.extend(all_pages(1, 2, 90));
        let doc = reload(assemble(&instructions, &sources).unwrap());
        assert_eq!(doc.get_pages().len(), 4);
        assert_eq!(page_rotations(&doc), vec![0, 0, 90, 90]);
    }

    #[test]
    fn inherited_rotation_is_materialized_on_copies() {
        // Rotate lives on the Pages node, not the page itself.
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => 1,
                "Kids" => vec![Object::Reference(page_id)],
                "Rotate" => 180,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();

        let sources = SourceSet::load(&[buffer]).unwrap();
        let out = reload(assemble(&[PageInstruction::copy(0, 0, 90)], &sources).unwrap());
        assert_eq!(page_rotations(&out), vec![270]);
    }
}
