//! Watermark composition: draw text or an image onto targeted pages.
//!
//! Unlike the assembler, this path tolerates and silently drops out-of-range
//! target page numbers instead of failing the request. That asymmetry is a
//! codified policy, scoped to this module only.
//!
//! Placement geometry: the watermark's unrotated bounding box is rotated
//! about its own center; corner placements keep the rotated extent inside a
//! fixed margin from the page edges. Custom placement takes absolute
//! page-space coordinates addressing the unrotated content's lower-left
//! corner, with no margin logic.

use std::collections::HashSet;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ImageFormat;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::assemble::resolve_inherited;
use crate::error::PageForgeError;

/// Distance kept between a corner-placed watermark and the page edges.
const EDGE_MARGIN: f64 = 20.0;
/// Fallback when a page carries no resolvable MediaBox (US Letter).
const DEFAULT_PAGE_SIZE: (f64, f64) = (612.0, 792.0);
/// Helvetica cap height, in em units.
const CAP_HEIGHT: f64 = 0.718;

/// Resource names the compositor registers on stamped pages.
const FONT_NAME: &[u8] = b"PfWmFont";
const IMAGE_NAME: &[u8] = b"PfWmImg";
const GS_NAME: &[u8] = b"PfWmGs";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Custom { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPages {
    All,
    /// Explicit 1-based page numbers; out-of-range entries are dropped.
    Pages(Vec<usize>),
}

#[derive(Debug, Clone)]
pub enum WatermarkKind {
    Text {
        text: String,
        font_size: f64,
        /// Hex color like `#FF0000`; unparseable input falls back to black.
        color: String,
    },
    Image {
        bytes: Vec<u8>,
        width: Option<f64>,
        height: Option<f64>,
        maintain_aspect_ratio: bool,
    },
}

#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub kind: WatermarkKind,
    pub placement: Placement,
    /// Alpha in [0,1]; values outside the range are clamped.
    pub opacity: f64,
    /// Degrees, counter-clockwise, applied about the content's own center.
    pub rotation: f64,
    pub targets: TargetPages,
}

/// Draw the watermark onto every targeted page of `doc`.
///
/// Pages are never reordered, added, or removed; only their content streams
/// and resources grow.
pub fn apply_watermark(doc: &mut Document, spec: &WatermarkSpec) -> Result<(), PageForgeError> {
    let rotation = spec.rotation.rem_euclid(360.0);
    let opacity = spec.opacity.clamp(0.0, 1.0);

    let pages = doc.get_pages();
    let page_count = pages.len();
    let target_ids: Vec<ObjectId> = match &spec.targets {
        TargetPages::All => pages.values().copied().collect(),
        TargetPages::Pages(numbers) => {
            // First occurrence wins; a page listed twice is stamped once.
            let mut seen = HashSet::new();
            numbers
                .iter()
                .filter(|&&n| n >= 1 && n <= page_count && seen.insert(n))
                .filter_map(|&n| pages.get(&(n as u32)).copied())
                .collect()
        }
    };
    if target_ids.is_empty() {
        return Ok(());
    }

    let asset = prepare_asset(doc, &spec.kind, opacity)?;

    for page_id in target_ids {
        stamp_page(doc, page_id, &asset, spec.placement, rotation)?;
    }
    Ok(())
}

/// Shared objects (font or image XObject, graphics state) plus the unrotated
/// bounding box, created once per request and referenced from every page.
struct WatermarkAsset {
    width: f64,
    height: f64,
    gs_id: ObjectId,
    kind: AssetKind,
}

enum AssetKind {
    Text {
        font_id: ObjectId,
        text: String,
        font_size: f64,
        color: (f32, f32, f32),
    },
    Image {
        xobject_id: ObjectId,
    },
}

fn prepare_asset(
    doc: &mut Document,
    kind: &WatermarkKind,
    opacity: f64,
) -> Result<WatermarkAsset, PageForgeError> {
    let mut gs = Dictionary::new();
    gs.set("Type", Object::Name(b"ExtGState".to_vec()));
    gs.set("ca", Object::Real(opacity as f32));
    gs.set("CA", Object::Real(opacity as f32));
    let gs_id = doc.add_object(gs);

    match kind {
        WatermarkKind::Text {
            text,
            font_size,
            color,
        } => {
            if text.is_empty() {
                return Err(PageForgeError::InvalidWatermark(
                    "watermark text is empty".into(),
                ));
            }
            if *font_size <= 0.0 {
                return Err(PageForgeError::InvalidWatermark(
                    "font size must be positive".into(),
                ));
            }

            let mut font = Dictionary::new();
            font.set("Type", Object::Name(b"Font".to_vec()));
            font.set("Subtype", Object::Name(b"Type1".to_vec()));
            font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
            font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
            let font_id = doc.add_object(font);

            Ok(WatermarkAsset {
                width: text_width(text, *font_size),
                height: font_size * CAP_HEIGHT,
                gs_id,
                kind: AssetKind::Text {
                    font_id,
                    text: text.clone(),
                    font_size: *font_size,
                    color: parse_hex_color(color),
                },
            })
        }
        WatermarkKind::Image {
            bytes,
            width,
            height,
            maintain_aspect_ratio,
        } => {
            let img = image::load_from_memory(bytes).map_err(|e| {
                PageForgeError::InvalidWatermark(format!("unreadable image: {}", e))
            })?;
            let intrinsic = (f64::from(img.width()), f64::from(img.height()));
            let (w, h) =
                image_extent(*width, *height, *maintain_aspect_ratio, intrinsic);
            if w <= 0.0 || h <= 0.0 {
                return Err(PageForgeError::InvalidWatermark(
                    "image dimensions must be positive".into(),
                ));
            }

            let xobject_id = embed_image(doc, bytes, &img)?;
            Ok(WatermarkAsset {
                width: w,
                height: h,
                gs_id,
                kind: AssetKind::Image { xobject_id },
            })
        }
    }
}

/// Resolve the drawn width/height from explicit dimensions and the image's
/// intrinsic pixel size.
fn image_extent(
    width: Option<f64>,
    height: Option<f64>,
    maintain_aspect_ratio: bool,
    (iw, ih): (f64, f64),
) -> (f64, f64) {
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) if maintain_aspect_ratio => (w, w * ih / iw),
        (None, Some(h)) if maintain_aspect_ratio => (h * iw / ih, h),
        (Some(w), None) => (w, ih),
        (None, Some(h)) => (iw, h),
        (None, None) => (iw, ih),
    }
}

/// Embed the image as an XObject: JPEG passes through as DCTDecode, anything
/// else is decoded to RGB8 and deflated.
fn embed_image(
    doc: &mut Document,
    bytes: &[u8],
    img: &image::DynamicImage,
) -> Result<ObjectId, PageForgeError> {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(img.width())));
    dict.set("Height", Object::Integer(i64::from(img.height())));
    dict.set("BitsPerComponent", Object::Integer(8));

    let data = if matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg))
        && !jpeg_is_cmyk(bytes)
    {
        let gray = matches!(
            img.color(),
            image::ColorType::L8 | image::ColorType::La8 | image::ColorType::L16
        );
        dict.set(
            "ColorSpace",
            Object::Name(if gray { b"DeviceGray".to_vec() } else { b"DeviceRGB".to_vec() }),
        );
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        bytes.to_vec()
    } else {
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        let raw = img.to_rgb8().into_raw();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&raw)
            .and_then(|_| encoder.finish())
            .map_err(|e| {
                PageForgeError::Operation(format!("failed to compress image data: {}", e))
            })?
    };

    Ok(doc.add_object(Stream::new(dict, data)))
}

/// SOF marker scan: four components means an Adobe CMYK/YCCK JPEG, which
/// DCTDecode under an RGB colorspace would misrender. Those go through the
/// decode-and-reencode path instead.
fn jpeg_is_cmyk(bytes: &[u8]) -> bool {
    let mut i = 2;
    while i + 9 < bytes.len() {
        if bytes[i] != 0xFF {
            return false;
        }
        let marker = bytes[i + 1];
        // Standalone markers carry no length field.
        if marker == 0x01 || (0xD0..=0xD9).contains(&marker) {
            i += 2;
            continue;
        }
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            // Component count sits after length, precision, height, width.
            return bytes.get(i + 9) == Some(&4);
        }
        if marker == 0xDA {
            return false;
        }
        let length = (usize::from(bytes[i + 2]) << 8) | usize::from(bytes[i + 3]);
        i += 2 + length;
    }
    false
}

fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    asset: &WatermarkAsset,
    placement: Placement,
    rotation: f64,
) -> Result<(), PageForgeError> {
    let (page_w, page_h) = page_size(doc, page_id);
    let (sin, cos) = rotation.to_radians().sin_cos();

    // Axis-aligned extent of the rotated bounding box; keeps corner
    // placements inside the margin.
    let w_rot = asset.width * cos.abs() + asset.height * sin.abs();
    let h_rot = asset.width * sin.abs() + asset.height * cos.abs();

    let (cx, cy) = match placement {
        Placement::Center => (page_w / 2.0, page_h / 2.0),
        Placement::TopLeft => (EDGE_MARGIN + w_rot / 2.0, page_h - EDGE_MARGIN - h_rot / 2.0),
        Placement::TopRight => (
            page_w - EDGE_MARGIN - w_rot / 2.0,
            page_h - EDGE_MARGIN - h_rot / 2.0,
        ),
        Placement::BottomLeft => (EDGE_MARGIN + w_rot / 2.0, EDGE_MARGIN + h_rot / 2.0),
        Placement::BottomRight => (
            page_w - EDGE_MARGIN - w_rot / 2.0,
            EDGE_MARGIN + h_rot / 2.0,
        ),
        Placement::Custom { x, y } => (x + asset.width / 2.0, y + asset.height / 2.0),
    };

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![Object::Name(GS_NAME.to_vec())]),
        // Rotate about the content's own center, not the page origin.
        Operation::new(
            "cm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(cx), real(cy)],
        ),
    ];

    match &asset.kind {
        AssetKind::Text {
            text,
            font_size,
            color,
            ..
        } => {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(FONT_NAME.to_vec()), real(*font_size)],
            ));
            operations.push(Operation::new(
                "rg",
                vec![
                    Object::Real(color.0),
                    Object::Real(color.1),
                    Object::Real(color.2),
                ],
            ));
            operations.push(Operation::new(
                "Td",
                vec![real(-asset.width / 2.0), real(-asset.height / 2.0)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(
                    text.as_bytes().to_vec(),
                    StringFormat::Literal,
                )],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        AssetKind::Image { .. } => {
            operations.push(Operation::new(
                "cm",
                vec![
                    real(asset.width),
                    real(0.0),
                    real(0.0),
                    real(asset.height),
                    real(-asset.width / 2.0),
                    real(-asset.height / 2.0),
                ],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]));
        }
    }
    operations.push(Operation::new("Q", vec![]));

    let encoded = Content { operations }.encode().map_err(|e| {
        PageForgeError::Operation(format!("failed to encode watermark content: {}", e))
    })?;
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    append_content(doc, page_id, stream_id)?;
    register_resources(doc, page_id, asset)?;
    Ok(())
}

/// Append one content stream to the page's `/Contents`, preserving whatever
/// shape (single reference, inline array, or reference to an array) is
/// already there. Arrays nested inside arrays are not a legal shape, so a
/// reference resolving to an array grows in place.
fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    stream_id: ObjectId,
) -> Result<(), PageForgeError> {
    enum Shape {
        InlineArray,
        Single(ObjectId),
        ReferencedArray(ObjectId),
        Missing,
    }

    let shape = {
        let dict = doc
            .get_object(page_id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| PageForgeError::Operation("page object is not a dictionary".into()))?;
        match dict.get(b"Contents") {
            Ok(Object::Array(_)) => Shape::InlineArray,
            Ok(Object::Reference(id)) => {
                if matches!(doc.get_object(*id), Ok(Object::Array(_))) {
                    Shape::ReferencedArray(*id)
                } else {
                    Shape::Single(*id)
                }
            }
            _ => Shape::Missing,
        }
    };

    let new_ref = Object::Reference(stream_id);
    match shape {
        Shape::InlineArray => {
            if let Ok(Object::Array(arr)) = page_dict_mut(doc, page_id)?.get_mut(b"Contents") {
                arr.push(new_ref);
            }
        }
        Shape::ReferencedArray(id) => {
            if let Ok(Object::Array(arr)) = doc.get_object_mut(id) {
                arr.push(new_ref);
            }
        }
        Shape::Single(id) => {
            page_dict_mut(doc, page_id)?
                .set("Contents", Object::Array(vec![Object::Reference(id), new_ref]));
        }
        Shape::Missing => page_dict_mut(doc, page_id)?.set("Contents", new_ref),
    }
    Ok(())
}

/// Make the watermark's font/image/graphics-state visible from the page.
///
/// Inherited resources are cloned down onto the page first so existing
/// content keeps resolving after we shadow the parent's entry.
fn register_resources(
    doc: &mut Document,
    page_id: ObjectId,
    asset: &WatermarkAsset,
) -> Result<(), PageForgeError> {
    enum Slot {
        Indirect(ObjectId),
        Inline,
        Missing,
    }

    let slot = {
        let dict = doc
            .get_object(page_id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| PageForgeError::Operation("page object is not a dictionary".into()))?;
        match dict.get(b"Resources") {
            Ok(Object::Reference(id)) => Slot::Indirect(*id),
            Ok(_) => Slot::Inline,
            Err(_) => Slot::Missing,
        }
    };

    if let Slot::Missing = slot {
        let inherited = resolve_inherited(doc, page_id, b"Resources")
            .and_then(|obj| match obj {
                Object::Dictionary(dict) => Some(dict),
                Object::Reference(id) => doc
                    .get_object(id)
                    .ok()
                    .and_then(|o| o.as_dict().ok())
                    .cloned(),
                _ => None,
            })
            .unwrap_or_default();
        page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(inherited));
    }

    // Indirect sub-dictionaries (e.g. a shared /Font object) are inlined
    // before mutation so we never edit a dictionary other pages reference.
    let subdict_keys: [&[u8]; 3] = [b"ExtGState", b"Font", b"XObject"];
    if let Slot::Indirect(res_id) = slot {
        inline_indirect_subdicts(doc, res_id, &subdict_keys)?;
        let res = doc
            .get_object_mut(res_id)
            .ok()
            .and_then(|o| o.as_dict_mut().ok())
            .ok_or_else(|| {
                PageForgeError::Operation("page Resources is not a dictionary".into())
            })?;
        add_resource_entries(res, asset);
    } else {
        inline_page_resource_subdicts(doc, page_id, &subdict_keys)?;
        let page = page_dict_mut(doc, page_id)?;
        let res = match page.get_mut(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict,
            _ => {
                return Err(PageForgeError::Operation(
                    "page Resources is not a dictionary".into(),
                ))
            }
        };
        add_resource_entries(res, asset);
    }
    Ok(())
}

fn add_resource_entries(res: &mut Dictionary, asset: &WatermarkAsset) {
    set_subdict_entry(res, b"ExtGState", GS_NAME, asset.gs_id);
    match &asset.kind {
        AssetKind::Text { font_id, .. } => {
            set_subdict_entry(res, b"Font", FONT_NAME, *font_id);
        }
        AssetKind::Image { xobject_id } => {
            set_subdict_entry(res, b"XObject", IMAGE_NAME, *xobject_id);
        }
    }
}

fn set_subdict_entry(res: &mut Dictionary, key: &[u8], name: &[u8], target: ObjectId) {
    if let Ok(Object::Dictionary(sub)) = res.get_mut(key) {
        sub.set(name, Object::Reference(target));
        return;
    }
    let mut sub = Dictionary::new();
    sub.set(name, Object::Reference(target));
    res.set(key, Object::Dictionary(sub));
}

/// Replace any `/Font 5 0 R`-style sub-entries of an indirect Resources
/// dictionary with inline clones of their targets.
fn inline_indirect_subdicts(
    doc: &mut Document,
    res_id: ObjectId,
    keys: &[&[u8]],
) -> Result<(), PageForgeError> {
    for &key in keys {
        let resolved = {
            let res = doc
                .get_object(res_id)
                .ok()
                .and_then(|o| o.as_dict().ok());
            match res.and_then(|r| r.get(key).ok()) {
                Some(Object::Reference(id)) => doc
                    .get_object(*id)
                    .ok()
                    .and_then(|o| o.as_dict().ok())
                    .cloned(),
                _ => None,
            }
        };
        if let Some(clone) = resolved {
            if let Some(res) = doc
                .get_object_mut(res_id)
                .ok()
                .and_then(|o| o.as_dict_mut().ok())
            {
                res.set(key, Object::Dictionary(clone));
            }
        }
    }
    Ok(())
}

/// Same as [`inline_indirect_subdicts`] for a page with inline Resources.
fn inline_page_resource_subdicts(
    doc: &mut Document,
    page_id: ObjectId,
    keys: &[&[u8]],
) -> Result<(), PageForgeError> {
    for &key in keys {
        let resolved = {
            let res = doc
                .get_object(page_id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .and_then(|p| p.get(b"Resources").ok())
                .and_then(|r| r.as_dict().ok());
            match res.and_then(|r| r.get(key).ok()) {
                Some(Object::Reference(id)) => doc
                    .get_object(*id)
                    .ok()
                    .and_then(|o| o.as_dict().ok())
                    .cloned(),
                _ => None,
            }
        };
        if let Some(clone) = resolved {
            let page = page_dict_mut(doc, page_id)?;
            if let Ok(Object::Dictionary(res)) = page.get_mut(b"Resources") {
                res.set(key, Object::Dictionary(clone));
            }
        }
    }
    Ok(())
}

fn page_dict_mut<'a>(
    doc: &'a mut Document,
    page_id: ObjectId,
) -> Result<&'a mut Dictionary, PageForgeError> {
    doc.get_object_mut(page_id)
        .ok()
        .and_then(|o| o.as_dict_mut().ok())
        .ok_or_else(|| PageForgeError::Operation("page object is not a dictionary".into()))
}

/// Page dimensions from the (possibly inherited) MediaBox.
fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let media_box = resolve_inherited(doc, page_id, b"MediaBox").and_then(|obj| match obj {
        Object::Array(values) if values.len() == 4 => {
            let nums: Vec<f64> = values.iter().filter_map(number).collect();
            (nums.len() == 4).then(|| ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()))
        }
        _ => None,
    });
    media_box.unwrap_or(DEFAULT_PAGE_SIZE)
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Parse `#RRGGBB` (leading `#` optional) into RGB floats, defaulting to black.
fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 && hex.as_bytes()[..6].iter().all(u8::is_ascii_hexdigit) {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0) as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0) as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0) as f32 / 255.0;
        (r, g, b)
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// Glyph widths for Helvetica, ASCII 32..=126, in 1/1000 em (Adobe AFM).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const FALLBACK_WIDTH: u16 = 556;

/// Text advance width in page units for the given font size.
fn text_width(text: &str, font_size: f64) -> f64 {
    let units: f64 = text
        .chars()
        .map(|c| {
            let code = c as usize;
            if (32..=126).contains(&code) {
                f64::from(HELVETICA_WIDTHS[code - 32])
            } else {
                f64::from(FALLBACK_WIDTH)
            }
        })
        .sum();
    units * font_size / 1000.0
}


// Property tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn hex_color_components_stay_in_unit_range(input in ".{0,12}") {
            let (r, g, b) = parse_hex_color(&input);
            prop_assert!((0.0..=1.0).contains(&r));
            prop_assert!((0.0..=1.0).contains(&g));
            prop_assert!((0.0..=1.0).contains(&b));
        }

        #[test]
        fn text_width_is_additive(a in "[ -~]{0,20}", b in "[ -~]{0,20}") {
            let joined = format!("{}{}", a, b);
            let sum = text_width(&a, 12.0) + text_width(&b, 12.0);
            prop_assert!((text_width(&joined, 12.0) - sum).abs() < 1e-6);
        }

        #[test]
        fn text_width_scales_linearly_with_font_size(size in 1.0f64..200.0) {
            let base = text_width("Watermark", 1.0);
            prop_assert!((text_width("Watermark", size) - base * size).abs() < 1e-6);
        }

        #[test]
        fn aspect_preserving_extent_keeps_the_ratio(
            iw in 1.0f64..4000.0,
            ih in 1.0f64..4000.0,
            w in 1.0f64..1000.0
        ) {
            let (out_w, out_h) = image_extent(Some(w), None, true, (iw, ih));
            prop_assert!((out_w / out_h - iw / ih).abs() < 1e-6);
        }
    }
}
