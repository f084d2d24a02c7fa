//! Request payloads and their conversion to engine types.
//!
//! This is the only place 1-based client page numbers become the engine's
//! 0-based indices.

use std::collections::HashMap;

use pageforge_core::{
    PageInstruction, Placement, SplitPolicy, TargetPages, WatermarkKind, WatermarkSpec,
};
use serde::Deserialize;

use crate::error::ApiError;

/// One entry of the `instructions` payload for rotate/delete/process routes.
/// `originalIndex` is 0-based.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionEntry {
    pub original_index: usize,
    #[serde(default)]
    pub rotation: i32,
}

/// Instructions against the single uploaded file, kept in payload order.
pub fn instructions_from_entries(entries: &[InstructionEntry]) -> Vec<PageInstruction> {
    entries
        .iter()
        .map(|e| PageInstruction::copy(0, e.original_index, e.rotation))
        .collect()
}

/// One entry of the `operations` payload for the organize route.
/// `originalIndex` here is 1-based, matching what clients display.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeOperation {
    #[serde(default)]
    pub is_blank: bool,
    #[serde(default)]
    pub file_index: usize,
    pub original_index: Option<usize>,
    #[serde(default)]
    pub rotation: i32,
}

pub fn organize_instructions(
    operations: &[OrganizeOperation],
) -> Result<Vec<PageInstruction>, ApiError> {
    operations
        .iter()
        .map(|op| {
            if op.is_blank {
                return Ok(PageInstruction::Blank);
            }
            let number = op.original_index.ok_or_else(|| {
                ApiError::InvalidRequest(
                    "operation needs either isBlank or originalIndex".into(),
                )
            })?;
            if number < 1 {
                return Err(ApiError::InvalidRequest(
                    "originalIndex is 1-based; 0 is not a page".into(),
                ));
            }
            Ok(PageInstruction::copy(op.file_index, number - 1, op.rotation))
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizeQuery {
    pub deliver: Option<String>,
}

/// The `options` payload for the split route.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", content = "config", rename_all = "camelCase")]
pub enum SplitRequest {
    Fixed {
        size: usize,
    },
    /// `ranges` holds 1-based end pages of each group.
    Ranges {
        ranges: Vec<usize>,
    },
    Extract {
        pages: Vec<usize>,
        #[serde(default)]
        merge: bool,
    },
}

impl From<SplitRequest> for SplitPolicy {
    fn from(req: SplitRequest) -> Self {
        match req {
            SplitRequest::Fixed { size } => SplitPolicy::FixedSize { size },
            SplitRequest::Ranges { ranges } => SplitPolicy::Ranges { breakpoints: ranges },
            SplitRequest::Extract { pages, merge } => SplitPolicy::Extract { pages, merge },
        }
    }
}

/// Build a [`WatermarkSpec`] from the watermark route's form fields and the
/// optional `image` file part.
pub fn watermark_spec_from_form(
    fields: &HashMap<String, String>,
    image: Option<Vec<u8>>,
) -> Result<WatermarkSpec, ApiError> {
    let kind = match fields.get("type").map(String::as_str).unwrap_or("text") {
        "text" => WatermarkKind::Text {
            text: fields.get("text").cloned().unwrap_or_default(),
            font_size: parse_number(fields, "fontSize")?.unwrap_or(48.0),
            color: fields
                .get("color")
                .cloned()
                .unwrap_or_else(|| "#000000".to_string()),
        },
        "image" => WatermarkKind::Image {
            bytes: image.ok_or_else(|| {
                ApiError::InvalidRequest("image watermark needs an image file part".into())
            })?,
            width: parse_number(fields, "width")?,
            height: parse_number(fields, "height")?,
            maintain_aspect_ratio: fields
                .get("maintainAspectRatio")
                .map(|v| v != "false")
                .unwrap_or(true),
        },
        other => {
            return Err(ApiError::InvalidRequest(format!(
                "unknown watermark type: {}",
                other
            )))
        }
    };

    let placement = match fields.get("position").map(String::as_str).unwrap_or("center") {
        "center" => Placement::Center,
        "topLeft" => Placement::TopLeft,
        "topRight" => Placement::TopRight,
        "bottomLeft" => Placement::BottomLeft,
        "bottomRight" => Placement::BottomRight,
        "custom" => Placement::Custom {
            x: parse_number(fields, "x")?.ok_or_else(|| {
                ApiError::InvalidRequest("custom position needs x and y".into())
            })?,
            y: parse_number(fields, "y")?.ok_or_else(|| {
                ApiError::InvalidRequest("custom position needs x and y".into())
            })?,
        },
        other => {
            return Err(ApiError::InvalidRequest(format!(
                "unknown position: {}",
                other
            )))
        }
    };

    let targets = match fields.get("pages").map(String::as_str) {
        None | Some("") | Some("all") => TargetPages::All,
        Some(raw) => {
            let numbers: Vec<usize> = serde_json::from_str(raw).map_err(|e| {
                ApiError::InvalidRequest(format!("pages must be \"all\" or a JSON array: {}", e))
            })?;
            TargetPages::Pages(numbers)
        }
    };

    Ok(WatermarkSpec {
        kind,
        placement,
        opacity: parse_number(fields, "opacity")?.unwrap_or(0.5),
        rotation: parse_number(fields, "rotation")?.unwrap_or(0.0),
        targets,
    })
}

fn parse_number(fields: &HashMap<String, String>, name: &str) -> Result<Option<f64>, ApiError> {
    fields
        .get(name)
        .map(|v| {
            v.parse::<f64>().map_err(|_| {
                ApiError::InvalidRequest(format!("{} must be a number, got {:?}", name, v))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn instruction_entries_stay_zero_based() {
        let entries: Vec<InstructionEntry> =
            serde_json::from_str(r#"[{"originalIndex":0,"rotation":90},{"originalIndex":2}]"#)
                .unwrap();
        assert_eq!(
            instructions_from_entries(&entries),
            vec![
                PageInstruction::copy(0, 0, 90),
                PageInstruction::copy(0, 2, 0),
            ]
        );
    }

    #[test]
    fn organize_converts_one_based_indices() {
        let ops: Vec<OrganizeOperation> = serde_json::from_str(
            r#"[
                {"fileIndex":1,"originalIndex":3,"rotation":180},
                {"isBlank":true},
                {"originalIndex":1}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            organize_instructions(&ops).unwrap(),
            vec![
                PageInstruction::copy(1, 2, 180),
                PageInstruction::Blank,
                PageInstruction::copy(0, 0, 0),
            ]
        );
    }

    #[test]
    fn organize_rejects_index_zero() {
        let ops: Vec<OrganizeOperation> =
            serde_json::from_str(r#"[{"originalIndex":0}]"#).unwrap();
        assert!(matches!(
            organize_instructions(&ops),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn organize_rejects_entry_with_neither_blank_nor_index() {
        let ops: Vec<OrganizeOperation> = serde_json::from_str(r#"[{"rotation":90}]"#).unwrap();
        assert!(matches!(
            organize_instructions(&ops),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn split_request_parses_every_mode() {
        let fixed: SplitRequest =
            serde_json::from_str(r#"{"mode":"fixed","config":{"size":3}}"#).unwrap();
        assert_eq!(SplitPolicy::from(fixed), SplitPolicy::FixedSize { size: 3 });

        let ranges: SplitRequest =
            serde_json::from_str(r#"{"mode":"ranges","config":{"ranges":[3,7]}}"#).unwrap();
        assert_eq!(
            SplitPolicy::from(ranges),
            SplitPolicy::Ranges {
                breakpoints: vec![3, 7]
            }
        );

        let extract: SplitRequest =
            serde_json::from_str(r#"{"mode":"extract","config":{"pages":[5,2],"merge":true}}"#)
                .unwrap();
        assert_eq!(
            SplitPolicy::from(extract),
            SplitPolicy::Extract {
                pages: vec![5, 2],
                merge: true
            }
        );
    }

    #[test]
    fn watermark_defaults_to_centered_text() {
        let spec =
            watermark_spec_from_form(&fields(&[("text", "DRAFT")]), None).unwrap();
        assert!(matches!(spec.placement, Placement::Center));
        assert!(matches!(spec.targets, TargetPages::All));
        assert_eq!(spec.opacity, 0.5);
        assert_eq!(spec.rotation, 0.0);
        match spec.kind {
            WatermarkKind::Text { text, font_size, color } => {
                assert_eq!(text, "DRAFT");
                assert_eq!(font_size, 48.0);
                assert_eq!(color, "#000000");
            }
            _ => panic!("expected text kind"),
        }
    }

    #[test]
    fn watermark_custom_position_needs_coordinates() {
        let result = watermark_spec_from_form(
            &fields(&[("text", "X"), ("position", "custom"), ("x", "10")]),
            None,
        );
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn watermark_pages_parse_as_json_array() {
        let spec = watermark_spec_from_form(
            &fields(&[("text", "X"), ("pages", "[1,3,5]")]),
            None,
        )
        .unwrap();
        assert_eq!(spec.targets, TargetPages::Pages(vec![1, 3, 5]));
    }

    #[test]
    fn watermark_image_type_without_file_is_rejected() {
        let result = watermark_spec_from_form(&fields(&[("type", "image")]), None);
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn non_numeric_opacity_is_rejected() {
        let result = watermark_spec_from_form(
            &fields(&[("text", "X"), ("opacity", "dark")]),
            None,
        );
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
