//! HTTP handlers for the PageForge API
//!
//! Every transformation route follows the same shape: collect the multipart
//! form, convert the payload to engine types, run the CPU-bound PDF work on
//! a blocking thread, and return the packaged bytes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use pageforge_core::{
    all_pages, apply_watermark, assemble, load_document, pack, partition, serialize_document,
    PackagedOutput, SourceSet, SplitPolicy, PDF_CONTENT_TYPE,
};

use crate::error::ApiError;
use crate::models::{
    instructions_from_entries, organize_instructions, watermark_spec_from_form,
    InstructionEntry, OrganizeOperation, OrganizeQuery, SplitRequest,
};
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Merge every uploaded file, in upload order, into one document.
///
/// An optional `rotations` field carries one rotation delta per file, applied
/// to all of that file's pages.
pub async fn merge(mut multipart: Multipart) -> Result<Response, ApiError> {
    let form = collect_form(&mut multipart).await?;
    if form.files.is_empty() {
        return Err(ApiError::InvalidRequest("no files uploaded".into()));
    }
    let rotations: Vec<i32> = parse_json_field(&form.fields, "rotations")?.unwrap_or_default();
    if !rotations.is_empty() && rotations.len() != form.files.len() {
        return Err(ApiError::InvalidRequest(format!(
            "got {} rotations for {} files",
            rotations.len(),
            form.files.len()
        )));
    }

    let file_count = form.files.len();
    let output = run_blocking(move || {
        let sources = SourceSet::load(&form.files)?;
        let mut instructions = Vec::new();
        for index in 0..sources.len() {
            let pages = sources.page_count(index).unwrap_or(0);
            let rotation = rotations.get(index).copied().unwrap_or(0);
            instructions.extend(all_pages(index, pages, rotation));
        }
        let mut doc = assemble(&instructions, &sources)?;
        let bytes = serialize_document(&mut doc)?;
        Ok(PackagedOutput {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: "merged.pdf".to_string(),
        })
    })
    .await?;

    tracing::info!("Merged {} files ({} bytes out)", file_count, output.bytes.len());
    Ok(file_response(output))
}

/// Rotate, delete, and reorder pages of one document.
///
/// The `instructions` field lists the pages to keep, in output order, with
/// 0-based indices and per-page rotation deltas. Pages not listed are
/// dropped. Rotate-only and delete-only requests are just special cases,
/// which is why three routes share this handler.
pub async fn process_pages(mut multipart: Multipart) -> Result<Response, ApiError> {
    let form = collect_form(&mut multipart).await?;
    let file = single_file(form.files)?;
    let entries: Vec<InstructionEntry> = parse_json_field(&form.fields, "instructions")?
        .ok_or_else(|| ApiError::InvalidRequest("missing instructions field".into()))?;

    let output = run_blocking(move || {
        let sources = SourceSet::load(&[file])?;
        let instructions = instructions_from_entries(&entries);
        let mut doc = assemble(&instructions, &sources)?;
        let bytes = serialize_document(&mut doc)?;
        Ok(PackagedOutput {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: "processed.pdf".to_string(),
        })
    })
    .await?;

    Ok(file_response(output))
}

/// Build one document from pages of several uploads, with blank-page
/// insertion. With `?deliver=link` the result goes to the store and a
/// download id is returned instead of the bytes.
pub async fn organize(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrganizeQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = collect_form(&mut multipart).await?;
    if form.files.is_empty() {
        return Err(ApiError::InvalidRequest("no files uploaded".into()));
    }
    let operations: Vec<OrganizeOperation> = parse_json_field(&form.fields, "operations")?
        .ok_or_else(|| ApiError::InvalidRequest("missing operations field".into()))?;
    let instructions = organize_instructions(&operations)?;

    let output = run_blocking(move || {
        let sources = SourceSet::load(&form.files)?;
        let mut doc = assemble(&instructions, &sources)?;
        let bytes = serialize_document(&mut doc)?;
        Ok(PackagedOutput {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: "organized.pdf".to_string(),
        })
    })
    .await?;

    if query.deliver.as_deref() == Some("link") {
        let id = state.store.put(&output).await?;
        return Ok(Json(json!({
            "id": id,
            "url": format!("/api/download/{}", id),
            "expiresInSecs": state.store.ttl().as_secs(),
        }))
        .into_response());
    }
    Ok(file_response(output))
}

/// Split one document into several per the `options` policy. One output
/// group comes back as a raw PDF, several as a ZIP archive.
pub async fn split(mut multipart: Multipart) -> Result<Response, ApiError> {
    let form = collect_form(&mut multipart).await?;
    let file = single_file(form.files)?;
    let request: SplitRequest = parse_json_field(&form.fields, "options")?
        .ok_or_else(|| ApiError::InvalidRequest("missing options field".into()))?;
    let policy: SplitPolicy = request.into();

    let output = run_blocking(move || {
        let sources = SourceSet::load(&[file])?;
        let page_count = sources.page_count(0).unwrap_or(0);
        let parts = partition(&policy, page_count)?;
        let mut outputs = Vec::with_capacity(parts.len());
        for part in parts {
            let doc = assemble(&part.instructions, &sources)?;
            outputs.push((part.name, doc));
        }
        Ok(pack(outputs, "split-files.zip")?)
    })
    .await?;

    tracing::info!(
        "Split produced {} ({})",
        output.filename,
        output.content_type
    );
    Ok(file_response(output))
}

/// Stamp a text or image watermark onto the uploaded document.
pub async fn watermark(mut multipart: Multipart) -> Result<Response, ApiError> {
    let form = collect_form(&mut multipart).await?;
    let file = single_file(form.files)?;
    let spec = watermark_spec_from_form(&form.fields, form.image)?;

    let output = run_blocking(move || {
        let mut doc = load_document(&file)?;
        apply_watermark(&mut doc, &spec)?;
        let bytes = serialize_document(&mut doc)?;
        Ok(PackagedOutput {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: "watermarked.pdf".to_string(),
        })
    })
    .await?;

    Ok(file_response(output))
}

/// Password-protection passthrough. Unencrypted input comes back as-is;
/// encrypted input reports the password-required condition so clients can
/// branch to an unlock flow.
pub async fn unlock(mut multipart: Multipart) -> Result<Response, ApiError> {
    let form = collect_form(&mut multipart).await?;
    let file = single_file(form.files)?;

    let output = run_blocking(move || {
        load_document(&file)?;
        Ok(PackagedOutput {
            bytes: file,
            content_type: PDF_CONTENT_TYPE,
            filename: "unlocked.pdf".to_string(),
        })
    })
    .await?;

    Ok(file_response(output))
}

/// Fetch a stored result by id.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let stored = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::ResultNotFound(id))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, stored.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", stored.filename),
            ),
        ],
        stored.bytes,
    )
        .into_response())
}

/// Everything one multipart form can carry: uploaded PDFs in order, text
/// fields by name, and the watermark route's image part.
struct UploadForm {
    files: Vec<Vec<u8>>,
    fields: HashMap<String, String>,
    image: Option<Vec<u8>>,
}

async fn collect_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        files: Vec::new(),
        fields: HashMap::new(),
        image: None,
    };
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            form.image = Some(field.bytes().await?.to_vec());
        } else if name == "file" || name == "files" || field.file_name().is_some() {
            form.files.push(field.bytes().await?.to_vec());
        } else {
            form.fields.insert(name, field.text().await?);
        }
    }
    Ok(form)
}

fn single_file(mut files: Vec<Vec<u8>>) -> Result<Vec<u8>, ApiError> {
    match files.len() {
        0 => Err(ApiError::InvalidRequest("no file uploaded".into())),
        1 => Ok(files.remove(0)),
        n => Err(ApiError::InvalidRequest(format!(
            "expected one file, got {}",
            n
        ))),
    }
}

fn parse_json_field<T: DeserializeOwned>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ApiError> {
    fields
        .get(name)
        .map(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid {} field: {}", name, e)))
        })
        .transpose()
}

/// PDF work is CPU-bound; keep it off the async worker threads.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("worker task failed: {}", e)))?
}

fn file_response(output: PackagedOutput) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output.filename),
            ),
        ],
        output.bytes,
    )
        .into_response()
}
