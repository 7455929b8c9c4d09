//! Handlers behind the editor's four endpoints plus upload serving.

use std::io::ErrorKind;

use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use metrics::counter;
use tracing::{error, info};

use crate::{
    application::error::HttpError,
    infra::uploads::{UploadStorageError, UPLOADS_URL_PREFIX},
};

use super::{
    EditorState,
    models::{
        ConfigPayload, MessageResponse, RenderQuery, RenderRequest, RenderResponse,
        SaveConfigRequest, UploadResponse,
    },
};

pub const DOWNLOAD_FILENAME: &str = "email-template.html";
const IMAGE_FIELD: &str = "image";

pub async fn get_layout(State(state): State<EditorState>) -> Response {
    const SOURCE: &str = "infra::http::editor::get_layout";

    match state.layouts.load_layout().await {
        Ok(layout) => Html(layout).into_response(),
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error reading layout file.",
            &err,
        )
        .into_response(),
    }
}

pub async fn upload_image(
    State(state): State<EditorState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpError> {
    const SOURCE: &str = "infra::http::editor::upload_image";

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        HttpError::from_error(SOURCE, err.status(), "Invalid upload payload.", &err)
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("image")
            .to_string();

        let chunks = field.map(|chunk| {
            chunk.map_err(|err| UploadStorageError::PayloadStream {
                source: Box::new(err),
            })
        });

        let stored = state
            .upload_storage
            .store_stream(&filename, chunks)
            .await
            .map_err(|err| upload_error_to_http(SOURCE, err))?;

        info!(
            target = "mailcraft::uploads",
            filename = %filename,
            stored_path = %stored.stored_path,
            size_bytes = stored.size_bytes,
            checksum = %stored.checksum,
            "image stored"
        );
        counter!("mailcraft_upload_total").increment(1);

        return Ok(Json(UploadResponse {
            url: stored.public_url(),
        }));
    }

    Err(HttpError::new(
        SOURCE,
        StatusCode::BAD_REQUEST,
        "No file uploaded.",
        format!("multipart body has no `{IMAGE_FIELD}` field"),
    ))
}

fn upload_error_to_http(source: &'static str, err: UploadStorageError) -> HttpError {
    match &err {
        UploadStorageError::EmptyPayload => {
            HttpError::from_error(source, StatusCode::BAD_REQUEST, "No file uploaded.", &err)
        }
        UploadStorageError::PayloadStream { source: cause } => {
            let status = cause
                .downcast_ref::<MultipartError>()
                .map(MultipartError::status)
                .unwrap_or(StatusCode::BAD_REQUEST);
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "Uploaded file is too large."
            } else {
                "Invalid upload payload."
            };
            HttpError::from_error(source, status, message, &err)
        }
        UploadStorageError::InvalidPath
        | UploadStorageError::Io(_)
        | UploadStorageError::SizeOverflow => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store uploaded file.",
            &err,
        ),
    }
}

pub async fn save_config(
    State(state): State<EditorState>,
    payload: Result<Json<SaveConfigRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, HttpError> {
    const SOURCE: &str = "infra::http::editor::save_config";

    let Json(request) = payload.map_err(|rejection| {
        HttpError::from_error(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Invalid configuration.",
            &rejection,
        )
    })?;

    let sections = request.sections.ok_or_else(|| {
        HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Invalid configuration.",
            "request body has no `sections`",
        )
    })?;

    state.sink.save(&sections).await.map_err(|err| {
        HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save configuration.",
            &err,
        )
    })?;

    Ok(Json(MessageResponse {
        message: "Configuration saved successfully!".to_string(),
    }))
}

pub async fn render_template(
    State(state): State<EditorState>,
    Query(query): Query<RenderQuery>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::editor::render_template";

    let Json(request) = payload.map_err(|rejection| {
        HttpError::from_error(SOURCE, StatusCode::BAD_REQUEST, "Invalid input.", &rejection)
    })?;

    let substitutions = request
        .config
        .as_ref()
        .map(ConfigPayload::substitutions)
        .transpose()?;
    let rendered = state
        .renderer
        .render(request.layout.as_deref(), substitutions.as_ref())?;

    if query.download {
        return Ok(download_response(rendered));
    }

    Ok(Json(RenderResponse {
        rendered_html: rendered,
    })
    .into_response())
}

fn download_response(rendered: String) -> Response {
    let mut response = Html(rendered).into_response();
    let disposition = format!("attachment; filename=\"{DOWNLOAD_FILENAME}\"");
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response.headers_mut().insert(CONTENT_DISPOSITION, value);
    }
    response
}

pub async fn serve_upload(State(state): State<EditorState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::editor::serve_upload";

    match state.upload_storage.read(&path).await {
        Ok(bytes) => build_upload_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Upload not found",
            format!("refused unsafe path under {UPLOADS_URL_PREFIX}"),
        )
        .into_response(),
        Err(UploadStorageError::Io(err)) if err.kind() == ErrorKind::NotFound => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Upload not found",
            "The requested upload is not available",
        )
        .into_response(),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored upload"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file",
                &err,
            )
            .into_response()
        }
    }
}

fn build_upload_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
