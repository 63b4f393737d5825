use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    blob::{BlobError, BlobStore},
    draft::{DRAFT_COOKIE, Draft, DraftStore, is_draft_token, new_draft_token},
    id::{is_image_name, new_image_name},
    notes::{NoteStore, StoreError},
    render::render_notes,
};

mod page;

pub const IMAGE_ROUTE_PREFIX: &str = "/img/";

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub drafts: DraftStore,
    pub bucket: Arc<String>,
}

impl AppState {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        blobs: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            notes,
            blobs,
            drafts: DraftStore::default(),
            bucket: Arc::new(bucket.into()),
        }
    }
}

#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: String,
}

impl PageError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StoreError> for PageError {
    fn from(value: StoreError) -> Self {
        error!(error = %value, "note store operation failed");
        PageError::internal("something went wrong while accessing notes")
    }
}

impl From<BlobError> for PageError {
    fn from(value: BlobError) -> Self {
        if value.is_not_found() {
            return PageError::not_found("image not found");
        }
        error!(error = %value, "blob store operation failed");
        PageError::internal("something went wrong while accessing images")
    }
}

impl From<MultipartError> for PageError {
    fn from(value: MultipartError) -> Self {
        let status = value.status();
        warn!(status = status.as_u16(), error = %value, "rejected upload");
        PageError::new(status, value.body_text())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(view_notes))
        .route(
            "/upload",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/submit", post(submit_note))
        .route("/img/:name", get(fetch_image))
        .fallback(fallback_not_found)
        .layer(Extension(state))
}

pub fn image_link(name: &str) -> String {
    format!("{IMAGE_ROUTE_PREFIX}{name}")
}

async fn view_notes(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let notes = state.notes.fetch_all_notes().await?;
    let rendered = render_notes(notes);
    let draft = match draft_token(&headers) {
        Some(token) => state.drafts.get(&token).await,
        None => Draft::default(),
    };

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Html(page::index_html(&rendered, &draft)),
    )
        .into_response())
}

async fn upload_image(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, PageError> {
    let mut text: Option<String> = None;
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("note_content") => text = Some(field.text().await?),
            Some("uploaded_file") => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                upload = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    // Browsers send an empty, unnamed part when no file was chosen.
    let Some((filename, payload)) =
        upload.filter(|(filename, payload)| !(payload.is_empty() && is_blank(filename)))
    else {
        return Err(PageError::bad_request("no image file was uploaded"));
    };

    let name = new_image_name(filename.as_deref().filter(|f| !f.is_empty()));
    let size = payload.len();
    state.blobs.put_object(&state.bucket, &name, payload).await?;

    let (token, set_cookie) = session(&headers);
    let draft = state
        .drafts
        .attach_image(&token, text, &image_link(&name))
        .await;
    info!(
        image = %name,
        bytes = size,
        pending_images = draft.image_links.len(),
        "stored uploaded image"
    );

    Ok(redirect_home(set_cookie))
}

#[derive(Debug, Deserialize)]
struct NoteForm {
    #[serde(default)]
    note_content: Option<String>,
}

async fn submit_note(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Form(form): Form<NoteForm>,
) -> Result<Response, PageError> {
    let token = draft_token(&headers);
    let mut draft = match &token {
        Some(token) => state.drafts.get(token).await,
        None => Draft::default(),
    };
    if let Some(text) = form.note_content {
        draft.text = text;
    }

    // The draft is only dropped once the note is safely stored.
    let note_id = state.notes.insert_note(draft.compose()).await?;
    if let Some(token) = &token {
        state.drafts.clear(token).await;
    }
    info!(
        note_id = %note_id,
        images = draft.image_links.len(),
        "saved note"
    );

    Ok(redirect_home(None))
}

async fn fetch_image(
    Extension(state): Extension<AppState>,
    Path(name): Path<String>,
) -> Result<Response, PageError> {
    if !is_image_name(&name) {
        return Err(PageError::not_found("image not found"));
    }
    let bytes = state.blobs.get_object(&state.bucket, &name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    )
        .into_response())
}

async fn fallback_not_found() -> PageError {
    PageError::not_found("not found")
}

fn is_blank(filename: &Option<String>) -> bool {
    filename.as_deref().is_none_or(str::is_empty)
}

fn redirect_home(set_cookie: Option<HeaderValue>) -> Response {
    let mut res = Redirect::to("/").into_response();
    if let Some(cookie) = set_cookie {
        res.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    res
}

/// The caller's draft token, or a fresh one plus the `Set-Cookie` value
/// that hands it out.
fn session(headers: &HeaderMap) -> (String, Option<HeaderValue>) {
    if let Some(token) = draft_token(headers) {
        return (token, None);
    }
    let token = new_draft_token();
    let cookie = format!("{DRAFT_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    let cookie = HeaderValue::from_str(&cookie).ok();
    (token, cookie)
}

fn draft_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == DRAFT_COOKIE && is_draft_token(value))
        .map(|(_, value)| value.to_string())
}
