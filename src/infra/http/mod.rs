//! HTTP surface for the browser editor.

pub mod editor;
mod middleware;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::{
    application::{
        ports::{ConfigSink, LayoutSource},
        render::RenderService,
    },
    config::CorsOrigin,
    infra::uploads::UploadStorage,
};

pub use middleware::RequestContext;

#[derive(Clone)]
pub struct EditorState {
    pub layouts: Arc<dyn LayoutSource>,
    pub sink: Arc<dyn ConfigSink>,
    pub renderer: Arc<RenderService>,
    pub upload_storage: Arc<UploadStorage>,
    pub upload_limit_bytes: usize,
}

pub fn build_router(state: EditorState, cors_origin: CorsOrigin) -> Router {
    let upload_limit = state.upload_limit_bytes;

    let upload_routes = Router::new()
        .route("/uploadImage", post(editor::upload_image))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/getEmailLayout", get(editor::get_layout))
        .route("/uploadEmailConfig", post(editor::save_config))
        .route("/renderAndDownloadTemplate", post(editor::render_template))
        .route("/uploads/{*path}", get(editor::serve_upload))
        .route("/_health", get(editor::health))
        .merge(upload_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn_with_state(
            cors_origin,
            middleware::cors,
        ))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
