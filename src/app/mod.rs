//! HTTP surface of the site: HTML pages, the two forms, PDF retrieval and the
//! JSON listing API.

pub mod api;
pub mod contact;
pub mod files;
pub mod page;
pub mod pages;
pub mod state;
pub mod upload;
pub mod views;

use std::any::Any;
use std::convert::Infallible;

use anyhow::Context as _;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use state::AppState;

use crate::config::Config;
use crate::error::AppError;
use crate::file_store::LocalFsFileStore;

/// Prepares storage (tables, upload and static dirs) and returns the router.
pub fn build(config: &Config) -> anyhow::Result<Router> {
    let state = AppState::new(config);
    state
        .db
        .init()
        .with_context(|| format!("init database: {}", config.database_path.display()))?;
    LocalFsFileStore::new(&config.upload_dir).ensure_dir()?;
    std::fs::create_dir_all(&config.static_dir)
        .with_context(|| format!("create static dir: {}", config.static_dir.display()))?;

    Ok(router(state, config))
}

pub fn router(state: AppState, config: &Config) -> Router {
    let static_files = ServeDir::new(&config.static_dir).not_found_service(tower::service_fn(
        |_: Request| async { Ok::<_, Infallible>(AppError::NotFound.into_response()) },
    ));

    Router::new()
        .route("/", get(pages::home))
        .route("/archives", get(pages::archives))
        .route("/editorial", get(pages::editorial))
        .route("/manuscript", get(pages::manuscript))
        .route("/policies", get(pages::policies))
        .route("/contact", get(contact::show).post(contact::submit))
        .route("/upload-book", get(upload::show).post(upload::submit))
        .route("/download/:filename", get(files::download))
        .route("/view/:filename", get(files::view))
        .route("/api/books", get(api::books))
        .route("/api/contact-submissions", get(api::contact_submissions))
        .nest_service("/static", static_files)
        .fallback(pages::not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(middleware::map_response(payload_too_large_page))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// `RequestBodyLimitLayer` answers oversized requests with plain text.
async fn payload_too_large_page(resp: Response) -> Response {
    if resp.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge.into_response()
    } else {
        resp
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let app = build(&config)?;

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
