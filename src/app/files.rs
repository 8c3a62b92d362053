use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;

use crate::app::state::AppState;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Attachment,
    Inline,
}

pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    serve(&state, &filename, Disposition::Attachment).await
}

pub async fn view(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    serve(&state, &filename, Disposition::Inline).await
}

fn content_type(filename: &str) -> &'static str {
    if filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
    {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

async fn serve(
    state: &AppState,
    filename: &str,
    disposition: Disposition,
) -> Result<Response, AppError> {
    let Some(stored) = state.files.open(filename).await? else {
        return Err(AppError::NotFound);
    };

    let kind = match disposition {
        Disposition::Attachment => "attachment",
        Disposition::Inline => "inline",
    };
    let quoted = filename.replace(['"', '\r', '\n'], "_");

    let body = Body::from_stream(ReaderStream::new(stored.file));
    let mut resp = Response::new(body);
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type(filename)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(stored.len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("{kind}; filename=\"{quoted}\""))
            .map_err(|_| AppError::NotFound)?,
    );
    Ok(resp)
}
