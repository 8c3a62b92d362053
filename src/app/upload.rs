use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::app::page::{IncomingFlash, Page, redirect_with_flash};
use crate::app::state::AppState;
use crate::app::views;
use crate::error::AppError;
use crate::session::Flash;
use crate::validation::{BookFields, FormErrors, INVALID_CSRF, UploadedFile};

pub const UPLOADED: &str = "Book uploaded successfully!";

#[derive(Debug, Default)]
struct UploadForm {
    fields: BookFields,
    file: Option<UploadedFile>,
    csrf_token: String,
}

fn render(
    state: &AppState,
    flash: IncomingFlash,
    fields: &BookFields,
    errors: &FormErrors,
) -> Page {
    flash.render(
        "Upload a Book",
        views::upload_book(fields, errors, &state.csrf_token()),
    )
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.fields.title = field.text().await.map_err(multipart_error)?,
            "author" => form.fields.author = field.text().await.map_err(multipart_error)?,
            "description" => {
                form.fields.description = field.text().await.map_err(multipart_error)?;
            }
            "csrf_token" => form.csrf_token = field.text().await.map_err(multipart_error)?,
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() {
                    form.file = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

pub async fn show(State(state): State<AppState>, flash: IncomingFlash) -> Page {
    render(&state, flash, &BookFields::default(), &FormErrors::default())
}

pub async fn submit(
    State(state): State<AppState>,
    flash: IncomingFlash,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let UploadForm {
        fields,
        file,
        csrf_token,
    } = read_form(multipart).await?;

    let mut errors = fields.validate(file.as_ref());
    if !state.csrf_ok(&csrf_token) {
        errors.push("csrf_token", INVALID_CSRF);
    }
    let file = match file {
        Some(file) if errors.is_empty() => file,
        _ => {
            tracing::debug!(fields = ?errors.fields().collect::<Vec<_>>(), "upload form rejected");
            return Ok(render(&state, flash, &fields, &errors).into_response());
        }
    };

    // The file lands before the row. If the insert fails the file is removed
    // again; a crash in between leaves an orphan for `prune-uploads`.
    let stored_name = state.files.save_pdf(&file.bytes).await?;
    let book = fields.into_book(&file, stored_name.clone(), Utc::now());
    let title = book.title.clone();

    match state.with_db(move |db| db.insert_book(&book)).await {
        Ok(id) => {
            tracing::info!(
                id,
                %title,
                filename = %stored_name,
                bytes = file.bytes.len(),
                "stored book"
            );
        }
        Err(err) => {
            if let Err(cleanup) = state.files.remove(&stored_name).await {
                tracing::warn!(
                    filename = %stored_name,
                    err = ?cleanup,
                    "failed to remove orphaned upload"
                );
            }
            return Err(err);
        }
    }

    redirect_with_flash(&state.secret_key, "/archives", &Flash::success(UPLOADED))
}
