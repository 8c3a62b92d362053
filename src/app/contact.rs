use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::app::page::{IncomingFlash, Page, redirect_with_flash};
use crate::app::state::AppState;
use crate::app::views;
use crate::error::AppError;
use crate::session::Flash;
use crate::validation::{ContactInput, FormErrors, INVALID_CSRF};

pub const THANK_YOU: &str = "Thank you for your message! We will get back to you soon.";

fn render(
    state: &AppState,
    flash: IncomingFlash,
    input: &ContactInput,
    errors: &FormErrors,
) -> Page {
    flash.render("Contact", views::contact(input, errors, &state.csrf_token()))
}

pub async fn show(State(state): State<AppState>, flash: IncomingFlash) -> Page {
    render(&state, flash, &ContactInput::default(), &FormErrors::default())
}

pub async fn submit(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Form(input): Form<ContactInput>,
) -> Result<Response, AppError> {
    let mut errors = input.validate();
    if !state.csrf_ok(&input.csrf_token) {
        errors.push("csrf_token", INVALID_CSRF);
    }
    if !errors.is_empty() {
        tracing::debug!(fields = ?errors.fields().collect::<Vec<_>>(), "contact form rejected");
        return Ok(render(&state, flash, &input, &errors).into_response());
    }

    let submission = input.into_submission(Utc::now());
    let id = state
        .with_db(move |db| db.insert_contact_submission(&submission))
        .await?;
    tracing::info!(id, "stored contact submission");

    redirect_with_flash(&state.secret_key, "/contact", &Flash::success(THANK_YOU))
}
