use axum::extract::State;

use crate::app::page::{IncomingFlash, Page};
use crate::app::state::AppState;
use crate::app::views;
use crate::error::AppError;

pub async fn home(State(state): State<AppState>, flash: IncomingFlash) -> Result<Page, AppError> {
    let featured = state.with_db(|db| db.featured_books()).await?;
    Ok(flash.render("Home", views::home(&featured)))
}

pub async fn archives(
    State(state): State<AppState>,
    flash: IncomingFlash,
) -> Result<Page, AppError> {
    let books = state.with_db(|db| db.list_books(None)).await?;
    Ok(flash.render("Archives", views::archives(&books)))
}

pub async fn editorial(flash: IncomingFlash) -> Page {
    flash.render("Editorial Board", views::editorial())
}

pub async fn manuscript(flash: IncomingFlash) -> Page {
    flash.render("Submit a Manuscript", views::manuscript())
}

pub async fn policies(flash: IncomingFlash) -> Page {
    flash.render("Policies", views::policies())
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
