use axum::Json;
use axum::extract::State;

use crate::app::state::AppState;
use crate::error::AppError;
use crate::model::{Book, ContactSubmission};

pub async fn books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, AppError> {
    let books = state.with_db(|db| db.list_books(None)).await?;
    Ok(Json(books))
}

pub async fn contact_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactSubmission>>, AppError> {
    let submissions = state.with_db(|db| db.list_contact_submissions()).await?;
    Ok(Json(submissions))
}
