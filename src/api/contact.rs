//! Contact form endpoint.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::models::{ContactForm, ContactReceipt};
use crate::AppState;

/// POST /api/contact - Relay a visitor's message.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> ApiResult<ContactReceipt> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.contact.submit(&form).await {
        Ok(()) => success(ContactReceipt::delivered(), revision_id),
        Err(e) => error(e, revision_id),
    }
}
