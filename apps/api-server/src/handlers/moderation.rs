//! Staff-only comment moderation.
//!
//! Path ids and request bodies are parsed only after the staff check, so
//! every non-staff request is answered with 403.

use actix_web::{HttpResponse, web};

use folio_core::access::require_staff;
use folio_core::domain::CommentId;
use folio_shared::dto::{BulkApproveRequest, BulkApproveResponse};

use super::present;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/moderation/comments/pending/
pub async fn pending_comments(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let pending = state.moderation.pending(&identity.into_caller()).await?;

    Ok(HttpResponse::Ok().json(present::comments(&pending)))
}

/// PATCH /api/moderation/comments/{id}/toggle-approve/
pub async fn toggle_approve(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let caller = identity.into_caller();
    require_staff(&caller)?;

    let id: CommentId = path
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid comment id: {}", path.as_str())))?;

    let updated = state.moderation.toggle_approval(&caller, id).await?;

    Ok(HttpResponse::Ok().json(present::comment(&updated)))
}

/// POST /api/moderation/comments/approve/
pub async fn approve_selected(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let caller = identity.into_caller();
    require_staff(&caller)?;

    let request: BulkApproveRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let approved = state.moderation.approve_selected(&caller, &request.ids).await?;

    Ok(HttpResponse::Ok().json(BulkApproveResponse { approved }))
}
