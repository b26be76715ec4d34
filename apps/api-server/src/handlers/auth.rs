//! Token endpoints.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use folio_core::domain::User;
use folio_core::ports::{AuthError, STAFF_ROLE, TokenKind, TokenService};
use folio_shared::dto::{
    AccessTokenResponse, IdentityResponse, LoginRequest, RefreshRequest, TokenPairResponse,
};

use crate::middleware::auth::{AuthenticationError, Identity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn roles_for(user: &User) -> Vec<String> {
    if user.is_staff {
        vec![STAFF_ROLE.to_string()]
    } else {
        Vec::new()
    }
}

fn issue(tokens: &dyn TokenService, kind: TokenKind, user: &User) -> AppResult<String> {
    tokens
        .generate_token(kind, user.id, &user.username, roles_for(user))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// POST /api/token/
pub async fn obtain_token(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await
        .map_err(AppError::from)?;

    // Unknown usernames pay the same hashing cost as known ones.
    let hash = user
        .as_ref()
        .map_or(&*state.decoy_password_hash, |u| u.password_hash.as_str());
    let verified = state.passwords.verify(&req.password, hash);

    let user = match (user, verified) {
        (Some(user), Ok(true)) => user,
        (Some(_), Err(e)) => return Err(AppError::Internal(e.to_string()).into()),
        _ => {
            tracing::info!(username = %req.username, "Rejected login attempt");
            return Err(AuthenticationError(AuthError::InvalidCredentials).into());
        }
    };

    let tokens = token_service.get_ref().as_ref();
    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access: issue(tokens, TokenKind::Access, &user)?,
        refresh: issue(tokens, TokenKind::Refresh, &user)?,
    }))
}

/// POST /api/token/refresh/
///
/// The user is reloaded so a revoked staff flag stops at the next refresh.
pub async fn refresh_token(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = token_service
        .validate_token(&body.refresh)
        .map_err(AuthenticationError)?;

    if claims.kind != TokenKind::Refresh {
        return Err(AuthenticationError(AuthError::InvalidToken(
            "Expected a refresh token".to_string(),
        ))
        .into());
    }

    let user = state
        .users
        .find_by_id(claims.user_id)
        .await
        .map_err(AppError::from)?
        .ok_or(AuthenticationError(AuthError::InvalidCredentials))?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access: issue(token_service.get_ref().as_ref(), TokenKind::Access, &user)?,
    }))
}

/// GET /api/auth/me/ - Protected route
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(IdentityResponse {
        id: identity.user_id,
        is_staff: identity.is_staff(),
        username: identity.username,
    }))
}
