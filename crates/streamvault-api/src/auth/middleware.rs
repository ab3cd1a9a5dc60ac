//! Bearer-token authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use streamvault_core::AppError;

use crate::error::HttpAppError;

use super::models::{AuthUser, UserRole};
use super::token_verifier::TokenVerifier;

pub struct AuthLayerState {
    /// Absent when validation is disabled for local development.
    pub verifier: Option<Arc<TokenVerifier>>,
}

fn development_user() -> AuthUser {
    AuthUser {
        id: "dev-user".to_string(),
        email: "dev@example.com".to_string(),
        name: "Development User".to_string(),
        role: UserRole::User,
    }
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthLayerState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(verifier) = auth_state.verifier.as_ref() else {
        // Development bypass; never enable in production deployments.
        tracing::warn!("Token validation is disabled; using development identity");
        request.extensions_mut().insert(development_user());
        return next.run(request).await;
    };

    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(header) => header,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match verifier.verify(token).await {
        Ok(claims) => {
            let user = AuthUser::from_claims(claims);
            tracing::debug!(user_id = %user.id, "User authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => HttpAppError(err).into_response(),
    }
}
