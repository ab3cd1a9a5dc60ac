use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// User role for authorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Claims carried by the identity proxy's JWT.
#[derive(Debug, Deserialize)]
pub struct IdClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

/// Authenticated caller, resolved by the auth middleware and stored in
/// request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn from_claims(claims: IdClaims) -> Self {
        let email = claims
            .email
            .unwrap_or_else(|| "no-email@example.com".to_string());
        let name = claims.name.unwrap_or_else(|| email.clone());
        AuthUser {
            id: claims.sub,
            email,
            name,
            role: UserRole::User,
        }
    }
}

// Implement FromRequestParts for AuthUser to work with Multipart.
// Extension cannot be used with Multipart, so we extract directly from request parts.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Missing authentication context".to_string(),
                    details: None,
                    error_type: None,
                    code: "UNAUTHORIZED".to_string(),
                    recoverable: false,
                    suggested_action: Some("Check authentication token".to_string()),
                    errors: None,
                    warnings: None,
                }),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_claims_fills_fallbacks() {
        let user = AuthUser::from_claims(IdClaims {
            sub: "1234".to_string(),
            email: None,
            name: None,
            exp: 0,
        });
        assert_eq!(user.id, "1234");
        assert_eq!(user.email, "no-email@example.com");
        assert_eq!(user.name, user.email);
        assert_eq!(user.role, UserRole::User);
    }
}
