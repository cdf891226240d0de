use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, services::auth_service, state::AppState};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// An authenticated admin, resolved from the session ledger.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Token from `Authorization: Bearer <token>`, falling back to `X-Admin-Token`.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    let token = bearer.or_else(|| {
        headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })?;
    Some(token.to_string())
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;
        auth_service::authenticate(state, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_admin_token() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("fallback"));
        assert_eq!(extract_token(&headers).as_deref(), Some("fallback"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer primary"));
        assert_eq!(extract_token(&headers).as_deref(), Some("primary"));
    }

    #[test]
    fn missing_or_blank_tokens_are_rejected() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("  "));
        assert_eq!(extract_token(&headers), None);
    }
}
