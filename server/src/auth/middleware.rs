//! Authentication extractor.
//!
//! Requests carry `Authorization: Bearer <token>`. Tokens are resolved to
//! an owner through the `api_tokens` table, or taken as the owner ID
//! itself when `DEV_AUTH` is set.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db;
use crate::error::AppError;
use crate::AppState;

/// Authenticated owner extracted from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub owner_id: String,
}

impl AuthUser {
    /// Ensure the caller owns the addressed subtree.
    pub fn authorize(&self, owner_id: &str) -> Result<(), AppError> {
        if self.owner_id == owner_id {
            Ok(())
        } else {
            tracing::warn!(caller = %self.owner_id, target = %owner_id, "cross-owner access rejected");
            Err(AppError::Forbidden)
        }
    }
}

/// Pull the token out of a `Bearer` authorization header value.
fn bearer_token(header: &str) -> Result<&str, AppError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("Invalid authorization header format"))?
        .trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Empty bearer token"));
    }
    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized("Missing authorization header"))?;
        let token = bearer_token(header)?;

        if state.config.dev_auth {
            return Ok(AuthUser {
                owner_id: token.to_string(),
            });
        }

        match db::find_token_owner(&state.pool, token).await? {
            Some(owner_id) => Ok(AuthUser { owner_id }),
            None => Err(AppError::Unauthorized("Unknown token")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert!(matches!(
            bearer_token("Basic abc"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token("Bearer  "),
            Err(AppError::Unauthorized("Empty bearer token"))
        ));
    }

    #[test]
    fn authorize_same_owner_only() {
        let user = AuthUser {
            owner_id: "u1".into(),
        };
        assert!(user.authorize("u1").is_ok());
        assert!(matches!(user.authorize("u2"), Err(AppError::Forbidden)));
    }
}
