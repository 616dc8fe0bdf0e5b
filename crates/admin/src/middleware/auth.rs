//! Authentication extractors for admin.
//!
//! Every console route except login takes one of these. They differ only in
//! the role they demand:
//!
//! | Extractor           | Roles                         |
//! |---------------------|-------------------------------|
//! | [`RequireAdmin`]    | any                           |
//! | [`RequireWriter`]   | `super_admin`, `admin`        |
//! | [`RequireSuperAdmin`] | `super_admin`               |

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentAdmin;
use crate::services::auth::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

/// Extractor that requires a logged-in admin of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let admin = AdminAuthService::new(state.pool())
            .authenticate(&token)
            .await
            .map_err(|e| match e {
                AdminAuthError::InvalidToken => {
                    AppError::Unauthorized("Authentication required".to_string())
                }
                other => AppError::Auth(other),
            })?;

        set_sentry_user(&admin.id, Some(admin.email.as_str()));
        Ok(Self(admin))
    }
}

/// Extractor that requires an admin allowed to modify store data.
///
/// Viewers get 403 Forbidden.
pub struct RequireWriter(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireWriter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdmin(admin) = RequireAdmin::from_request_parts(parts, state).await?;
        if !admin.role.can_write() {
            return Err(AppError::Forbidden(
                "Your role has read-only access".to_string(),
            ));
        }
        Ok(Self(admin))
    }
}

/// Extractor that requires super admin authentication.
///
/// Other roles get 403 Forbidden.
pub struct RequireSuperAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdmin(admin) = RequireAdmin::from_request_parts(parts, state).await?;
        if !admin.role.is_super_admin() {
            return Err(AppError::Forbidden(
                "Only super admins can access this resource".to_string(),
            ));
        }
        Ok(Self(admin))
    }
}

/// The raw bearer token of a request.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts)
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/products");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer t0k"))), Some("t0k".to_string()));
        assert_eq!(bearer_token(&parts(Some("Token t0k"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
