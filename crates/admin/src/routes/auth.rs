//! Admin authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Result, set_sentry_user};
use crate::middleware::{BearerToken, RequireAdmin};
use crate::models::CurrentAdmin;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token issued on login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: CurrentAdmin,
}

/// Exchange email and password for a bearer token.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AdminAuthService::new(state.pool());
    let user = auth.login(&body.email, &body.password).await?;
    let issued = auth.issue_token(&user, state.config().token_ttl).await?;

    info!(admin_id = %user.id, role = %user.role, "Admin logged in");
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        admin: user.into(),
    }))
}

/// Revoke the presented token.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    BearerToken(token): BearerToken,
) -> Result<StatusCode> {
    AdminAuthService::new(state.pool()).logout(&token).await?;
    info!("Admin logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// The authenticated admin.
pub async fn me(RequireAdmin(admin): RequireAdmin) -> Json<CurrentAdmin> {
    Json(admin)
}
