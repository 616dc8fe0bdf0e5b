//! Customer authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::db::CustomerRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{BearerToken, RequireAuth};
use crate::models::Customer;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token issued on register or login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub customer: Customer,
}

/// Create an account and log in.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = AuthService::new(state.pool(), state.config().token_ttl);
    let customer = auth
        .register(
            &body.email,
            &body.password,
            &body.full_name,
            body.phone_number.as_deref(),
        )
        .await?;
    let issued = auth.issue_token(&customer).await?;

    info!(customer_id = %customer.id, "Customer registered");
    set_sentry_user(&customer.id, Some(customer.email.as_str()));

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            customer,
        }),
    ))
}

/// Exchange email and password for a bearer token.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.config().token_ttl);
    let customer = auth.login(&body.email, &body.password).await?;
    let issued = auth.issue_token(&customer).await?;

    info!(customer_id = %customer.id, "Customer logged in");
    set_sentry_user(&customer.id, Some(customer.email.as_str()));

    Ok(Json(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        customer,
    }))
}

/// Revoke the presented token.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    BearerToken(token): BearerToken,
) -> Result<StatusCode> {
    AuthService::new(state.pool(), state.config().token_ttl)
        .logout(&token)
        .await?;

    info!(customer_id = %customer.id, "Customer logged out");
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The authenticated customer's profile.
#[instrument(skip_all)]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Customer>> {
    let customer = CustomerRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
    Ok(Json(customer))
}
