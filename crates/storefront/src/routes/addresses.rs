//! Address book route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use kirana_core::AddressId;
use kirana_core::address::AddressInput;

use crate::db::{AddressRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Address;
use crate::state::AppState;

fn not_found(err: RepositoryError, id: AddressId) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(format!("address {id}")),
        other => AppError::Database(other),
    }
}

/// Saved addresses, default first.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool()).list(customer.id).await?;
    Ok(Json(addresses))
}

/// Save a new address.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    input.validate().map_err(AppError::Validation)?;
    let address = AddressRepository::new(state.pool())
        .create(customer.id, &input.normalized())
        .await?;
    info!(address_id = %address.id, "Address saved");
    Ok((StatusCode::CREATED, Json(address)))
}

/// Replace an address.
#[instrument(skip_all, fields(customer_id = %customer.id, address_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    input.validate().map_err(AppError::Validation)?;
    let address = AddressRepository::new(state.pool())
        .update(customer.id, id, &input.normalized())
        .await
        .map_err(|e| not_found(e, id))?;
    Ok(Json(address))
}

/// Delete an address and return what remains.
#[instrument(skip_all, fields(customer_id = %customer.id, address_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool());
    addresses
        .delete(customer.id, id)
        .await
        .map_err(|e| not_found(e, id))?;
    info!("Address deleted");
    Ok(Json(addresses.list(customer.id).await?))
}

/// Make an address the default.
#[instrument(skip_all, fields(customer_id = %customer.id, address_id = %id))]
pub async fn set_default(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .set_default(customer.id, id)
        .await
        .map_err(|e| not_found(e, id))?;
    Ok(Json(address))
}
