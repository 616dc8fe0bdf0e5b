//! Admin user management route handlers. Super admins only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use kirana_core::AdminUserId;

use crate::db::AdminUserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireSuperAdmin;
use crate::models::{AdminRole, AdminUser};
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Body of an admin creation request.
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub password: String,
}

/// All admin users.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
) -> Result<Json<Vec<AdminUser>>> {
    let users = AdminUserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}

/// Create an admin user.
#[instrument(skip_all, fields(admin_id = %admin.id, email = %body.email, role = %body.role))]
pub async fn create(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(body): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminUser>)> {
    let user = AdminAuthService::new(state.pool())
        .create_admin(&body.email, &body.name, body.role, &body.password)
        .await?;
    info!(new_admin_id = %user.id, "Admin user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Delete an admin user. The last super admin cannot be removed.
#[instrument(skip_all, fields(admin_id = %admin.id, target_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<AdminUserId>,
) -> Result<StatusCode> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    AdminUserRepository::new(state.pool()).delete(id).await?;
    info!("Admin user deleted");
    Ok(StatusCode::NO_CONTENT)
}
