//! Vigil authorization API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod expiry_sweep;
mod handlers;
mod middleware;
mod route_table;
mod state;

#[cfg(test)]
mod test_support;

use tracing::info;
use vigil_core::AppError;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{
    AuthzPorts, build_app_state, build_postgres_session_layer, connect_and_migrate,
};
use crate::expiry_sweep::spawn_expiry_sweep;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(AuthzPorts::postgres(pool.clone()), &config)?;
    let super_admin = app_state.role_service.seed_builtin_roles().await?;
    info!(
        role_code = %super_admin.code,
        unmatched_routes = %config.unmatched_route_policy,
        "authorization services ready"
    );

    match config.expiry_sweep_interval {
        Some(interval) => {
            spawn_expiry_sweep(app_state.role_assignment_service.clone(), interval);
        }
        None => info!("assignment expiry sweep disabled"),
    }

    let session_layer = build_postgres_session_layer(pool, config.cookie_secure).await?;
    let app = build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "vigil-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
