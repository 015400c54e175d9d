use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vigil_application::UnmatchedRoutePolicy;
use vigil_core::AppError;

const DEFAULT_SUPER_ADMIN_ROLE_CODE: &str = "super_admin";
const DEFAULT_EXPIRY_SWEEP_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub super_admin_role_code: String,
    pub unmatched_route_policy: UnmatchedRoutePolicy,
    pub expiry_sweep_interval: Option<Duration>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let super_admin_role_code = env::var("SUPER_ADMIN_ROLE_CODE")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SUPER_ADMIN_ROLE_CODE.to_owned());

        let unmatched_route_policy = env::var("PERMISSION_UNMATCHED_ROUTES")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| UnmatchedRoutePolicy::from_str(value.as_str()))
            .transpose()?
            .unwrap_or_default();

        let expiry_sweep_seconds = match env::var("ASSIGNMENT_EXPIRY_SWEEP_SECONDS") {
            Ok(value) => value.trim().parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid ASSIGNMENT_EXPIRY_SWEEP_SECONDS: {error}"))
            })?,
            Err(_) => DEFAULT_EXPIRY_SWEEP_SECONDS,
        };
        let expiry_sweep_interval =
            (expiry_sweep_seconds > 0).then(|| Duration::from_secs(expiry_sweep_seconds));

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            super_admin_role_code,
            unmatched_route_policy,
            expiry_sweep_interval,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
