use serde::{Deserialize, Serialize};
use ts_rs::TS;
use vigil_core::UserIdentity;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for bootstrap sign-in.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub user_id: i64,
    pub display_name: Option<String>,
    pub token: String,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub user_id: i64,
    pub subject: String,
    pub display_name: String,
    /// Codes of the global roles currently assigned to the user.
    pub roles: Vec<String>,
}

impl UserIdentityResponse {
    /// Creates a response from the identity and its assigned role codes.
    #[must_use]
    pub fn from_identity_with_roles(identity: &UserIdentity, roles: Vec<String>) -> Self {
        Self {
            user_id: identity.user_id().as_i64(),
            subject: identity.subject(),
            display_name: identity.display_name().to_owned(),
            roles,
        }
    }
}
