use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::AppError;

/// Scope a role is defined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleDomain {
    /// Platform role assigned directly to users.
    Global,
    /// Role granted through space membership.
    Space,
}

impl RoleDomain {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Space => "space",
        }
    }
}

impl Display for RoleDomain {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RoleDomain {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "global" => Ok(Self::Global),
            "space" => Ok(Self::Space),
            _ => Err(AppError::Validation(format!(
                "unknown role domain '{value}'"
            ))),
        }
    }
}

/// Validated role code.
///
/// Codes double as rule subjects, so they may not collide with user subjects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleCode(String);

impl RoleCode {
    /// Maximum accepted code length.
    pub const MAX_LENGTH: usize = 64;

    /// Creates a role code of lowercase ascii letters, digits and underscores.
    pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        if value.is_empty() || value.len() > Self::MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "role code must be between 1 and {} characters",
                Self::MAX_LENGTH
            )));
        }

        let starts_with_letter = value
            .chars()
            .next()
            .is_some_and(|character| character.is_ascii_lowercase());
        let allowed_characters = value.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        });
        if !(starts_with_letter && allowed_characters) {
            return Err(AppError::Validation(format!(
                "role code '{value}' must start with a lowercase letter and contain only lowercase letters, digits and underscores"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for RoleCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleCode> for String {
    fn from(value: RoleCode) -> Self {
        value.0
    }
}
