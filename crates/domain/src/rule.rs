use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::AppError;

use crate::AuthzDomain;

/// Effect carried by a policy rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    /// Grants the action.
    Allow,
    /// Vetoes the action regardless of any grant.
    Deny,
}

impl PolicyEffect {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl Display for PolicyEffect {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PolicyEffect {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            // Rows written without an effect column predate explicit denies.
            "" | "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown policy effect '{value}'"
            ))),
        }
    }
}

/// Flat permission statement evaluated by the enforcement engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Role code or `user:<id>`.
    pub subject: String,
    /// Domain kind or concrete domain.
    pub domain: String,
    /// `resource` or `resource:<id>`.
    pub object: String,
    /// Action identifier.
    pub action: String,
    /// Allow or deny.
    pub effect: PolicyEffect,
}

impl PolicyRule {
    /// Creates an allow rule.
    #[must_use]
    pub fn allow(
        subject: impl Into<String>,
        domain: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            domain: domain.into(),
            object: object.into(),
            action: action.into(),
            effect: PolicyEffect::Allow,
        }
    }

    /// Creates a deny rule.
    #[must_use]
    pub fn deny(
        subject: impl Into<String>,
        domain: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            effect: PolicyEffect::Deny,
            ..Self::allow(subject, domain, object, action)
        }
    }
}

/// Membership of a user in a role, optionally limited to one domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupRule {
    /// `user:<id>` subject.
    pub user: String,
    /// Role code.
    pub role: String,
    /// Domain restriction; `None` applies everywhere.
    pub domain: Option<String>,
}

impl GroupRule {
    /// Creates a domain-agnostic membership.
    #[must_use]
    pub fn global(user: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
            domain: Some(AuthzDomain::GLOBAL.to_owned()),
        }
    }

    /// Creates a membership restricted to one domain.
    #[must_use]
    pub fn scoped(user: impl Into<String>, role: impl Into<String>, domain: &AuthzDomain) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
            domain: Some(domain.as_storage_value()),
        }
    }

    /// Returns whether this membership is effective for a request domain.
    #[must_use]
    pub fn applies_to(&self, domain: &AuthzDomain) -> bool {
        match self.domain.as_deref().map(str::trim) {
            None | Some("") | Some(AuthzDomain::GLOBAL) => true,
            Some(value) => value == domain.as_storage_value(),
        }
    }

    fn storage_domain(&self) -> String {
        match self.domain.as_deref().map(str::trim) {
            None | Some("") => AuthzDomain::GLOBAL.to_owned(),
            Some(value) => value.to_owned(),
        }
    }
}

/// Row kind in the rule store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleType {
    /// Policy row.
    #[serde(rename = "p")]
    Policy,
    /// Group row.
    #[serde(rename = "g")]
    Group,
}

impl RuleType {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Policy => "p",
            Self::Group => "g",
        }
    }
}

impl FromStr for RuleType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "p" => Ok(Self::Policy),
            "g" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!("unknown rule type '{value}'"))),
        }
    }
}

/// Persisted rule row using positional columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// `p` or `g`.
    pub ptype: String,
    /// First positional value.
    pub v0: String,
    /// Second positional value.
    pub v1: String,
    /// Third positional value.
    pub v2: String,
    /// Fourth positional value.
    pub v3: String,
    /// Fifth positional value.
    pub v4: String,
    /// Sixth positional value, unused by the current model.
    pub v5: String,
}

/// Decoded rule row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `p` row.
    Policy(PolicyRule),
    /// `g` row.
    Group(GroupRule),
}

impl From<&PolicyRule> for RuleRecord {
    fn from(rule: &PolicyRule) -> Self {
        Self {
            ptype: RuleType::Policy.as_str().to_owned(),
            v0: rule.subject.clone(),
            v1: rule.domain.clone(),
            v2: rule.object.clone(),
            v3: rule.action.clone(),
            v4: rule.effect.as_str().to_owned(),
            v5: String::new(),
        }
    }
}

impl From<&GroupRule> for RuleRecord {
    fn from(rule: &GroupRule) -> Self {
        Self {
            ptype: RuleType::Group.as_str().to_owned(),
            v0: rule.user.clone(),
            v1: rule.role.clone(),
            v2: rule.storage_domain(),
            ..Self::default()
        }
    }
}

impl TryFrom<RuleRecord> for Rule {
    type Error = AppError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        match RuleType::from_str(record.ptype.as_str())? {
            RuleType::Policy => Ok(Self::Policy(PolicyRule {
                effect: PolicyEffect::from_str(record.v4.as_str())?,
                subject: record.v0,
                domain: record.v1,
                object: record.v2,
                action: record.v3,
            })),
            RuleType::Group => Ok(Self::Group(GroupRule {
                user: record.v0,
                role: record.v1,
                domain: (!record.v2.trim().is_empty()).then_some(record.v2),
            })),
        }
    }
}
