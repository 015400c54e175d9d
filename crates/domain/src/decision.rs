use crate::PolicyEffect;

/// Outcome of evaluating the matched rules of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The user holds the super-admin role.
    ShortCircuitAllow,
    /// At least one matching rule denies.
    Deny,
    /// At least one matching rule allows and none deny.
    Allow,
    /// No rule matched.
    NoMatch,
}

impl Decision {
    /// Folds matched effects into a decision.
    ///
    /// Precedence is super-admin, then any deny, then any allow.
    #[must_use]
    pub fn evaluate<I>(is_super_admin: bool, effects: I) -> Self
    where
        I: IntoIterator<Item = PolicyEffect>,
    {
        if is_super_admin {
            return Self::ShortCircuitAllow;
        }

        effects
            .into_iter()
            .fold(Self::NoMatch, |decision, effect| match (decision, effect) {
                (Self::Deny, _) | (_, PolicyEffect::Deny) => Self::Deny,
                (_, PolicyEffect::Allow) => Self::Allow,
            })
    }

    /// Returns whether the request is permitted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::ShortCircuitAllow | Self::Allow)
    }

    /// Returns the human-readable reason reported to callers.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ShortCircuitAllow => "super admin",
            Self::Deny => "denied by explicit policy",
            Self::Allow => "allowed by policy",
            Self::NoMatch => "insufficient permissions",
        }
    }
}
