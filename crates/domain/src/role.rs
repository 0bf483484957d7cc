use serde::{Deserialize, Serialize};

/// Name of the baseline privilege role.
pub const BASELINE_ROLE_NAME: &str = "Gamma";

/// Name of the elevated privilege role.
pub const ELEVATED_ROLE_NAME: &str = "Admin";

/// Named permission bundle held by the account directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    id: i64,
    name: String,
}

impl Role {
    /// Creates a role from its stored identifier and unique name.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the stored role identifier.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the unique role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Privilege levels asserted through the identity provider `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeLevel {
    /// Elevated access, mapped onto the `Admin` role.
    Sysadmin,
    /// Baseline access, mapped onto the `Gamma` role.
    Operator,
}

impl PrivilegeLevel {
    /// Returns the claim value asserted by the identity provider.
    #[must_use]
    pub fn as_claim(&self) -> &'static str {
        match self {
            Self::Sysadmin => "sysadmin",
            Self::Operator => "operator",
        }
    }

    /// Returns the local role name granted for this level.
    #[must_use]
    pub fn role_name(&self) -> &'static str {
        match self {
            Self::Sysadmin => ELEVATED_ROLE_NAME,
            Self::Operator => BASELINE_ROLE_NAME,
        }
    }

    /// Resolves the effective level from asserted claim values.
    ///
    /// `sysadmin` takes precedence when both levels are asserted. Unknown
    /// values are ignored.
    #[must_use]
    pub fn from_claims<S: AsRef<str>>(claims: &[S]) -> Option<Self> {
        let asserted = |level: Self| claims.iter().any(|claim| claim.as_ref() == level.as_claim());

        if asserted(Self::Sysadmin) {
            Some(Self::Sysadmin)
        } else if asserted(Self::Operator) {
            Some(Self::Operator)
        } else {
            None
        }
    }
}
