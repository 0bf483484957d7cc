use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an external login establishes a session.
    AuthLoginSucceeded,
    /// Emitted when an external login is turned away.
    AuthLoginRejected,
    /// Emitted when a session is closed through the provider sign-out flow.
    AuthLogout,
    /// Emitted when a system role and its grants are provisioned.
    SecuritySystemRoleProvisioned,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthLoginSucceeded => "auth.login.succeeded",
            Self::AuthLoginRejected => "auth.login.rejected",
            Self::AuthLogout => "auth.logout",
            Self::SecuritySystemRoleProvisioned => "security.system_role.provisioned",
        }
    }
}
