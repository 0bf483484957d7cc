use serde::{Deserialize, Serialize};

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: i64,
    subject: String,
    display_name: String,
    email: String,
}

impl UserIdentity {
    /// Creates a user identity from the local account and the provider subject.
    #[must_use]
    pub fn new(
        user_id: i64,
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            subject: subject.into(),
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    /// Returns the local account identifier.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email the local account is keyed on.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}
