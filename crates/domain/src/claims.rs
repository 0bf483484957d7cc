use atlasgate_core::{AppError, AppResult};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::PrivilegeLevel;

/// Claim values normalized to a sequence.
///
/// Providers send multi-valued claims as a bare string when only one value is
/// present. Both shapes deserialize into the same list; `null` and absent
/// claims are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimValues(Vec<String>);

impl ClaimValues {
    /// Returns the claim values in provider order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        self.0.as_slice()
    }
}

impl<'de> Deserialize<'de> for ClaimValues {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawClaim {
            Single(String),
            Multiple(Vec<String>),
        }

        Ok(match Option::<RawClaim>::deserialize(deserializer)? {
            None => Self::default(),
            Some(RawClaim::Single(value)) => Self(vec![value]),
            Some(RawClaim::Multiple(values)) => Self(values),
        })
    }
}

/// Identity claims returned by the provider's user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    #[serde(rename = "sub")]
    subject: String,
    email: String,
    name: String,
    #[serde(default, rename = "role")]
    privileges: ClaimValues,
    #[serde(default, rename = "system")]
    systems: ClaimValues,
}

impl IdentityClaims {
    /// Parses and validates a user-info document.
    pub fn from_document(document: Value) -> AppResult<Self> {
        let claims = serde_json::from_value::<Self>(document)
            .map_err(|error| AppError::Validation(format!("malformed identity claims: {error}")))?;

        for (claim, value) in [
            ("sub", claims.subject.as_str()),
            ("email", claims.email.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "identity claim '{claim}' must not be empty"
                )));
            }
        }

        Ok(claims)
    }

    /// Returns the provider subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the asserted email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the asserted display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the asserted privilege levels (`role` claim).
    #[must_use]
    pub fn privileges(&self) -> &ClaimValues {
        &self.privileges
    }

    /// Returns the asserted system affiliations (`system` claim).
    #[must_use]
    pub fn systems(&self) -> &ClaimValues {
        &self.systems
    }

    /// Returns the effective privilege level, if a recognized one is asserted.
    #[must_use]
    pub fn privilege_level(&self) -> Option<PrivilegeLevel> {
        PrivilegeLevel::from_claims(self.privileges.as_slice())
    }
}
