use std::str::FromStr;

use atlasgate_core::AppError;
use serde::{Deserialize, Serialize};

/// Permission kinds a system role can be granted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    /// Allows querying a database connection.
    DatabaseAccess,
    /// Allows querying a single dataset.
    DatasourceAccess,
}

impl PermissionKind {
    /// Returns a stable storage value for this permission kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseAccess => "database_access",
            Self::DatasourceAccess => "datasource_access",
        }
    }
}

impl FromStr for PermissionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "database_access" => Ok(Self::DatabaseAccess),
            "datasource_access" => Ok(Self::DatasourceAccess),
            _ => Err(AppError::Validation(format!(
                "unknown permission kind '{value}'"
            ))),
        }
    }
}

/// A permission kind scoped to one named resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGrant {
    kind: PermissionKind,
    resource: String,
}

impl PermissionGrant {
    /// Creates a grant for the given resource permission name.
    #[must_use]
    pub fn new(kind: PermissionKind, resource: impl Into<String>) -> Self {
        Self {
            kind,
            resource: resource.into(),
        }
    }

    /// Returns the permission kind.
    #[must_use]
    pub fn kind(&self) -> PermissionKind {
        self.kind
    }

    /// Returns the resource permission name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }
}

/// Permission name of a database connection, e.g. `[examples].(id:1)`.
#[must_use]
pub fn database_permission_name(database_name: &str, database_id: i64) -> String {
    format!("[{database_name}].(id:{database_id})")
}

/// Permission name of a dataset, e.g. `[examples].[birth_names](id:7)`.
#[must_use]
pub fn dataset_permission_name(database_name: &str, table_name: &str, dataset_id: i64) -> String {
    format!("[{database_name}].[{table_name}](id:{dataset_id})")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{PermissionKind, database_permission_name, dataset_permission_name};

    #[test]
    fn permission_kind_roundtrip_storage_value() {
        let kind = PermissionKind::DatasourceAccess;
        let restored = PermissionKind::from_str(kind.as_str());
        assert_eq!(restored.ok(), Some(kind));
    }

    #[test]
    fn unknown_permission_kind_is_rejected() {
        assert!(PermissionKind::from_str("schema_access").is_err());
    }

    #[test]
    fn permission_names_follow_resource_format() {
        assert_eq!(database_permission_name("warehouse", 4), "[warehouse].(id:4)");
        assert_eq!(
            dataset_permission_name("warehouse", "orders", 12),
            "[warehouse].[orders](id:12)"
        );
    }
}
