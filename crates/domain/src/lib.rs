//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod claims;
mod grant;
mod reconcile;
mod role;

pub use audit::AuditAction;
pub use claims::{ClaimValues, IdentityClaims};
pub use grant::{
    PermissionGrant, PermissionKind, database_permission_name, dataset_permission_name,
};
pub use reconcile::{RoleCatalog, reconcile_roles};
pub use role::{BASELINE_ROLE_NAME, ELEVATED_ROLE_NAME, PrivilegeLevel, Role};
