//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_security_repository;
mod noop_audit_repository;
mod oidc_identity_provider;
mod postgres_account_directory;
mod postgres_audit_repository;
mod postgres_system_role_repository;

pub use in_memory_security_repository::InMemorySecurityRepository;
pub use noop_audit_repository::NoopAuditRepository;
pub use oidc_identity_provider::{OidcIdentityProvider, OidcSettings};
pub use postgres_account_directory::PostgresAccountDirectory;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_system_role_repository::PostgresSystemRoleRepository;
