//! Application services and ports.

#![forbid(unsafe_code)]

mod account_ports;
mod audit_ports;
mod authorization_service;
mod csrf_token;
mod identity_ports;
mod sso_login_service;
mod system_role_ports;
mod system_role_service;

pub use account_ports::{AccountDirectory, NewUserAccount, UserAccount};
pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::AuthorizationService;
pub use csrf_token::generate_csrf_token;
pub use identity_ports::{AuthorizationRequest, IdentityProvider};
pub use sso_login_service::{LoginCallback, LoginFailure, LoginOutcome, SsoLoginService};
pub use system_role_ports::{AddSystemRoleInput, ProvisionedSystemRole, SystemRoleRepository};
pub use system_role_service::SystemRoleService;
