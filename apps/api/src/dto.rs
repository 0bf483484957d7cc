mod common;
mod security;

pub use common::{CsrfTokenResponse, HealthResponse, MessageResponse};
pub use security::AddSystemRoleRequest;
