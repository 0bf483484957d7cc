use async_trait::async_trait;

use atlasgate_application::{AuditEvent, AuditRepository};
use atlasgate_core::AppResult;

/// Audit repository that discards events after logging them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditRepository;

#[async_trait]
impl AuditRepository for NoopAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        tracing::debug!(
            action = event.action.as_str(),
            subject = %event.subject,
            resource_id = %event.resource_id,
            "audit event discarded"
        );
        Ok(())
    }
}
