//! Best-effort delivery of violations to the audit-log collaborator.
//!
//! Reporting is fire-and-forget: delivery runs on its own task, failures
//! are logged and discarded, and the sampler's next tick is never blocked.
//! The assessment continues even when the audit trail temporarily cannot.

use std::sync::Arc;

use async_trait::async_trait;
use proctor_types::Violation;
use tracing::{debug, warn};

use crate::error::{MonitorError, MonitorResult};

/// Outbound channel to the proctoring-log collaborator.
#[async_trait]
pub trait ViolationReporter: Send + Sync {
    /// Deliver one violation. There is no response contract beyond
    /// "accepted or ignored".
    async fn report(&self, violation: &Violation) -> MonitorResult<()>;
}

/// Spawn delivery of one violation without awaiting it.
///
/// Errors never reach ledger state; they are logged at warn and dropped.
pub(crate) fn dispatch(reporter: Arc<dyn ViolationReporter>, violation: Violation) {
    tokio::spawn(async move {
        match reporter.report(&violation).await {
            Ok(()) => debug!(kind = %violation.kind, "Violation reported"),
            Err(error) => warn!(
                kind = %violation.kind,
                session_id = %violation.session_id,
                %error,
                "Violation report dropped"
            ),
        }
    });
}

/// Reporter that POSTs audit records as JSON.
pub struct HttpAuditReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuditReporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ViolationReporter for HttpAuditReporter {
    async fn report(&self, violation: &Violation) -> MonitorResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&violation.audit_record())
            .send()
            .await
            .map_err(|e| MonitorError::ReportDeliveryFailed {
                reason: e.to_string(),
            })?;

        response
            .error_for_status()
            .map_err(|e| MonitorError::ReportDeliveryFailed {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
