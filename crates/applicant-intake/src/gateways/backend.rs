use async_trait::async_trait;

use super::domain::ApplicantRecord;

/// Narrow handle onto the managed storage/table service.
///
/// Built once at startup and shared by both gateways, so tests can swap in a fake.
#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    /// Write `bytes` under `key` in `bucket`, overwriting any existing object.
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;

    /// Public link for `key` in `bucket`. Empty when no link can be formed.
    fn resolve_public_url(&self, bucket: &str, key: &str) -> String;

    /// Insert one row into `table`.
    async fn insert_row(&self, table: &str, record: &ApplicantRecord) -> Result<(), BackendError>;
}

/// Failure reported by a backend call. The display text is the upstream message.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Unavailable(String),
}
