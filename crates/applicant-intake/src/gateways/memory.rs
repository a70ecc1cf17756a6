use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::backend::{BackendError, SubmissionBackend};
use super::domain::ApplicantRecord;

const DEFAULT_PUBLIC_BASE: &str = "memory://public";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Process-local stand-in for the managed backend, used by `serve --in-memory` and tests.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    public_base: String,
    objects: Arc<Mutex<BTreeMap<(String, String), StoredObject>>>,
    rows: Arc<Mutex<BTreeMap<String, Vec<ApplicantRecord>>>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::with_public_base(DEFAULT_PUBLIC_BASE)
    }
}

impl InMemoryBackend {
    /// Public links are formed as `<base>/<bucket>/<key>`; an empty base yields empty links.
    pub fn with_public_base(public_base: impl Into<String>) -> Self {
        Self {
            public_base: public_base.into(),
            objects: Arc::default(),
            rows: Arc::default(),
        }
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .ok()?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys stored in `bucket`, in lexical order.
    pub fn object_keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| {
                objects
                    .keys()
                    .filter(|(stored_bucket, _)| stored_bucket == bucket)
                    .map(|(_, key)| key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn rows(&self, table: &str) -> Vec<ApplicantRecord> {
        self.rows
            .lock()
            .ok()
            .and_then(|rows| rows.get(table).cloned())
            .unwrap_or_default()
    }
}

fn poisoned() -> BackendError {
    BackendError::Unavailable("in-memory backend lock poisoned".to_string())
}

#[async_trait]
impl SubmissionBackend for InMemoryBackend {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let mut objects = self.objects.lock().map_err(|_| poisoned())?;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    fn resolve_public_url(&self, bucket: &str, key: &str) -> String {
        if self.public_base.is_empty() {
            return String::new();
        }
        format!("{}/{bucket}/{key}", self.public_base.trim_end_matches('/'))
    }

    async fn insert_row(&self, table: &str, record: &ApplicantRecord) -> Result<(), BackendError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        rows.entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}
