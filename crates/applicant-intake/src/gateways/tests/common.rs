use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::config::IntakeConfig;
use crate::gateways::backend::{BackendError, SubmissionBackend};
use crate::gateways::domain::ApplicantRecord;
use crate::gateways::memory::InMemoryBackend;
use crate::gateways::router::gateway_router;
use crate::gateways::service::IntakeGateway;

pub(super) const BOUNDARY: &str = "intake-test-boundary";

pub(super) fn targets() -> IntakeConfig {
    IntakeConfig::default()
}

pub(super) fn memory_router() -> (axum::Router, InMemoryBackend) {
    let backend = InMemoryBackend::with_public_base("https://cdn.example/storage");
    let gateway = IntakeGateway::new(Arc::new(backend.clone()), targets());
    (gateway_router(Arc::new(gateway)), backend)
}

pub(super) fn router_with<B>(backend: B) -> axum::Router
where
    B: SubmissionBackend + 'static,
{
    gateway_router(Arc::new(IntakeGateway::new(Arc::new(backend), targets())))
}

/// One multipart part: (field name, file name, content type, bytes).
pub(super) type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

pub(super) fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            ),
            None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::post("/api/uploadFile")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("upload request builds")
}

pub(super) fn pdf_upload(file_name: &str) -> Request<Body> {
    upload_request(&[(
        "file",
        Some(file_name),
        Some("application/pdf"),
        &b"%PDF-1.7\n%%EOF"[..],
    )])
}

pub(super) fn registration_payload() -> Value {
    json!({
        "firstName": "Ana",
        "lastName": "Lee",
        "occupation": "Engineer",
        "residence": "Springfield",
        "fileUrl": "https://cdn.example/storage/pdf_files/pdfs/1693000000000-cv.pdf",
    })
}

pub(super) fn registration_request(payload: &Value) -> Request<Body> {
    Request::post("/api/registration")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("payload serializes"),
        ))
        .expect("registration request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Storage writes fail with an upstream message.
pub(super) struct RejectingStorage;

#[async_trait]
impl SubmissionBackend for RejectingStorage {
    async fn upload_object(
        &self,
        _bucket: &str,
        _key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), BackendError> {
        Err(BackendError::Rejected("Bucket not found".to_string()))
    }

    fn resolve_public_url(&self, _bucket: &str, _key: &str) -> String {
        "https://cdn.example/unused".to_string()
    }

    async fn insert_row(
        &self,
        _table: &str,
        _record: &ApplicantRecord,
    ) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Uploads succeed but no public link can be formed; inserts fail.
pub(super) struct UnlinkedBackend;

#[async_trait]
impl SubmissionBackend for UnlinkedBackend {
    async fn upload_object(
        &self,
        _bucket: &str,
        _key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn resolve_public_url(&self, _bucket: &str, _key: &str) -> String {
        String::new()
    }

    async fn insert_row(
        &self,
        _table: &str,
        _record: &ApplicantRecord,
    ) -> Result<(), BackendError> {
        Err(BackendError::Rejected(
            "new row violates row-level security policy for table \"users\"".to_string(),
        ))
    }
}

pub(super) fn error_message(payload: &Value) -> Option<&str> {
    payload.get("error").and_then(Value::as_str)
}
