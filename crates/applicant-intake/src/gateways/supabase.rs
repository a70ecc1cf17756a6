use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;

use super::backend::{BackendError, SubmissionBackend};
use super::domain::ApplicantRecord;
use crate::config::BackendConfig;

/// HTTP client for a Supabase-compatible storage and PostgREST endpoint.
///
/// Storage writes authenticate with the service-role key; row inserts use the anon key.
pub struct SupabaseBackend {
    base: Url,
    anon_key: String,
    service_role_key: String,
    http: Client,
}

impl SupabaseBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.url)
            .map_err(|err| BackendError::Unavailable(format!("invalid SUPABASE_URL: {err}")))?;
        let http = Client::builder()
            .build()
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;

        Ok(Self {
            base,
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            http,
        })
    }

    fn url_for<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Option<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().ok()?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Some(url)
    }

    fn object_url(&self, bucket: &str, key: &str) -> Option<Url> {
        self.url_for(["storage", "v1", "object", bucket].into_iter().chain(key_segments(key)))
    }

    fn public_object_url(&self, bucket: &str, key: &str) -> Option<Url> {
        self.url_for(
            ["storage", "v1", "object", "public", bucket]
                .into_iter()
                .chain(key_segments(key)),
        )
    }

    fn table_url(&self, table: &str) -> Option<Url> {
        self.url_for(["rest", "v1", table])
    }

    async fn ensure_success(response: Response) -> Result<(), BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Rejected(upstream_message(status, &body)))
    }
}

impl std::fmt::Debug for SupabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseBackend")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// Keys are `{folder}/{file name}`. The file name travels as a single path segment, so a
/// `/`, `.` or `..` inside it is percent-encoded or kept instead of being resolved away.
fn key_segments(key: &str) -> Vec<&str> {
    match key.split_once('/') {
        Some((folder, name)) => vec![folder, name],
        None => vec![key],
    }
}

fn unreachable_endpoint() -> BackendError {
    BackendError::Unavailable("SUPABASE_URL cannot carry a request path".to_string())
}

/// Pick the human-readable message out of a storage or PostgREST error body.
pub(crate) fn upstream_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error", "msg"].iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| status.to_string())
}

#[async_trait]
impl SubmissionBackend for SupabaseBackend {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let url = self.object_url(bucket, key).ok_or_else(unreachable_endpoint)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;

        Self::ensure_success(response).await
    }

    fn resolve_public_url(&self, bucket: &str, key: &str) -> String {
        self.public_object_url(bucket, key)
            .map(String::from)
            .unwrap_or_default()
    }

    async fn insert_row(&self, table: &str, record: &ApplicantRecord) -> Result<(), BackendError> {
        let url = self.table_url(table).ok_or_else(unreachable_endpoint)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.anon_key)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;

        Self::ensure_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, Uri};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct Recorded {
        method: Method,
        path: String,
        headers: HeaderMap,
        body: Vec<u8>,
    }

    impl Recorded {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).and_then(|value| value.to_str().ok())
        }
    }

    /// Serves every request with `status` and `reply`, keeping a copy of what arrived.
    async fn recording_server(
        status: axum::http::StatusCode,
        reply: Value,
    ) -> (String, Arc<Mutex<Vec<Recorded>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let app = axum::Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let sink = Arc::clone(&sink);
                let reply = reply.clone();
                async move {
                    sink.lock().expect("recorder mutex").push(Recorded {
                        method,
                        path: uri.path().to_string(),
                        headers,
                        body: body.to_vec(),
                    });
                    (status, axum::Json(reply))
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind recorder");
        let addr = listener.local_addr().expect("recorder address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (format!("http://{addr}"), seen)
    }

    fn only_request(seen: &Arc<Mutex<Vec<Recorded>>>) -> Recorded {
        let seen = seen.lock().expect("recorder mutex");
        assert_eq!(seen.len(), 1, "expected exactly one request");
        seen[0].clone()
    }

    fn record() -> ApplicantRecord {
        ApplicantRecord {
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            occupation: "Engineer".to_string(),
            residence: "Springfield".to_string(),
            file_url: "https://project.supabase.co/storage/v1/object/public/pdf_files/pdfs/1-cv.pdf"
                .to_string(),
        }
    }

    fn backend(url: &str) -> SupabaseBackend {
        SupabaseBackend::new(&BackendConfig {
            url: url.to_string(),
            anon_key: "anon".to_string(),
            service_role_key: "service".to_string(),
        })
        .expect("client builds")
    }

    #[test]
    fn public_url_targets_requested_bucket() {
        let backend = backend("https://project.supabase.co");
        assert_eq!(
            backend.resolve_public_url("pdf_files", "pdfs/1700000000000-cv.pdf"),
            "https://project.supabase.co/storage/v1/object/public/pdf_files/pdfs/1700000000000-cv.pdf"
        );
    }

    #[test]
    fn public_url_encodes_file_names() {
        let backend = backend("https://project.supabase.co/");
        assert_eq!(
            backend.resolve_public_url("pdfs", "pdfs/1-my cv.pdf"),
            "https://project.supabase.co/storage/v1/object/public/pdfs/pdfs/1-my%20cv.pdf"
        );
    }

    #[test]
    fn public_url_is_empty_when_base_cannot_hold_a_path() {
        let backend = backend("mailto:ops@example.com");
        assert_eq!(backend.resolve_public_url("pdfs", "pdfs/1-cv.pdf"), "");
    }

    #[test]
    fn write_endpoints_follow_service_layout() {
        let backend = backend("https://project.supabase.co");
        assert_eq!(
            backend
                .object_url("pdfs", "pdfs/1-cv.pdf")
                .expect("object url")
                .as_str(),
            "https://project.supabase.co/storage/v1/object/pdfs/pdfs/1-cv.pdf"
        );
        assert_eq!(
            backend.table_url("users").expect("table url").as_str(),
            "https://project.supabase.co/rest/v1/users"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = SupabaseBackend::new(&BackendConfig {
            url: "not a url".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: "service".to_string(),
        })
        .expect_err("invalid url");
        assert!(err.to_string().starts_with("invalid SUPABASE_URL"));
    }

    #[test]
    fn upstream_message_prefers_message_field() {
        let body = r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#;
        assert_eq!(
            upstream_message(StatusCode::BAD_REQUEST, body),
            "new row violates row-level security policy"
        );
        assert_eq!(
            upstream_message(StatusCode::NOT_FOUND, r#"{"error":"Bucket not found"}"#),
            "Bucket not found"
        );
        assert_eq!(
            upstream_message(StatusCode::BAD_GATEWAY, "<html>"),
            "502 Bad Gateway"
        );
    }

    #[test]
    fn dot_segments_in_file_names_stay_part_of_the_key() {
        let backend = backend("https://project.supabase.co");
        assert_eq!(
            backend.resolve_public_url("pdfs", "pdfs/1-x/../../rest/v1/users"),
            "https://project.supabase.co/storage/v1/object/public/pdfs/pdfs/1-x%2F..%2F..%2Frest%2Fv1%2Fusers"
        );
        assert_eq!(
            backend
                .object_url("pdfs", "pdfs/1-x/../cv.pdf")
                .expect("object url")
                .as_str(),
            "https://project.supabase.co/storage/v1/object/pdfs/pdfs/1-x%2F..%2Fcv.pdf"
        );
    }

    #[tokio::test]
    async fn upload_sends_service_key_and_upsert() {
        let (base, seen) =
            recording_server(axum::http::StatusCode::OK, json!({ "Key": "pdfs/pdfs/1-cv.pdf" }))
                .await;

        backend(&base)
            .upload_object("pdfs", "pdfs/1-cv.pdf", b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .expect("upload accepted");

        let request = only_request(&seen);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/storage/v1/object/pdfs/pdfs/1-cv.pdf");
        assert_eq!(request.header("authorization"), Some("Bearer service"));
        assert_eq!(request.header("apikey"), Some("service"));
        assert_eq!(request.header("x-upsert"), Some("true"));
        assert_eq!(request.header("content-type"), Some("application/pdf"));
        assert_eq!(request.body, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn upload_path_keeps_dot_segments_encoded() {
        let (base, seen) = recording_server(axum::http::StatusCode::OK, json!({})).await;

        backend(&base)
            .upload_object("pdfs", "pdfs/1-x/../cv.pdf", Vec::new(), "application/pdf")
            .await
            .expect("upload accepted");

        assert_eq!(
            only_request(&seen).path,
            "/storage/v1/object/pdfs/pdfs/1-x%2F..%2Fcv.pdf"
        );
    }

    #[tokio::test]
    async fn insert_sends_anon_key_and_single_row_array() {
        let (base, seen) = recording_server(axum::http::StatusCode::CREATED, json!(null)).await;

        backend(&base)
            .insert_row("users", &record())
            .await
            .expect("insert accepted");

        let request = only_request(&seen);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/rest/v1/users");
        assert_eq!(request.header("authorization"), Some("Bearer anon"));
        assert_eq!(request.header("apikey"), Some("anon"));
        assert_eq!(request.header("prefer"), Some("return=minimal"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(&request.body).expect("json body");
        assert_eq!(
            body,
            json!([{
                "fname": "Ana",
                "Lname": "Lee",
                "Occupation": "Engineer",
                "residence": "Springfield",
                "file_url": "https://project.supabase.co/storage/v1/object/public/pdf_files/pdfs/1-cv.pdf",
            }])
        );
    }

    #[tokio::test]
    async fn rejected_insert_carries_upstream_message() {
        let (base, _seen) = recording_server(
            axum::http::StatusCode::UNAUTHORIZED,
            json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"users\"",
            }),
        )
        .await;

        let err = backend(&base)
            .insert_row("users", &record())
            .await
            .expect_err("insert refused");

        assert!(matches!(err, BackendError::Rejected(_)));
        assert_eq!(
            err.to_string(),
            "new row violates row-level security policy for table \"users\""
        );
    }

    #[tokio::test]
    async fn rejected_upload_carries_upstream_message() {
        let (base, _seen) = recording_server(
            axum::http::StatusCode::NOT_FOUND,
            json!({ "statusCode": "404", "error": "Not found", "message": "Bucket not found" }),
        )
        .await;

        let err = backend(&base)
            .upload_object("missing", "pdfs/1-cv.pdf", b"%PDF".to_vec(), "application/pdf")
            .await
            .expect_err("upload refused");

        assert_eq!(err.to_string(), "Bucket not found");
    }
}
