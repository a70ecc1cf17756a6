use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{info, warn};

use super::backend::SubmissionBackend;
use super::domain::{
    storage_key, UploadResponse, UploadedFile, DEFAULT_FILE_NAME, PDF_CONTENT_TYPE,
};
use super::service::{GatewayError, IntakeGateway};

const FILE_FIELD: &str = "file";

impl<B> IntakeGateway<B>
where
    B: SubmissionBackend + 'static,
{
    /// Validate, store and link one uploaded file.
    pub async fn upload(&self, file: Option<UploadedFile>) -> Result<UploadResponse, GatewayError> {
        let file = file.ok_or(GatewayError::NoFile)?;
        if !file.is_pdf() {
            return Err(GatewayError::NotPdf);
        }

        let key = storage_key(Utc::now(), &file.file_name);
        let size = file.bytes.len();

        self.backend
            .upload_object(
                &self.targets.upload_bucket,
                &key,
                file.bytes,
                PDF_CONTENT_TYPE,
            )
            .await
            .map_err(GatewayError::Storage)?;

        let file_url = self
            .backend
            .resolve_public_url(&self.targets.public_url_bucket, &key);
        if file_url.is_empty() {
            return Err(GatewayError::MissingPublicUrl);
        }

        info!(storage_key = %key, bytes = size, "stored applicant upload");

        Ok(UploadResponse {
            message: "File uploaded successfully!".to_string(),
            file_url,
        })
    }
}

/// Pull the first part named `file` out of the form, skipping any other parts.
pub(crate) async fn read_file_part(
    multipart: &mut Multipart,
) -> Result<Option<UploadedFile>, GatewayError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| GatewayError::Unexpected(err.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| GatewayError::Unexpected(err.body_text()))?;

        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}

pub(crate) async fn upload_file_handler<B>(
    State(gateway): State<Arc<IntakeGateway<B>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    B: SubmissionBackend + 'static,
{
    let result = match multipart {
        Ok(mut multipart) => match read_file_part(&mut multipart).await {
            Ok(file) => gateway.upload(file).await,
            Err(err) => Err(err),
        },
        Err(rejection) => Err(GatewayError::Unexpected(rejection.body_text())),
    };

    match result {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => {
            warn!(status = %err.status(), error = %err, "upload rejected");
            err.into_response()
        }
    }
}
