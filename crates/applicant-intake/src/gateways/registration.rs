use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use super::backend::SubmissionBackend;
use super::domain::{MessageResponse, RegistrationRequest};
use super::service::{GatewayError, IntakeGateway};

impl<B> IntakeGateway<B>
where
    B: SubmissionBackend + 'static,
{
    /// Insert one applicant row. Identical requests insert identical rows.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<MessageResponse, GatewayError> {
        let record = request.into_record().ok_or(GatewayError::MissingFields)?;

        self.backend
            .insert_row(&self.targets.applicant_table, &record)
            .await
            .map_err(GatewayError::Persistence)?;

        info!(table = %self.targets.applicant_table, "registered applicant");

        Ok(MessageResponse {
            message: "Submission saved successfully".to_string(),
        })
    }
}

pub(crate) async fn registration_handler<B>(
    State(gateway): State<Arc<IntakeGateway<B>>>,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    B: SubmissionBackend + 'static,
{
    // The body is JSON whatever the request's content type says.
    let result = match body {
        Ok(bytes) => match serde_json::from_slice::<RegistrationRequest>(&bytes) {
            Ok(request) => gateway.register(request).await,
            Err(err) => Err(GatewayError::InvalidBody(format!(
                "Failed to parse the request body as JSON: {err}"
            ))),
        },
        Err(rejection) => Err(GatewayError::InvalidBody(rejection.body_text())),
    };

    match result {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => {
            warn!(status = %err.status(), error = %err, "registration rejected");
            err.into_response()
        }
    }
}
