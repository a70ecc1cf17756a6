use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use super::backend::SubmissionBackend;
use super::registration::registration_handler;
use super::service::IntakeGateway;
use super::storage::upload_file_handler;

pub const UPLOAD_PATH: &str = "/api/uploadFile";
pub const REGISTRATION_PATH: &str = "/api/registration";

/// Router exposing the storage and registration gateways.
pub fn gateway_router<B>(gateway: Arc<IntakeGateway<B>>) -> Router
where
    B: SubmissionBackend + 'static,
{
    let body_limit = gateway.targets().max_upload_bytes;

    Router::new()
        .route(UPLOAD_PATH, post(upload_file_handler::<B>))
        .route(REGISTRATION_PATH, post(registration_handler::<B>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(gateway)
}
