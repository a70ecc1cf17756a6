//! HTTP gateways for the two-step applicant submission.
//!
//! `POST /api/uploadFile` stores a PDF and answers with its public link;
//! `POST /api/registration` inserts the applicant row that references it. Both
//! delegate to a [`SubmissionBackend`] injected at startup.

pub mod backend;
pub mod domain;
pub mod memory;
pub(crate) mod registration;
pub mod router;
pub mod service;
pub(crate) mod storage;
pub mod supabase;

#[cfg(test)]
mod tests;

pub use backend::{BackendError, SubmissionBackend};
pub use domain::{
    storage_key, ApplicantRecord, MessageResponse, RegistrationRequest, UploadResponse,
    UploadedFile, PDF_CONTENT_TYPE,
};
pub use memory::{InMemoryBackend, StoredObject};
pub use router::{gateway_router, REGISTRATION_PATH, UPLOAD_PATH};
pub use service::{GatewayError, IntakeGateway};
pub use supabase::SupabaseBackend;
