//! Client side of the submission: upload the PDF, then register the applicant.
//!
//! The two calls are strictly sequential and not atomic. When registration fails
//! after a successful upload the stored file is left behind, and the report says so.

pub mod client;

pub use client::{
    ClientError, GatewayClient, GatewayReply, HttpGatewayClient, RegistrationPayload,
    SelectedFile,
};

use tracing::debug;

pub const UPLOADING: &str = "Uploading file...";
pub const REGISTERING: &str = "File uploaded. Registering user data...";
pub const MISSING_FILE: &str = "Please select a file to upload.";
const UPLOAD_FAILED: &str = "File upload failed.";
const REGISTRATION_FAILED: &str = "Registration failed.";
const REGISTRATION_COMPLETED: &str = "Registration completed successfully!";

/// Values currently held by the form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicantForm {
    pub first_name: String,
    pub last_name: String,
    pub occupation: String,
    pub residence: String,
    pub file: Option<SelectedFile>,
}

/// How the form reports results to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackMode {
    /// Progress and results are shown as a message under the form.
    Inline,
    /// Failures raise a blocking alert; success navigates to `success_route`.
    AlertAndNavigate { success_route: String },
}

impl Default for FeedbackMode {
    fn default() -> Self {
        Self::Inline
    }
}

/// What the user ends up seeing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Inline(String),
    Alert(String),
    Navigate(String),
}

/// Where the two-step sequence stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    MissingFile,
    UploadFailed,
    /// The upload succeeded, so `orphaned_file_url` now has no applicant row.
    RegistrationFailed { orphaned_file_url: String },
    Completed { file_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Inline progress messages in the order they were shown.
    pub progress: Vec<String>,
    pub feedback: Feedback,
    pub outcome: SubmissionOutcome,
}

impl SubmissionReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, SubmissionOutcome::Completed { .. })
    }
}

/// Drives one form submission through a [`GatewayClient`].
pub struct SubmissionForm<C> {
    client: C,
    mode: FeedbackMode,
}

impl<C> SubmissionForm<C>
where
    C: GatewayClient,
{
    pub fn new(client: C, mode: FeedbackMode) -> Self {
        Self { client, mode }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn submit(&self, form: &ApplicantForm) -> SubmissionReport {
        let mut progress = Vec::new();
        if self.mode == FeedbackMode::Inline {
            progress.push(UPLOADING.to_string());
        }

        let Some(file) = form.file.as_ref() else {
            return self.finish(
                progress,
                self.notice(MISSING_FILE),
                SubmissionOutcome::MissingFile,
            );
        };

        let upload = match self.client.upload_file(file).await {
            Ok(reply) if reply.is_success() => reply,
            Ok(reply) => {
                let message = failure_message(&reply, UPLOAD_FAILED);
                return self.finish(
                    progress,
                    self.failure(message),
                    SubmissionOutcome::UploadFailed,
                );
            }
            Err(err) => {
                return self.finish(
                    progress,
                    self.failure(err.to_string()),
                    SubmissionOutcome::UploadFailed,
                );
            }
        };

        let file_url = upload.text("fileUrl").unwrap_or_default().to_string();
        if self.mode == FeedbackMode::Inline {
            progress.push(REGISTERING.to_string());
        }
        debug!(%file_url, "upload accepted, registering applicant");

        let payload = RegistrationPayload {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            occupation: form.occupation.clone(),
            residence: form.residence.clone(),
            file_url: file_url.clone(),
        };

        let orphaned = || SubmissionOutcome::RegistrationFailed {
            orphaned_file_url: file_url.clone(),
        };

        match self.client.register(&payload).await {
            Ok(reply) if reply.is_success() => {
                let feedback = match &self.mode {
                    FeedbackMode::Inline => Feedback::Inline(
                        reply
                            .text("message")
                            .unwrap_or(REGISTRATION_COMPLETED)
                            .to_string(),
                    ),
                    FeedbackMode::AlertAndNavigate { success_route } => {
                        Feedback::Navigate(success_route.clone())
                    }
                };
                let outcome = SubmissionOutcome::Completed {
                    file_url: file_url.clone(),
                };
                self.finish(progress, feedback, outcome)
            }
            Ok(reply) => {
                let message = failure_message(&reply, REGISTRATION_FAILED);
                self.finish(progress, self.failure(message), orphaned())
            }
            Err(err) => self.finish(progress, self.failure(err.to_string()), orphaned()),
        }
    }

    fn notice(&self, message: &str) -> Feedback {
        match self.mode {
            FeedbackMode::Inline => Feedback::Inline(message.to_string()),
            FeedbackMode::AlertAndNavigate { .. } => Feedback::Alert(message.to_string()),
        }
    }

    fn failure(&self, message: String) -> Feedback {
        match self.mode {
            FeedbackMode::Inline => Feedback::Inline(format!("Error: {message}")),
            FeedbackMode::AlertAndNavigate { .. } => Feedback::Alert(message),
        }
    }

    fn finish(
        &self,
        mut progress: Vec<String>,
        feedback: Feedback,
        outcome: SubmissionOutcome,
    ) -> SubmissionReport {
        if let Feedback::Inline(message) = &feedback {
            progress.push(message.clone());
        }
        SubmissionReport {
            progress,
            feedback,
            outcome,
        }
    }
}

fn failure_message(reply: &GatewayReply, fallback: &str) -> String {
    reply
        .text("error")
        .or_else(|| reply.text("message"))
        .unwrap_or(fallback)
        .to_string()
}
