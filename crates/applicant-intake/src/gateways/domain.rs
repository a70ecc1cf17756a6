use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only content type the storage gateway accepts.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Folder prefix for every stored upload.
pub const STORAGE_PREFIX: &str = "pdfs";

/// Name used when a multipart part carries no file name.
pub const DEFAULT_FILE_NAME: &str = "blob";

/// Body accepted by the registration gateway.
///
/// Every field is optional on the wire so that a missing key and an empty value
/// are both reported as a validation failure rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl RegistrationRequest {
    /// Promote the request into a record, or `None` when any field is absent or empty.
    pub fn into_record(self) -> Option<ApplicantRecord> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|value| !value.is_empty())
        }

        Some(ApplicantRecord {
            first_name: present(self.first_name)?,
            last_name: present(self.last_name)?,
            occupation: present(self.occupation)?,
            residence: present(self.residence)?,
            file_url: present(self.file_url)?,
        })
    }
}

/// One applicant row, serialized with the table's column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    #[serde(rename = "fname")]
    pub first_name: String,
    #[serde(rename = "Lname")]
    pub last_name: String,
    #[serde(rename = "Occupation")]
    pub occupation: String,
    pub residence: String,
    pub file_url: String,
}

/// A file part pulled out of an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some(PDF_CONTENT_TYPE)
    }
}

/// Build the storage key `pdfs/<epoch-millis>-<file name>`.
pub fn storage_key(uploaded_at: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "{STORAGE_PREFIX}/{}-{file_name}",
        uploaded_at.timestamp_millis()
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
