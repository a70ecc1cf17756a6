use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde_json::Value;

use crate::gateways::{REGISTRATION_PATH, UPLOAD_PATH};

/// A file picked in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// JSON body posted to the registration gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub first_name: String,
    pub last_name: String,
    pub occupation: String,
    pub residence: String,
    pub file_url: String,
}

/// Status and decoded JSON body of a gateway response.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    pub status: u16,
    pub body: Value,
}

impl GatewayReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub(crate) fn text(&self, key: &str) -> Option<&str> {
        self.body
            .get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
    #[error("invalid gateway base URL: {0}")]
    BaseUrl(String),
}

/// Transport used by the form to reach the two gateways.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn upload_file(&self, file: &SelectedFile) -> Result<GatewayReply, ClientError>;
    async fn register(&self, payload: &RegistrationPayload) -> Result<GatewayReply, ClientError>;
}

/// Talks to a running gateway server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGatewayClient {
    base: Url,
    http: Client,
}

impl HttpGatewayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|err| ClientError::BaseUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }

        Ok(Self {
            base,
            http: Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|err| ClientError::BaseUrl(err.to_string()))
    }

    async fn decode(response: Response) -> Result<GatewayReply, ClientError> {
        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(GatewayReply { status, body })
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn upload_file(&self, file: &SelectedFile) -> Result<GatewayReply, ClientError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH)?)
            .multipart(form)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        Self::decode(response).await
    }

    async fn register(&self, payload: &RegistrationPayload) -> Result<GatewayReply, ClientError> {
        let response = self
            .http
            .post(self.endpoint(REGISTRATION_PATH)?)
            .json(payload)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        Self::decode(response).await
    }
}
