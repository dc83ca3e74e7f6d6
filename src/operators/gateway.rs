//! Operator gateway — create/update calls against the back-office API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{info, warn};

use super::encoder::{MultipartPayload, PayloadPart};
use super::model::Operator;
use crate::error::GatewayError;

/// Keys whose value is a top-level message rather than a field error.
const MESSAGE_KEYS: &[&str] = &["messUser", "message", "detail", "error"];

/// Persists operators on the server.
#[async_trait]
pub trait OperatorGateway: Send + Sync {
    /// Create a new operator.
    async fn create(&self, payload: MultipartPayload) -> Result<Operator, GatewayError>;

    /// Update the operator with the given id.
    async fn update(&self, id: i64, payload: MultipartPayload) -> Result<Operator, GatewayError>;
}

/// reqwest-backed [`OperatorGateway`].
pub struct HttpOperatorGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpOperatorGateway {
    /// Fails if the HTTP client cannot be built with `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        payload: MultipartPayload,
    ) -> Result<Operator, GatewayError> {
        let form = build_form(payload).await?;
        let mut request = request.multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = flatten_error_body(&body)
                .unwrap_or_else(|| format!("Request failed with status {status}"));
            warn!(status = status.as_u16(), %message, "Operator request rejected");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        parse_operator(&body)
    }
}

#[async_trait]
impl OperatorGateway for HttpOperatorGateway {
    async fn create(&self, payload: MultipartPayload) -> Result<Operator, GatewayError> {
        let op = self
            .send(self.client.post(self.url("operators/")), payload)
            .await?;
        info!(id_operator = op.id_operator, "Operator created");
        Ok(op)
    }

    async fn update(&self, id: i64, payload: MultipartPayload) -> Result<Operator, GatewayError> {
        let op = self
            .send(self.client.patch(self.url(&format!("operators/{id}/"))), payload)
            .await?;
        info!(id_operator = op.id_operator, "Operator updated");
        Ok(op)
    }
}

/// Turn an encoded payload into a reqwest form, reading local images from disk.
pub async fn build_form(payload: MultipartPayload) -> Result<Form, GatewayError> {
    let mut form = Form::new();
    for part in payload.parts {
        form = match part {
            PayloadPart::Text { name, value } => form.text(name, value),
            PayloadPart::File {
                name,
                uri,
                file_name,
                content_type,
            } => {
                let path = uri.strip_prefix("file://").unwrap_or(&uri);
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| GatewayError::ImageRead {
                        uri: uri.clone(),
                        reason: e.to_string(),
                    })?;
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&content_type)?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

/// Accept either a bare operator or one wrapped in `{"data": ...}`.
fn parse_operator(body: &str) -> Result<Operator, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
    let inner = match value.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => value,
    };
    serde_json::from_value(inner).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

/// Flatten a server error body into one display string.
///
/// A plain message is returned as-is. Field-keyed errors become one
/// `• field: message` line each, after the top-level message if present.
pub fn flatten_error_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => flatten_error_value(&value),
        Err(_) => Some(trimmed.to_string()),
    }
}

fn flatten_error_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => {
            let mut lines = Vec::new();
            if let Some(msg) = MESSAGE_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
            {
                lines.push(msg.to_string());
            }
            let fields = match map.get("errors") {
                Some(Value::Object(errors)) => errors,
                _ => map,
            };
            for (field, detail) in fields {
                if MESSAGE_KEYS.contains(&field.as_str()) || field == "errors" {
                    continue;
                }
                if let Some(text) = detail_text(detail) {
                    lines.push(format!("• {field}: {text}"));
                }
            }
            if lines.is_empty() { None } else { Some(lines.join("\n")) }
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(detail_text).collect();
            if parts.is_empty() { None } else { Some(parts.join("\n")) }
        }
        _ => None,
    }
}

/// Text of a single field's error detail.
pub(crate) fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(detail_text).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            if let Some(msg) = MESSAGE_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
            {
                return Some(msg.to_string());
            }
            let parts: Vec<String> = map
                .iter()
                .filter_map(|(field, v)| detail_text(v).map(|t| format!("{field}: {t}")))
                .collect();
            if parts.is_empty() { None } else { Some(parts.join("; ")) }
        }
        _ => None,
    }
}
