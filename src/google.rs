//! Pieces shared by the Google Cloud REST clients.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::blocking::Response;
use serde::Deserialize;

use crate::error::ShotmarkError;

/// The `google.rpc.Status` object carried in error payloads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Status {
    pub(crate) fn into_error(self, service: &'static str) -> ShotmarkError {
        ShotmarkError::ServiceError {
            service,
            status: u16::try_from(self.code).unwrap_or(0),
            message: self.message,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Status,
}

/// Encode request content the way the REST APIs expect binary fields.
pub(crate) fn encode_content(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Turn a non-success HTTP response into [`ShotmarkError::ServiceError`].
pub(crate) fn check_status(
    service: &'static str,
    response: Response,
) -> Result<Response, ShotmarkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);

    Err(ShotmarkError::ServiceError {
        service,
        status: status.as_u16(),
        message,
    })
}
