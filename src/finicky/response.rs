//! The `{ok, ...fields, error}` envelope handed back to the UI
//!
//! Result fields are flattened into the top-level object so the UI reads
//! `response.configPath` rather than `response.data.configPath`.

use serde::Serialize;

use super::error::{Error, ErrorKind};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl<T: Serialize> From<Result<T, Error>> for Response<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::failure(&err),
        }
    }
}
