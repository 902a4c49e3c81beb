//! Error type for relay invocations and its HTTP rendering
//!
//! Every failure branch ends up here and leaves the handler as a
//! `{ "error": ..., "details": ... }` JSON body.

use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// One failed candidate of a fallback sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt
{   pub model: String
  , pub status: u16
  , pub message: String
}

/// Outbound error envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody
{   pub error: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>
}

/// Custom error type for relay operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error
{   /// Anything but POST (or OPTIONS for pre-flight)
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String)
  , /// Body exceeds the server's size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String)
  , /// Body is not parseable JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(String)
  , /// Body is JSON but not a usable prompt request
    #[error("Invalid request: {0}")]
    InvalidRequest(String)
  , /// Credential is missing; holds the variable name
    #[error("Missing API key: {0} is not set")]
    MissingApiKey(String)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Transport failure on the outbound call
    #[error("HTTP error: {0}")]
    HttpError(String)
  , /// Provider answered with something that is not JSON
    #[error("Parse error: {0}")]
    ParseError(String)
  , /// Provider returned a failure status or an error object
    #[error("API error ({status}): {message}")]
    ApiError
    {   status: u16
      , message: String
      , details: Option<Value>
    }
  , /// Listing models failed or nothing matched
    #[error("Model discovery failed: {0}")]
    Discovery(String)
  , /// Provider reply carried no generated text
    #[error("API response contained no text")]
    NoTextInResponse
  , /// Every candidate of the fallback sequence failed
    #[error("All candidate models failed: {last}")]
    Exhausted
    {   last: Box<Error>
      , attempts: Vec<Attempt>
    }
}

impl Error
{   /// HTTP status this error is answered with
    pub fn status(&self) -> StatusCode
    {   match self
        {   Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED
          , Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE
          , Error::InvalidJson(_)
          | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST
          , Error::ApiError { status, .. } => {
              StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
          , Error::Exhausted { last, .. } => last.status()
          , Error::MissingApiKey(_)
          | Error::InvalidConfiguration(_)
          | Error::HttpError(_)
          | Error::ParseError(_)
          | Error::Discovery(_)
          | Error::NoTextInResponse => {
              StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Summary of this error as a fallback attempt against `model`
    pub fn attempt(&self, model: &str) -> Attempt
    {   Attempt
        {   model: model.to_string()
          , status: self.status().as_u16()
          , message: self.to_string()
        }
    }

    /// JSON envelope sent back to the caller
    pub fn body(&self) -> ErrorBody
    {   match self
        {   Error::MethodNotAllowed(method) => ErrorBody
            {   error: "Method Not Allowed".to_string()
              , details: Some(json!(
                  format!("{} is not supported, use POST", method)
                ))
            }
          , Error::PayloadTooLarge(msg) => ErrorBody
            {   error: "Payload Too Large".to_string()
              , details: Some(json!(msg))
            }
          , Error::InvalidJson(msg) => ErrorBody
            {   error: "Invalid JSON".to_string()
              , details: Some(json!(msg))
            }
          , Error::InvalidRequest(msg) => ErrorBody
            {   error: msg.clone()
              , details: None
            }
          , Error::MissingApiKey(var) => ErrorBody
            {   error: "Server configuration error: API key missing"
                  .to_string()
              , details: Some(json!(format!("{} is not set", var)))
            }
          , Error::InvalidConfiguration(msg) => ErrorBody
            {   error: "Server configuration error".to_string()
              , details: Some(json!(msg))
            }
          , Error::HttpError(msg) => ErrorBody
            {   error: "Failed to connect to provider".to_string()
              , details: Some(json!(msg))
            }
          , Error::ParseError(msg) => ErrorBody
            {   error: "Invalid response from provider".to_string()
              , details: Some(json!(msg))
            }
          , Error::ApiError { message, details, .. } => ErrorBody
            {   error: format!("Provider error: {}", message)
              , details: details.clone()
            }
          , Error::Discovery(msg) => ErrorBody
            {   error: "Model discovery failed".to_string()
              , details: Some(json!(msg))
            }
          , Error::NoTextInResponse => ErrorBody
            {   error: "Provider response contained no text".to_string()
              , details: None
            }
          , Error::Exhausted { last, attempts } => {
              let last_body = last.body();
              ErrorBody
              {   error: format!(
                    "All candidate models failed: {}",
                    last_body.error
                  )
                , details: Some(json!({
                    "attempts": attempts
                  , "last": last_body.details
                  }))
              }
            }
        }
    }
}

impl From<BytesRejection> for Error
{   fn from(rejection: BytesRejection) -> Self
    {   if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE
        {   Error::PayloadTooLarge(rejection.body_text())
        } else
        {   Error::InvalidRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for Error
{   fn into_response(self) -> Response
    {   let status = self.status();
        let mut response
          = (status, Json(self.body())).into_response();
        if let Error::MethodNotAllowed(_) = self
        {   response.headers_mut().insert(
              header::ALLOW
            , HeaderValue::from_static("POST, OPTIONS")
            );
        }
        response
    }
}
