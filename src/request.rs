//! Inbound request validation

use axum::http::Method;
use serde_json::{Map, Value};

use crate::error::Error;

/// Top-level request fields forwarded to the provider untouched
pub const PASSTHROUGH_FIELDS: &[&str] = &[
  "generationConfig"
, "safetySettings"
, "systemInstruction"
];

/// A validated prompt request
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest
{   /// The prompt text, never blank
    pub prompt: String
  , /// Allow-listed extra fields from the inbound body
    pub passthrough: Map<String, Value>
}

impl PromptRequest
{   /// Parse and validate a raw request body
    pub fn from_body(body: &[u8]) -> Result<Self, Error>
    {   let value: Value = serde_json::from_slice(body)
          .map_err(|e| Error::InvalidJson(e.to_string()))?;

        let Value::Object(mut fields) = value else
        {   return Err(Error::InvalidRequest(
              "Request body must be a JSON object".to_string()
            ));
        };

        let prompt = match fields.remove("prompt")
        {   Some(Value::String(prompt)) if !prompt.trim().is_empty() => {
              prompt
            }
          , Some(Value::String(_)) => {
              return Err(Error::InvalidRequest(
                "Prompt must not be empty".to_string()
              ));
            }
          , Some(Value::Null) | None => {
              return Err(Error::InvalidRequest(
                "Missing prompt".to_string()
              ));
            }
          , Some(_) => {
              return Err(Error::InvalidRequest(
                "Prompt must be a string".to_string()
              ));
            }
        };

        let passthrough = fields
          .into_iter()
          .filter(|(key, _)| PASSTHROUGH_FIELDS.contains(&key.as_str()))
          .collect();

        Ok(PromptRequest { prompt, passthrough })
    }
}

/// Reject every method but POST. OPTIONS is answered before this is
/// reached.
pub fn check_method(method: &Method) -> Result<(), Error>
{   if *method == Method::POST
    {   Ok(())
    } else
    {   Err(Error::MethodNotAllowed(method.to_string()))
    }
}
