//! Provider JSON to outbound JSON

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Error;
use crate::providers::{gemini, openai};
use crate::ProviderKind;

/// Outbound body schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape
{   /// Provider JSON, unchanged
    #[default]
    Passthrough
  , /// `{ candidates: [ { content: { parts: [ { text } ] } } ] }`
    Candidates
  , /// `{ text }`
    Text
}

impl std::str::FromStr for ResponseShape
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "passthrough" | "raw" => Ok(ResponseShape::Passthrough)
          , "candidates" => Ok(ResponseShape::Candidates)
          , "text" => Ok(ResponseShape::Text)
          , other => Err(Error::InvalidConfiguration(
              format!("unknown response shape: {}", other)
            ))
        }
    }
}

/// Generated text in a provider body
pub fn extract_text(kind: ProviderKind, body: &Value) -> Option<String>
{   match kind
    {   ProviderKind::Gemini => gemini::extract_text(body)
      , ProviderKind::OpenAi => openai::extract_text(body)
    }
}

pub fn map_response(
  shape: ResponseShape
, kind: ProviderKind
, body: Value
) -> Result<Value, Error>
{   if shape == ResponseShape::Passthrough
    {   return Ok(body);
    }

    let text = extract_text(kind, &body)
      .ok_or(Error::NoTextInResponse)?;
    Ok(match shape
    {   ResponseShape::Text => json!({ "text": text })
      , _ => json!({
          "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    })
}
