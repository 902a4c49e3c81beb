use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::trace;

use crate::error::Error;
use crate::request::PromptRequest;

use super::ListedModel;

pub const API_BASE: &str
  = "https://api.openai.com/v1";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
}

impl ChatRequest
{   /// Single user message; `generationConfig` passthrough maps onto
    /// the sampling knobs this API shares with Gemini.
    pub fn new(model: &str, request: &PromptRequest) -> Self
    {   let generation = request.passthrough.get("generationConfig");
        ChatRequest
        {   model: model.to_string()
          , messages: vec![
              ChatMessage
              {   role: "user".to_string()
                , content: request.prompt.clone()
              }
            ]
          , max_tokens: generation
              .and_then(|g| g.get("maxOutputTokens"))
              .and_then(Value::as_u64)
          , temperature: generation
              .and_then(|g| g.get("temperature"))
              .and_then(Value::as_f64)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse
{   #[serde(default)]
    pub data: Vec<ModelData>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelData
{   pub id: String
}

// ===== Requests =====

pub fn generate_request(
  http_client: &reqwest::Client
, api_base: &str
, api_key: &str
, model: &str
, request: &PromptRequest
) -> reqwest::RequestBuilder
{   let payload = ChatRequest::new(model, request);
    trace!("Chat request: {:?}", payload);

    http_client
      .post(format!("{}/chat/completions", api_base))
      .bearer_auth(api_key)
      .header("Content-Type", "application/json")
      .json(&payload)
}

pub fn list_models_request(
  http_client: &reqwest::Client
, api_base: &str
, api_key: &str
) -> reqwest::RequestBuilder
{   http_client
      .get(format!("{}/models", api_base))
      .bearer_auth(api_key)
}

// ===== Responses =====

/// Listed models; this API reports no capabilities
pub fn parse_models(body: Value) -> Result<Vec<ListedModel>, Error>
{   let listing: ModelsResponse = serde_json::from_value(body)
      .map_err(|e| Error::ParseError(e.to_string()))?;

    Ok(listing.data
      .into_iter()
      .map(|m| ListedModel
        {   name: m.id
          , capabilities: Vec::new()
        })
      .collect())
}

pub fn extract_text(body: &Value) -> Option<String>
{   body
      .pointer("/choices/0/message/content")
      .and_then(Value::as_str)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
}
