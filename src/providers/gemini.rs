use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use log::trace;

use crate::error::Error;
use crate::request::PromptRequest;

use super::ListedModel;

pub const API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   pub text: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , #[serde(flatten)]
    pub passthrough: Map<String, Value>
}

impl GenerateContentRequest
{   pub fn new(request: &PromptRequest) -> Self
    {   GenerateContentRequest
        {   contents: vec![
              Content
              {   parts: vec![Part { text: request.prompt.clone() }]
              }
            ]
          , passthrough: request.passthrough.clone()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiModelsResponse
{   #[serde(default)]
    pub models: Vec<ModelData>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelData
{   pub name: String
  , #[serde(default)]
    pub supported_generation_methods: Vec<String>
}

// ===== Requests =====

/// Header carrying the API key, so it never lands in a URL
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Resource path of `model`. Bare ids live under `models/`; full
/// resource names such as `tunedModels/custom` are used as is.
pub fn model_path(model: &str) -> String
{   if model.contains('/')
    {   model.to_string()
    } else
    {   format!("models/{}", model)
    }
}

pub fn generate_request(
  http_client: &reqwest::Client
, api_base: &str
, api_key: &str
, model: &str
, request: &PromptRequest
) -> reqwest::RequestBuilder
{   let payload = GenerateContentRequest::new(request);
    trace!("Gemini request: {:?}", payload);

    http_client
      .post(format!("{}/{}:generateContent", api_base, model_path(model)))
      .header(API_KEY_HEADER, api_key)
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
      .header(API_KEY_HEADER, api_key)
}

// ===== Responses =====

/// Listed models with their `models/` prefix stripped
pub fn parse_models(body: Value) -> Result<Vec<ListedModel>, Error>
{   let listing: GeminiModelsResponse = serde_json::from_value(body)
      .map_err(|e| Error::ParseError(e.to_string()))?;

    Ok(listing.models
      .into_iter()
      .map(|m| ListedModel
        {   name: m.name
              .strip_prefix("models/")
              .map(str::to_string)
              .unwrap_or(m.name.clone())
          , capabilities: m.supported_generation_methods
        })
      .collect())
}

/// All text parts of the first candidate, concatenated
pub fn extract_text(body: &Value) -> Option<String>
{   let parts = body
      .pointer("/candidates/0/content/parts")?
      .as_array()?;
    let text: String = parts
      .iter()
      .filter_map(|p| p.get("text").and_then(Value::as_str))
      .collect();
    if text.is_empty() { None } else { Some(text) }
}
