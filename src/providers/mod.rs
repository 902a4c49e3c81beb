//! Outbound provider invokers
//!
//! One [`ProviderClient`] is built per router and shared by every
//! invocation. It only holds the HTTP connection pool and the
//! provider's base URL, so nothing learned in one invocation leaks
//! into the next.

pub mod gemini;
pub mod openai;

use std::time::Duration;

use log::{debug, error, trace};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::PromptRequest;
use crate::ProviderKind;

/// Raw result of one outbound generate call
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply
{   /// Model the call was made against
    pub model: String
  , /// Provider HTTP status
    pub status: u16
  , /// Parsed provider body. A non-JSON error body is kept as a
    /// string.
    pub body: Value
}

impl ProviderReply
{   /// 2xx status and no `error` object in the body
    pub fn is_success(&self) -> bool
    {   (200..300).contains(&self.status)
          && self.body.get("error").map_or(true, Value::is_null)
    }

    /// Turn a failed reply into [`Error::ApiError`]
    pub fn into_result(self) -> Result<ProviderReply, Error>
    {   if self.is_success()
        {   return Ok(self);
        }

        let error = self.body.get("error").filter(|e| !e.is_null());
        let code = error
          .and_then(|e| e.get("code"))
          .and_then(Value::as_u64)
          .and_then(|c| u16::try_from(c).ok())
          .filter(|c| (400..600).contains(c));
        let status = match code
        {   Some(code) => code
          , None if !(200..300).contains(&self.status) => self.status
          , None => 500
        };

        let message = error
          .and_then(|e| {
            e.get("message")
              .and_then(Value::as_str)
              .or_else(|| e.as_str())
          })
          .or_else(|| self.body.as_str().filter(|s| !s.is_empty()))
          .map(str::to_string)
          .unwrap_or_else(|| {
            axum::http::StatusCode::from_u16(status)
              .ok()
              .and_then(|s| s.canonical_reason())
              .unwrap_or("Unknown error")
              .to_string()
          });

        error!(
          "Provider error from model {} ({}): {}",
          self.model, status, message
        );
        Err(Error::ApiError
        {   status
          , message
          , details: error.cloned()
        })
    }
}

/// A model as reported by the provider's model listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedModel
{   /// Identifier usable in a generate call
    pub name: String
  , /// Generation methods the model advertises, if the provider
    /// reports them
    pub capabilities: Vec<String>
}

impl ListedModel
{   pub fn supports(&self, capability: &str) -> bool
    {   self.capabilities.iter().any(|c| c == capability)
    }
}

/// HTTP client for one configured provider
#[derive(Debug, Clone)]
pub struct ProviderClient
{   kind: ProviderKind
  , api_base: String
  , http_client: reqwest::Client
}

impl ProviderClient
{   pub fn new(config: &ProviderConfig) -> Result<Self, Error>
    {   debug!(
          "Creating {} provider client for {}",
          config.kind, config.api_base
        );
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs
        {   builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| {
          Error::InvalidConfiguration(
            format!("failed to build HTTP client: {}", e)
          )
        })?;

        Ok(ProviderClient
        {   kind: config.kind
          , api_base: config.api_base.trim_end_matches('/').to_string()
          , http_client
        })
    }

    pub fn kind(&self) -> ProviderKind
    {   self.kind
    }

    /// Send one generate call for `request` against `model`.
    ///
    /// A failure status comes back as `Ok` with the status and body
    /// untouched; only transport failures and unparseable success
    /// bodies are errors here.
    pub async fn generate(
      &self
    , api_key: &str
    , model: String
    , request: &PromptRequest
    ) -> Result<ProviderReply, Error>
    {   debug!("Sending prompt to {} model {}", self.kind, model);
        let builder = match self.kind
        {   ProviderKind::Gemini => gemini::generate_request(
              &self.http_client, &self.api_base, api_key, &model, request
            )
          , ProviderKind::OpenAi => openai::generate_request(
              &self.http_client, &self.api_base, api_key, &model, request
            )
        };
        let (status, body) = send(builder).await?;
        Ok(ProviderReply { model, status, body })
    }

    /// Fetch the provider's model list
    pub async fn list_models(
      &self
    , api_key: &str
    ) -> Result<Vec<ListedModel>, Error>
    {   debug!("Listing {} models", self.kind);
        let builder = match self.kind
        {   ProviderKind::Gemini => gemini::list_models_request(
              &self.http_client, &self.api_base, api_key
            )
          , ProviderKind::OpenAi => openai::list_models_request(
              &self.http_client, &self.api_base, api_key
            )
        };
        let (status, body) = send(builder).await?;
        let listing = ProviderReply
        {   model: String::new()
          , status
          , body
        }.into_result()?;

        let models = match self.kind
        {   ProviderKind::Gemini => gemini::parse_models(listing.body)?
          , ProviderKind::OpenAi => openai::parse_models(listing.body)?
        };
        debug!("Retrieved {} models", models.len());
        Ok(models)
    }
}

/// Send a prepared request and read back status and JSON body
async fn send(
  builder: reqwest::RequestBuilder
) -> Result<(u16, Value), Error>
{   // reqwest errors carry the request URL; strip it before the error
    // is logged or answered
    let response = builder.send().await.map_err(|e| {
      let e = e.without_url();
      error!("HTTP error: {}", e);
      Error::HttpError(e.to_string())
    })?;

    let status = response.status().as_u16();
    trace!("Provider response status: {}", status);

    let text = response.text().await.map_err(|e| {
      let e = e.without_url();
      error!("Failed to read provider response: {}", e);
      Error::HttpError(e.to_string())
    })?;

    match serde_json::from_str::<Value>(&text)
    {   Ok(body) => Ok((status, body))
      , Err(_) if !(200..300).contains(&status) => {
          Ok((status, Value::String(text)))
        }
      , Err(e) => {
          error!("Parse error: {}", e);
          Err(Error::ParseError(e.to_string()))
        }
    }
}
