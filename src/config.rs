//! Configuration for the relay, its provider and failover behavior
//!
//! Everything is read once from the environment (see [`RelayConfig::from_env`])
//! and handed to the router; handlers never look at the process environment.

use serde::{Deserialize, Serialize};
use log::{debug, warn};

use crate::error::Error;
use crate::mapper::ResponseShape;
use crate::ProviderKind;

pub const DEFAULT_BIND: &str = "0.0.0.0:8888";
pub const DEFAULT_ROUTE: &str = "/api/generate";
pub const DEFAULT_PREFERRED_MODEL: &str = "flash";

/// Provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Which API family to speak
    pub kind: ProviderKind
  , /// API base URL, without trailing slash
    pub api_base: String
  , /// Provider credential, trimmed; `None` when unset or blank
    #[serde(skip_serializing)]
    pub api_key: Option<String>
  , /// Outbound request timeout in seconds
    pub timeout_secs: Option<u64>
}

impl ProviderConfig
{   pub fn new(kind: ProviderKind) -> Self
    {   ProviderConfig
        {   kind
          , api_base: kind.default_api_base().to_string()
          , api_key: None
          , timeout_secs: None
        }
    }
}

impl std::fmt::Debug for ProviderConfig
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.debug_struct("ProviderConfig")
          .field("kind", &self.kind)
          .field("api_base", &self.api_base)
          .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
          .field("timeout_secs", &self.timeout_secs)
          .finish()
    }
}

/// Failover configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverConfig
{   /// Candidate models, tried in order
    pub models: Vec<String>
  , /// Ask the provider for its model list before generating
    pub discover_models: bool
  , /// Substring a discovered model name should contain
    pub preferred_model: String
}

impl FailoverConfig
{   pub fn new(kind: ProviderKind) -> Self
    {   FailoverConfig
        {   models: kind.default_models()
              .iter()
              .map(|m| m.to_string())
              .collect()
          , discover_models: false
          , preferred_model: DEFAULT_PREFERRED_MODEL.to_string()
        }
    }
}

/// Relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig
{   /// Socket address the binary listens on
    pub bind: String
  , /// Path the relay handler is mounted at
    pub route: String
  , /// Answer with permissive CORS headers
    pub cors: bool
  , /// Outbound JSON schema
    pub response_shape: ResponseShape
  , /// Provider configuration
    pub provider: ProviderConfig
  , /// Failover configuration
    pub failover: FailoverConfig
}

impl RelayConfig
{   pub fn new(kind: ProviderKind) -> Self
    {   RelayConfig
        {   bind: DEFAULT_BIND.to_string()
          , route: DEFAULT_ROUTE.to_string()
          , cors: true
          , response_shape: ResponseShape::default()
          , provider: ProviderConfig::new(kind)
          , failover: FailoverConfig::new(kind)
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, Error>
    {   Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where F: Fn(&str) -> Option<String>
    {   let var = |name: &str| {
          lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        };

        let kind = match var("RELAY_PROVIDER")
        {   Some(v) => v.parse::<ProviderKind>()?
          , None => ProviderKind::Gemini
        };
        let mut config = RelayConfig::new(kind);

        if let Some(bind) = var("RELAY_BIND")
        {   config.bind = bind;
        }
        if let Some(route) = var("RELAY_ROUTE")
        {   if !route.starts_with('/')
            {   return Err(Error::InvalidConfiguration(
                  format!("RELAY_ROUTE must start with '/': {}", route)
                ));
            }
            config.route = route;
        }
        if let Some(cors) = var("RELAY_CORS")
        {   config.cors = parse_bool("RELAY_CORS", &cors)?;
        }
        if let Some(shape) = var("RELAY_RESPONSE_SHAPE")
        {   config.response_shape = shape.parse()?;
        }

        if let Some(base) = var("RELAY_API_BASE")
        {   config.provider.api_base
              = base.trim_end_matches('/').to_string();
        }
        config.provider.api_key = var(kind.api_key_var());
        if config.provider.api_key.is_none()
        {   warn!(
              "{} is not set; generation requests will fail",
              kind.api_key_var()
            );
        }
        if let Some(timeout) = var("RELAY_TIMEOUT_SECS")
        {   let secs = timeout.parse::<u64>().map_err(|_| {
              Error::InvalidConfiguration(format!(
                "RELAY_TIMEOUT_SECS is not a number: {}",
                timeout
              ))
            })?;
            config.provider.timeout_secs = Some(secs);
        }

        if let Some(models) = var("RELAY_MODELS")
        {   let models = parse_list(&models);
            if !models.is_empty()
            {   config.failover.models = models;
            }
        }
        if let Some(discover) = var("RELAY_DISCOVER_MODELS")
        {   config.failover.discover_models
              = parse_bool("RELAY_DISCOVER_MODELS", &discover)?;
        }
        if let Some(preferred) = var("RELAY_PREFERRED_MODEL")
        {   config.failover.preferred_model = preferred;
        }

        debug!("Loaded relay configuration: {:?}", config);
        Ok(config)
    }
}

impl Default for RelayConfig
{   fn default() -> Self
    {   RelayConfig::new(ProviderKind::Gemini)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, Error>
{   match value.to_ascii_lowercase().as_str()
    {   "1" | "true" | "yes" | "on" => Ok(true)
      , "0" | "false" | "no" | "off" => Ok(false)
      , _ => Err(Error::InvalidConfiguration(
          format!("{} is not a boolean: {}", name, value)
        ))
    }
}

fn parse_list(value: &str) -> Vec<String>
{   value
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .collect()
}
