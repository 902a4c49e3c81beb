pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod failover;
pub mod discovery;
pub mod mapper;
pub mod server;

use serde::{Deserialize, Serialize};

pub use config::RelayConfig;
pub use error::Error;
pub use server::{router, serve};

/*

prompt-relay: one stateless endpoint that takes a `{ "prompt": "..." }`
POST, attaches the provider key from config and forwards it to a
generative-text API, walking an ordered list of fallback models until
one answers.

src/
├── lib.rs          # Re-exports and provider kinds
├── main.rs         # Binary: env, logging, listener
├── error.rs        # Error type and its JSON/HTTP rendering
├── config.rs       # Env-driven configuration
├── request.rs      # Inbound validation
├── providers/      # Outbound invokers (gemini, openai-compatible)
├── failover.rs     # Fallback model sequence
├── discovery.rs    # "list models" based model selection
├── mapper.rs       # Provider JSON -> outbound JSON
└── server.rs       # axum router and handler

*/

/// Generative-text APIs the relay can forward to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind
{
  /// Google AI Studio (Gemini `generateContent`)
  Gemini
  ,
  /// Any OpenAI-compatible chat completions API
  /// (OpenAI, Mistral, Groq, OpenRouter, ...)
  OpenAi
}

impl ProviderKind
{   /// Base URL used when `RELAY_API_BASE` is not set
    pub fn default_api_base(&self) -> &'static str
    {   match self
        {   ProviderKind::Gemini => providers::gemini::API_BASE
          , ProviderKind::OpenAi => providers::openai::API_BASE
        }
    }

    /// Environment variable holding the provider credential
    pub fn api_key_var(&self) -> &'static str
    {   match self
        {   ProviderKind::Gemini => "GEMINI_API_KEY"
          , ProviderKind::OpenAi => "OPENAI_API_KEY"
        }
    }

    /// Fallback sequence used when `RELAY_MODELS` is not set
    pub fn default_models(&self) -> &'static [&'static str]
    {   match self
        {   ProviderKind::Gemini => &[
              "gemini-2.5-flash"
            , "gemini-2.0-flash"
            , "gemini-1.5-flash"
            ]
          , ProviderKind::OpenAi => &["gpt-4o-mini", "gpt-4o"]
        }
    }

    /// Capability a listed model must advertise to be picked by
    /// discovery. `None` means every listed model qualifies.
    pub fn required_capability(&self) -> Option<&'static str>
    {   match self
        {   ProviderKind::Gemini => Some("generateContent")
          , ProviderKind::OpenAi => None
        }
    }
}

impl std::fmt::Display for ProviderKind
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   match self
        {   ProviderKind::Gemini => write!(f, "gemini")
          , ProviderKind::OpenAi => write!(f, "openai")
        }
    }
}

impl std::str::FromStr for ProviderKind
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "gemini" | "google" => Ok(ProviderKind::Gemini)
          , "openai" | "openai-compatible" => Ok(ProviderKind::OpenAi)
          , other => Err(Error::InvalidConfiguration(
              format!("unknown provider: {}", other)
            ))
        }
    }
}
