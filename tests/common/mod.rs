//! Stub provider used by the integration tests.
//!
//! Speaks just enough of the Gemini and OpenAI-compatible APIs. What a
//! generate call returns depends on the model name prefix:
//!
//! - `ok*`      → 200 with generated text "Hi!"
//! - `missing*` → 404 error object
//! - `busy*`    → 429 error object
//! - `soft*`    → 200 status carrying an error object (code 503)
//! - `garbage*` → 200 with a non-JSON body
//! - anything else → 500 error object

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use prompt_relay::config::RelayConfig;
use prompt_relay::ProviderKind;

pub const TEST_KEY: &str = "test-key";

/// Records every call the relay makes, in order
#[derive(Clone, Default)]
pub struct Stub
{   calls: Arc<Mutex<Vec<String>>>
  , bodies: Arc<Mutex<Vec<Value>>>
}

impl Stub
{   pub fn calls(&self) -> Vec<String>
    {   self.calls.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<Value>
    {   self.bodies.lock().unwrap().clone()
    }

    fn record(&self, call: &str, body: Value)
    {   self.calls.lock().unwrap().push(call.to_string());
        self.bodies.lock().unwrap().push(body);
    }
}

fn error_object(code: u16, message: &str) -> Value
{   json!({ "error": { "code": code, "message": message, "status": "STUB" } })
}

fn canned(model: &str, success: Value) -> Response
{   let (status, body) = if model.starts_with("ok")
    {   (StatusCode::OK, success)
    } else if model.starts_with("missing")
    {   (
          StatusCode::NOT_FOUND
        , error_object(404, &format!("models/{} is not found", model))
        )
    } else if model.starts_with("busy")
    {   (
          StatusCode::TOO_MANY_REQUESTS
        , error_object(429, "Resource has been exhausted")
        )
    } else if model.starts_with("soft")
    {   (StatusCode::OK, error_object(503, "The model is overloaded"))
    } else if model.starts_with("garbage")
    {   return (StatusCode::OK, "<html>oops</html>").into_response();
    } else
    {   (StatusCode::INTERNAL_SERVER_ERROR, error_object(500, "Internal error"))
    };
    (status, Json(body)).into_response()
}

fn has_gemini_key(headers: &HeaderMap) -> bool
{   headers.get("x-goog-api-key").and_then(|v| v.to_str().ok())
      == Some(TEST_KEY)
}

fn bad_key() -> Response
{   (
      StatusCode::BAD_REQUEST
    , Json(error_object(400, "API key not valid. Please pass a valid API key."))
    )
      .into_response()
}

async fn gemini_generate(
  State(stub): State<Stub>
, Path(call): Path<String>
, headers: HeaderMap
, Json(body): Json<Value>
) -> Response
{   let model = call
      .strip_suffix(":generateContent")
      .unwrap_or(&call)
      .to_string();
    stub.record(&model, body);

    if !has_gemini_key(&headers)
    {   return bad_key();
    }
    canned(&model, json!({
      "candidates": [{
        "content": { "parts": [{ "text": "Hi!" }], "role": "model" },
        "finishReason": "STOP"
      }],
      "modelVersion": model.clone()
    }))
}

async fn gemini_models(
  State(stub): State<Stub>
, headers: HeaderMap
) -> Response
{   stub.record("list", Value::Null);

    if !has_gemini_key(&headers)
    {   return bad_key();
    }
    Json(json!({
      "models": [
        {
          "name": "models/embedding-001",
          "supportedGenerationMethods": ["embedContent"]
        },
        {
          "name": "models/ok-pro",
          "supportedGenerationMethods": ["generateContent", "countTokens"]
        },
        {
          "name": "models/ok-flash",
          "supportedGenerationMethods": ["generateContent", "countTokens"]
        }
      ]
    }))
      .into_response()
}

async fn openai_chat(
  State(stub): State<Stub>
, headers: HeaderMap
, Json(body): Json<Value>
) -> Response
{   let model = body["model"].as_str().unwrap_or_default().to_string();
    stub.record(&model, body);

    let expected = format!("Bearer {}", TEST_KEY);
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
      != Some(expected.as_str())
    {   return (
          StatusCode::UNAUTHORIZED
        , Json(json!({ "error": { "message": "Incorrect API key provided" } }))
        )
          .into_response();
    }
    canned(&model, json!({
      "object": "chat.completion",
      "model": model.clone(),
      "choices": [{
        "index": 0,
        "message": { "role": "assistant", "content": "Hi!" },
        "finish_reason": "stop"
      }]
    }))
}

pub fn stub_app(stub: Stub) -> Router
{   Router::new()
      .route("/v1beta/models", get(gemini_models))
      .route("/v1beta/models/:call", post(gemini_generate))
      .route("/v1/chat/completions", post(openai_chat))
      .with_state(stub)
}

/// Start the stub provider, returning its base URL and call log
pub async fn start_stub() -> (String, Stub)
{   let stub = Stub::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = stub_app(stub.clone());
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), stub)
}

/// Start the relay, returning its base URL (no route appended)
pub async fn start_relay(config: RelayConfig) -> String
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      prompt_relay::serve(listener, config).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Gemini relay config pointed at the stub
pub fn gemini_config(stub_base: &str, models: &[&str]) -> RelayConfig
{   let mut config = RelayConfig::new(ProviderKind::Gemini);
    config.provider.api_base = format!("{}/v1beta", stub_base);
    config.provider.api_key = Some(TEST_KEY.to_string());
    config.failover.models = models.iter().map(|m| m.to_string()).collect();
    config
}

/// OpenAI-compatible relay config pointed at the stub
pub fn openai_config(stub_base: &str, models: &[&str]) -> RelayConfig
{   let mut config = RelayConfig::new(ProviderKind::OpenAi);
    config.provider.api_base = format!("{}/v1", stub_base);
    config.provider.api_key = Some(TEST_KEY.to_string());
    config.failover.models = models.iter().map(|m| m.to_string()).collect();
    config
}
