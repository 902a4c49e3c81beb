//! HTTP surface: router, relay handler and server loop
//!
//! One invocation runs top to bottom:
//! method check, body validation, credential, optional model
//! discovery, the fallback scan, then response mapping.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use log::{debug, error, info, trace};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::RelayConfig;
use crate::discovery;
use crate::error::Error;
use crate::failover::FailoverSequence;
use crate::mapper;
use crate::providers::ProviderClient;
use crate::request::{self, PromptRequest};

/// State shared by every invocation; read-only
#[derive(Clone)]
struct AppState
{   config: Arc<RelayConfig>
  , client: ProviderClient
}

/// Build the relay router for `config`
pub fn router(config: RelayConfig) -> Result<Router, Error>
{   let client = ProviderClient::new(&config.provider)?;
    let route = config.route.clone();
    let cors = config.cors;

    let state = AppState
    {   config: Arc::new(config)
      , client
    };

    let mut app = Router::new()
      .route("/health", get(health_check))
      .route(&route, any(relay));
    if route != "/"
    {   app = app.route("/", any(relay));
    }
    let app = app
      .fallback(not_found)
      .with_state(state);

    if cors
    {   Ok(app.layer(cors_layer()))
    } else
    {   Ok(app)
    }
}

/// Serve the relay on a pre-bound listener until ctrl-c
pub async fn serve(
  listener: TcpListener
, config: RelayConfig
) -> anyhow::Result<()>
{   let addr = listener.local_addr()?;
    info!(
      "Relay listening on http://{}{} ({} models: {})",
      addr,
      config.route,
      config.provider.kind,
      config.failover.models.join(", ")
    );

    let app = router(config)?;
    axum::serve(listener, app)
      .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
      })
      .await?;

    info!("Relay shut down");
    Ok(())
}

/// Permissive CORS; answers every OPTIONS request itself
fn cors_layer() -> CorsLayer
{   CorsLayer::new()
      .allow_origin(Any)
      .allow_methods([Method::POST, Method::OPTIONS])
      .allow_headers([header::CONTENT_TYPE])
}

async fn health_check() -> impl IntoResponse
{   Json(json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse
{   (
      StatusCode::NOT_FOUND
    , Json(json!({ "error": "Not Found" }))
    )
}

async fn relay(
  State(state): State<AppState>
, method: Method
, body: Result<Bytes, BytesRejection>
) -> Response
{   debug!("{} relay request", method);

    if method == Method::OPTIONS
    {   return StatusCode::OK.into_response();
    }

    match handle(&state, &method, body).await
    {   Ok(value) => (StatusCode::OK, Json(value)).into_response()
      , Err(e) => {
          if e.status().is_server_error()
          {   error!("Relay request failed: {}", e);
          } else
          {   debug!("Relay request rejected: {}", e);
          }
          e.into_response()
        }
    }
}

async fn handle(
  state: &AppState
, method: &Method
, body: Result<Bytes, BytesRejection>
) -> Result<Value, Error>
{   // Method first, so an oversized GET still gets 405
    request::check_method(method)?;
    let body = body?;
    trace!("{} byte body", body.len());
    let request = PromptRequest::from_body(&body)?;

    let provider = &state.config.provider;
    let api_key = provider.api_key.as_deref().ok_or_else(|| {
      Error::MissingApiKey(provider.kind.api_key_var().to_string())
    })?;

    let failover = &state.config.failover;
    let mut sequence = FailoverSequence::new(failover.models.iter().cloned());
    if failover.discover_models
    {   let model = discovery::discover(
          &state.client, api_key, &failover.preferred_model
        ).await?;
        sequence = sequence.with_preferred(model);
    }

    let client = &state.client;
    let request = &request;
    let reply = sequence
      .run(move |model| client.generate(api_key, model, request))
      .await?;
    debug!("Model {} answered with {}", reply.model, reply.status);

    mapper::map_response(
      state.config.response_shape
    , provider.kind
    , reply.body
    )
}
