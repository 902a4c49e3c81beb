//! Model discovery through the provider's "list models" call

use log::{debug, error, info};

use crate::error::Error;
use crate::providers::{ListedModel, ProviderClient};

/// First model whose name contains `preferred`, else the first one
/// advertising `capability`. With no capability to check every model
/// qualifies.
pub fn select_model<'a>(
  models: &'a [ListedModel]
, preferred: &str
, capability: Option<&str>
) -> Option<&'a ListedModel>
{   let by_name = (!preferred.is_empty())
      .then(|| models.iter().find(|m| m.name.contains(preferred)))
      .flatten();

    by_name.or_else(|| match capability
    {   Some(capability) => models.iter().find(|m| m.supports(capability))
      , None => models.first()
    })
}

/// List the provider's models and pick one to generate with
pub async fn discover(
  client: &ProviderClient
, api_key: &str
, preferred: &str
) -> Result<String, Error>
{   let models = client.list_models(api_key).await.map_err(|e| {
      error!("Failed to list models: {}", e);
      Error::Discovery(format!("listing models failed: {}", e))
    })?;

    let capability = client.kind().required_capability();
    match select_model(&models, preferred, capability)
    {   Some(model) => {
          info!("Discovered model {}", model.name);
          Ok(model.name.clone())
        }
      , None => {
          debug!(
            "No match for '{}' among {} models",
            preferred, models.len()
          );
          Err(Error::Discovery(format!(
            "no model matches '{}' or supports {}",
            preferred,
            capability.unwrap_or("generation")
          )))
        }
    }
}
