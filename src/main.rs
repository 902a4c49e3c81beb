use log::info;
use tokio::net::TcpListener;

use prompt_relay::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()>
{   // .env is optional
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = RelayConfig::from_env()?;
    info!("Starting prompt-relay on {}", config.bind);

    let listener = TcpListener::bind(&config.bind).await?;
    prompt_relay::serve(listener, config).await
}
