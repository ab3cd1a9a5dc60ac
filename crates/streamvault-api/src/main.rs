use streamvault_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    streamvault_api::telemetry::init_tracing();

    let config = Config::from_env()?;

    let (_state, router) = streamvault_api::setup::initialize_app(config.clone()).await?;

    streamvault_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
