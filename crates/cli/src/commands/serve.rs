//! `chatrelay serve` — Start the HTTP relay.

use chatrelay_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    // Refuse to start without credentials for the completion endpoint.
    if let Err(e) = config.require_api_key() {
        super::print_api_key_help();
        return Err(e.into());
    }

    tracing::debug!(config = ?config, "Effective configuration");

    println!("ChatRelay");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Models:    {} -> {}",
        config.relay.primary_model, config.relay.fallback_model
    );
    println!("   Store:     {}", config.store.backend);

    chatrelay_gateway::start(config).await?;

    Ok(())
}
