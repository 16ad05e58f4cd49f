//! `chatrelay status` — Show effective configuration.

use chatrelay_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("ChatRelay Status");
    println!("================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Endpoint:     {}", config.llm.endpoint);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Primary:      {}", config.relay.primary_model);
    println!("  Fallback:     {}", config.relay.fallback_model);
    println!("  Timeout:      {}s per attempt", config.relay.timeout_secs);
    println!("  Window:       {} messages", config.relay.history_window);
    println!("  Store:        {}", config.store.backend);
    match config.store.backend.as_str() {
        "sqlite" => println!("  DB path:      {}", config.store.path),
        "supabase" => println!(
            "  Supabase:     {}",
            config.store.supabase_url.as_deref().unwrap_or("(unset)")
        ),
        _ => {}
    }
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  CORS:         {}", config.gateway.allowed_origins.join(", "));

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — run `chatrelay init` (defaults and env in use)");
    }

    Ok(())
}
