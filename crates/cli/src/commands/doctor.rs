//! `chatrelay doctor` — Diagnose configuration and store health.

use chatrelay_config::AppConfig;
use chatrelay_core::message::SessionId;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("ChatRelay Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  [ok]   Config file found: {}", config_path.display());
    } else {
        println!("  [warn] No config file — defaults and environment in use (`chatrelay init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            println!("\n  1 issue found. Fix the configuration and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  [ok]   LLM API key configured");
    } else {
        println!("  [fail] No LLM API key — set LLM_API_KEY or api_key in config.toml");
        issues += 1;
    }

    match chatrelay_store::build_from_config(&config.store).await {
        Ok(store) => match store.query_recent(&SessionId::from("doctor"), 1).await {
            Ok(_) => println!("  [ok]   Store '{}' reachable", store.name()),
            Err(e) => {
                println!("  [fail] Store '{}' query failed: {e}", store.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] Store '{}' unavailable: {e}", config.store.backend);
            issues += 1;
        }
    }

    if config.has_api_key() {
        let provider = chatrelay_providers::build_from_config(&config);
        match provider.health_check().await {
            Ok(true) => println!("  [ok]   Completion endpoint reachable ({})", provider.name()),
            Ok(false) => {
                println!("  [warn] Completion endpoint answered but reported unhealthy");
                issues += 1;
            }
            Err(e) => {
                println!("  [fail] Completion endpoint unreachable: {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
