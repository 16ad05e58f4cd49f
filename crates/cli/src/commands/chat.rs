//! `chatrelay chat` — Run one turn against the configured store and model.

use chatrelay_config::AppConfig;
use chatrelay_relay::{RelaySettings, TurnOrchestrator};

pub async fn run(session: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Err(e) = config.require_api_key() {
        super::print_api_key_help();
        return Err(e.into());
    }

    let provider = chatrelay_providers::build_from_config(&config);
    let store = chatrelay_store::build_from_config(&config.store).await?;
    let orchestrator =
        TurnOrchestrator::new(provider, store, RelaySettings::from_config(&config.relay));

    match orchestrator.handle_turn(session, message).await {
        Ok(turn) => {
            println!("{}", turn.reply);
            println!();
            println!("  model: {}", turn.model);
            print_trace(&turn.trace);
            Ok(())
        }
        Err(failure) => {
            eprintln!("  ERROR: {}", failure.error);
            print_trace(&failure.trace);
            Err(failure.into())
        }
    }
}

fn print_trace(trace: &[String]) {
    if trace.is_empty() {
        return;
    }
    println!("  trace:");
    for line in trace {
        println!("    - {line}");
    }
}
