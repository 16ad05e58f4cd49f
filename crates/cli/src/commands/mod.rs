pub mod chat;
pub mod doctor;
pub mod init;
pub mod serve;
pub mod status;

use chatrelay_config::AppConfig;

/// Printed when a command needs the completion endpoint but no key is set.
fn print_api_key_help() {
    eprintln!();
    eprintln!("  ERROR: No LLM API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables (or put it in ./.env):");
    eprintln!("    LLM_API_KEY=sk-or-v1-...        (recommended)");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...");
    eprintln!("    CHATRELAY_API_KEY=sk-...        (generic)");
    eprintln!();
    eprintln!("  Or add api_key to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}
