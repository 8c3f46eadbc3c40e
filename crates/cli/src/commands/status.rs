//! `parley status`: Show effective configuration.

use parley_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Parley Status");
    println!("=============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Gateway:        {}", config.bind_addr());
    println!("  CORS:           {}", if config.gateway.cors_permissive { "permissive" } else { "same-origin" });
    println!("  Client URL:     {}", config.client.base_url);
    println!("  Default user:   {}", config.default_user_id);
    println!("  Positive words: {}", config.sentiment.positive_words.join(", "));
    println!("  Negative words: {}", config.sentiment.negative_words.join(", "));

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, using defaults (run `parley onboard` to create one)");
    }

    Ok(())
}
