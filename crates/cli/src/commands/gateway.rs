//! `parley serve`: Start the HTTP API server.

use parley_config::AppConfig;

pub async fn run(port_override: Option<u16>, host_override: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("Parley Gateway");
    println!("   Listening:    {}", config.bind_addr());
    println!("   Default user: {}", config.default_user_id);
    println!("   CORS:         {}", if config.gateway.cors_permissive { "permissive" } else { "same-origin" });

    parley_gateway::start(config).await?;

    Ok(())
}
