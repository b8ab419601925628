//! Web form server handler

use crate::api::serve_web;
use crate::cli::output::*;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    println!("🚀 Starting Icebreaker web form");
    println!("================================\n");
    println!("📍 Host: {host}");
    println!("🔌 Port: {port}");
    println!("🤖 Provider: {} ({})", config.provider.kind, config.llm_model());
    println!(
        "🌐 CORS: {}",
        if config.server.enable_cors {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!();
    print_info(&format!("Open http://{host}:{port}/ in a browser"));

    serve_web(config, host, port).await
}
