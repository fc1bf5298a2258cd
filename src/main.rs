//! Gyuldam AI — weather-aware farming assistant for Jeju farmers.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires up the knowledge tables, weather client, and LLM gateway,
//! and serves the HTTP surface until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use gyuldam::config::AppConfig;
use gyuldam::context::ContextBuilder;
use gyuldam::knowledge::KnowledgeBase;
use gyuldam::llm::openrouter::{HttpChatTransport, OpenRouterGateway};
use gyuldam::llm::ChatModel;
use gyuldam::server;
use gyuldam::server::routes::ServiceState;
use gyuldam::weather::transport::KmaHttpTransport;
use gyuldam::weather::{RegionTables, WeatherClient};

const BANNER: &str = r#"
   ____ ___   _ _     ____    _    __  __
  / ___|_ _| | | |   |  _ \  / \  |  \/  |
 | |  _ | |  | | |   | | | |/ _ \ | |\/| |
 | |_| || |  | | |___| |_| / ___ \| |  | |
  \____|___| |_|_____|____/_/   \_\_|  |_|

  귤담 AI — Jeju Farmer Assistant
  v0.1.0 — Teengerine Project
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    println!("{BANNER}");
    info!(
        port = cfg.server.port,
        model = %cfg.llm.model,
        default_region = %cfg.weather.default_region,
        "Gyuldam starting up"
    );

    // -- Initialise components -------------------------------------------

    let tables = Arc::new(RegionTables::new());
    let knowledge = Arc::new(KnowledgeBase::new());

    let short_key = AppConfig::resolve_env(&cfg.weather.short_api_key_env).unwrap_or_else(|_| {
        warn!(
            env = %cfg.weather.short_api_key_env,
            "KMA short-range API key not set — weather lookups will fail"
        );
        String::new()
    });
    let mid_key = AppConfig::resolve_env(&cfg.weather.mid_api_key_env).unwrap_or_else(|_| {
        warn!(
            env = %cfg.weather.mid_api_key_env,
            "KMA mid-range API key not set — mid-range lookups will fail"
        );
        String::new()
    });

    let weather = Arc::new(WeatherClient::new(
        Arc::new(KmaHttpTransport::new(short_key, mid_key)?),
        tables.clone(),
    ));

    let llm_api_key = AppConfig::resolve_env(&cfg.llm.api_key_env).unwrap_or_else(|_| {
        warn!(
            env = %cfg.llm.api_key_env,
            "OpenRouter API key not set — answers will degrade to fallback text"
        );
        String::new()
    });
    let llm: Arc<dyn ChatModel> = Arc::new(OpenRouterGateway::new(
        Arc::new(HttpChatTransport::new(llm_api_key)?),
        Some(cfg.llm.model.clone()),
        cfg.llm.max_tokens,
        cfg.llm.temperature,
    ));

    let context = ContextBuilder::new(weather.clone(), knowledge);

    let state = Arc::new(ServiceState {
        context,
        llm,
        weather,
        tables,
        default_region: cfg.weather.default_region.clone(),
    });

    // -- Serve -----------------------------------------------------------

    server::serve(state, cfg.server.port).await?;

    info!("Gyuldam shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gyuldam=info"));

    let json_logging = std::env::var("GYULDAM_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
