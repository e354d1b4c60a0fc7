use anyhow::Result;
use clap::Parser;
use tracing::info;
use vox_relay::{create_router, AppState, Config, SessionConfig, CHUNK_SAMPLES};

/// Live microphone-to-ASR streaming relay
#[derive(Debug, Parser)]
#[command(name = "vox-relay", version)]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/vox-relay")]
    config: String,

    /// Override the ASR endpoint from the config file
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("vox-relay v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let endpoint = args.endpoint.unwrap_or(cfg.asr.endpoint);
    info!("ASR endpoint: {}", endpoint);
    info!(
        "Wire format: {} Hz mono PCM16, {} samples per chunk",
        cfg.audio.target_sample_rate, CHUNK_SAMPLES
    );

    let session_defaults = SessionConfig {
        endpoint,
        target_sample_rate: cfg.audio.target_sample_rate,
        silence_threshold: cfg.audio.silence_threshold,
        ..SessionConfig::default()
    };

    let state = AppState::new(session_defaults);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP control API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
