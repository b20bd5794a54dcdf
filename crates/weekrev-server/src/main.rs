use anyhow::Result;
use chrono::Utc;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use weekrev_ai::{EndpointConfig, FailoverGenerator, OpenAiCompatProvider, ReportGenerator};
use weekrev_export::PdfOptions;
use weekrev_server::app;
use weekrev_server::config::{LlmEndpoint, ServerConfig};
use weekrev_server::state::AppState;
use weekrev_storage::ReportStore;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  weekrev-server [config.toml]    Start the server");
}

#[tokio::main]
async fn main() -> Result<()> {
    weekrev_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("weekrev=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = match args.get(1) {
        Some(path) => ServerConfig::load(path)?,
        None => {
            let mut config = ServerConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    // 数据库连接失败直接终止启动；请求期的失败不会导致进程退出
    let store = ReportStore::new(&config.resolved_db_url(), Path::new(&config.data_dir)).await?;

    let generator = build_generator(&config)?;

    let state = AppState {
        store: Arc::new(store),
        generator,
        pdf_options: PdfOptions {
            chromium_bin: config.export.chromium_bin.clone(),
            wkhtmltopdf_bin: config.export.wkhtmltopdf_bin.clone(),
            timeout_secs: config.export.timeout_secs,
        },
        start_time: Utc::now(),
        config: Arc::new(config.clone()),
    };

    let router = app::build_http_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_generator(config: &ServerConfig) -> Result<Arc<dyn ReportGenerator>> {
    let to_endpoint = |name: &str, ep: &LlmEndpoint| {
        let mut cfg = EndpointConfig::new(name, &ep.base_url, &ep.model, &ep.api_key);
        cfg.timeout_secs = config.llm.timeout_secs;
        cfg.max_tokens = config.llm.max_tokens;
        cfg.temperature = config.llm.temperature;
        cfg
    };

    let primary_cfg = match &config.llm.primary {
        Some(ep) => to_endpoint("primary", ep),
        None => {
            tracing::warn!("No LLM primary endpoint configured, report generation will fail");
            EndpointConfig::new("primary", "http://localhost:0", "unconfigured", "")
        }
    };
    let primary = OpenAiCompatProvider::new(primary_cfg)
        .map_err(|e| anyhow::anyhow!("failed to build primary LLM provider: {e}"))?;

    let backup = match &config.llm.backup {
        Some(ep) => Some(
            OpenAiCompatProvider::new(to_endpoint("backup", ep))
                .map_err(|e| anyhow::anyhow!("failed to build backup LLM provider: {e}"))?,
        ),
        None => None,
    };

    Ok(Arc::new(FailoverGenerator::new(primary, backup)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
