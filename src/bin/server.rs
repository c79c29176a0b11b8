use clap::Parser;
use doc_domains::config::toml_config::AppConfig;
use doc_domains::server;
use doc_domains::utils::logger;

#[derive(Parser)]
#[command(name = "doc-domains-server")]
#[command(about = "HTTP service returning the domains found in uploaded PDF and Excel files")]
struct Args {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置並套用 HOST/PORT/MAX_FILE_MB
    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_server_logger(&config.server.log_format);

    tracing::info!("🚀 Starting doc-domains server");
    if let Some(path) = &args.config {
        tracing::info!("📁 Configuration loaded from: {}", path);
    }
    tracing::info!(
        "🔎 OCR fallback: {} (dpi {}, lang {})",
        if config.ocr.enabled { "enabled" } else { "disabled" },
        config.ocr.dpi,
        config.ocr.language
    );

    if let Err(e) = server::serve(config).await {
        tracing::error!("❌ Server stopped: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    Ok(())
}
