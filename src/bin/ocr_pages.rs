use clap::Parser;
use doc_domains::adapters::ocr::{CommandRasterizer, TesseractOcr};
use doc_domains::config::toml_config::OcrConfig;
use doc_domains::core::ocr::PageOcr;
use doc_domains::domain::ports::LogProgress;
use doc_domains::utils::error::{Result, ScanError};
use doc_domains::utils::logger;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ocr-pages")]
#[command(about = "Render every page of a PDF and write the recognized text")]
struct Args {
    /// PDF to recognize
    input: PathBuf,

    /// Output text file (defaults to the input path with a .txt extension)
    output: Option<PathBuf>,

    #[arg(long, default_value = "300")]
    dpi: u32,

    #[arg(long, default_value = "eng")]
    lang: String,

    #[arg(long)]
    max_pages: Option<u32>,

    #[arg(short, long)]
    verbose: bool,
}

async fn run(args: &Args, output: &Path) -> Result<usize> {
    if !args.input.is_file() {
        return Err(ScanError::InputNotFound {
            path: args.input.display().to_string(),
        });
    }

    let config = OcrConfig {
        dpi: args.dpi,
        language: args.lang.clone(),
        max_pages: args.max_pages,
        ..OcrConfig::default()
    };

    let work_dir = tempfile::Builder::new().prefix("ocr-pages-").tempdir()?;
    let ocr = PageOcr::new(
        Arc::new(CommandRasterizer::from_config(&config)),
        Arc::new(TesseractOcr::from_config(&config)),
    );

    let document = ocr
        .recognize_pdf(&args.input, work_dir.path(), &LogProgress)
        .await?;

    if let Some(reason) = document.outcome().reason() {
        return Err(ScanError::ProcessingError {
            message: reason.to_string(),
        });
    }

    tokio::fs::write(output, &document.text).await?;
    Ok(document.pages_recognized())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("txt"));

    match run(&args, &output).await {
        Ok(pages) => {
            println!("✅ OCR finished ({} pages). Text written to {}", pages, output.display());
        }
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.ocr_exit_code());
        }
    }
}
