use clap::Parser;
use doc_domains::domain::model::DomainSet;
use doc_domains::extract_domains;
use doc_domains::utils::error::{Result, ScanError};
use doc_domains::utils::logger;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "extract-domains")]
#[command(about = "Extract the unique domains referenced in a text file")]
struct Args {
    /// Text file to scan
    #[arg(default_value = "tmp/ocr.txt")]
    input: PathBuf,

    /// Where to write one domain per line
    #[arg(default_value = "tmp/domains.txt")]
    output: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

async fn run(input: &Path, output: &Path) -> Result<DomainSet> {
    let bytes = tokio::fs::read(input).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::InputNotFound {
            path: input.display().to_string(),
        },
        _ => ScanError::IoError(e),
    })?;

    let domains = extract_domains(&String::from_utf8_lossy(&bytes));

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, domains.to_text()).await?;

    Ok(domains)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match run(&args.input, &args.output).await {
        Ok(domains) => {
            println!(
                "Found {} domains, saved to {}",
                domains.len(),
                args.output.display()
            );
        }
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }
}
