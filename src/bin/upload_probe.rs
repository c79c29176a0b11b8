use anyhow::Context;
use clap::Parser;
use doc_domains::app::upload_client::post_file;
use doc_domains::utils::logger;
use doc_domains::utils::validation::validate_url;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "upload-probe")]
#[command(about = "Upload a file to a running doc-domains server and print the raw response")]
struct Args {
    /// File to upload as the multipart `file` field
    file: PathBuf,

    #[arg(default_value = "http://localhost:3000/upload?debug=1")]
    url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    validate_url("url", &args.url)?;

    let client = reqwest::Client::new();
    let response = post_file(&client, &args.url, &args.file)
        .await
        .with_context(|| format!("uploading {} to {}", args.file.display(), args.url))?;

    println!("Status: {}", response.status);
    println!("Headers:");
    for (name, value) in &response.headers {
        println!("  {}: {}", name, value);
    }
    println!();
    println!("{}", response.body);

    Ok(())
}
