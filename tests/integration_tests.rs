mod common;

use clap::Parser;
use doc_domains::utils::validation::Validate;
use doc_domains::{
    CliConfig, DocumentPipeline, DocumentScanner, LocalStorage, ScanEngine, ScanError,
};
use tempfile::TempDir;

fn cli(args: &[&str]) -> CliConfig {
    let mut argv = vec!["doc-domains"];
    argv.extend_from_slice(args);
    CliConfig::parse_from(argv)
}

fn engine_for(config: CliConfig) -> ScanEngine<DocumentPipeline<LocalStorage, CliConfig>> {
    let scanner = DocumentScanner::from_config(&config.ocr_config());
    let pipeline = DocumentPipeline::new(LocalStorage::new(".".to_string()), config, scanner);
    ScanEngine::new_with_monitoring(pipeline, false)
}

#[tokio::test]
async fn test_end_to_end_text_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("ocr.txt");
    let output = temp_dir.path().join("out").join("domains.txt");
    std::fs::write(
        &input,
        "Visit http://Example.COM/page and www.example.com\n\
         contact me@example.org for info\n\
         see sub.domain.example.co.uk:8080\n\
         http://a.com, http://a.com.\n",
    )
    .unwrap();

    let config = cli(&[
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(config.validate().is_ok());

    let output_path = engine_for(config).run().await.unwrap();
    assert_eq!(output_path, output.to_str().unwrap());

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, "a.com\nexample.com\nsub.domain.example.co.uk\n");
}

#[tokio::test]
async fn test_end_to_end_xlsx_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("partners.xlsx");
    let output = temp_dir.path().join("domains.txt");

    let workbook = common::xlsx(
        None,
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>shop.example.de</t></is></c><c r="B1" t="str"><v>https://api.example.io/v2</v></c></row>"#,
    );
    std::fs::write(&input, workbook).unwrap();

    let config = cli(&[input.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    engine_for(config).run().await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "api.example.io\nshop.example.de\n"
    );
}

#[tokio::test]
async fn test_empty_result_writes_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("empty.txt");
    let output = temp_dir.path().join("domains.txt");
    std::fs::write(&input, "nothing to see, version 1.2.3").unwrap();

    let config = cli(&[input.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    engine_for(config).run().await.unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[tokio::test]
async fn test_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("missing.pdf");
    let output = temp_dir.path().join("domains.txt");

    let config = cli(&[input.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    let err = engine_for(config).run().await.unwrap_err();

    assert!(matches!(err, ScanError::InputNotFound { .. }));
    assert!(!output.exists());
}
