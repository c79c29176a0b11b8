//! External-process collaborators for the OCR fallback: PDF rasterizers
//! (poppler's `pdftocairo`/`pdftoppm`, ImageMagick's `convert`) and the
//! `tesseract` CLI.

use crate::config::toml_config::OcrConfig;
use crate::domain::model::OcrOutcome;
use crate::domain::ports::{OcrEngine, Rasterizer, RenderedPages};
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

const IMAGE_PREFIX: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Converter {
    Pdftocairo,
    Pdftoppm,
    Convert,
}

impl Converter {
    pub fn binary(&self) -> &'static str {
        match self {
            Converter::Pdftocairo => "pdftocairo",
            Converter::Pdftoppm => "pdftoppm",
            Converter::Convert => "convert",
        }
    }

    pub fn is_installed(&self) -> bool {
        which::which(self.binary()).is_ok()
    }

    /// Command-line arguments writing `<prefix>-<n>.png` files.
    pub fn args(&self, pdf: &Path, prefix: &Path, dpi: u32, max_pages: Option<u32>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        match self {
            Converter::Pdftocairo | Converter::Pdftoppm => {
                args.push("-png".into());
                args.push("-r".into());
                args.push(dpi.to_string().into());
                if let Some(last) = max_pages {
                    args.push("-f".into());
                    args.push("1".into());
                    args.push("-l".into());
                    args.push(last.to_string().into());
                }
                args.push(pdf.as_os_str().to_owned());
                args.push(prefix.as_os_str().to_owned());
            }
            Converter::Convert => {
                args.push("-density".into());
                args.push(dpi.to_string().into());
                let mut input = pdf.as_os_str().to_owned();
                if let Some(last) = max_pages {
                    // ImageMagick 的頁碼從 0 開始
                    input.push(format!("[0-{}]", last.saturating_sub(1)));
                }
                args.push(input);
                let mut output = prefix.as_os_str().to_owned();
                output.push("-%d.png");
                args.push(output);
            }
        }
        args
    }
}

impl std::fmt::Display for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Tries each installed converter in order until one yields page images.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    converters: Vec<Converter>,
    dpi: u32,
    max_pages: Option<u32>,
    timeout: Duration,
}

impl CommandRasterizer {
    pub fn new(converters: Vec<Converter>, dpi: u32, max_pages: Option<u32>, timeout: Duration) -> Self {
        Self {
            converters,
            dpi,
            max_pages,
            timeout,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.converters.clone(),
            config.dpi,
            config.max_pages,
            Duration::from_secs(config.render_timeout_seconds),
        )
    }

    async fn run_converter(&self, converter: Converter, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        // 前一個轉換器失敗時可能留下部分頁面
        remove_page_images(out_dir, IMAGE_PREFIX)?;

        let prefix = out_dir.join(IMAGE_PREFIX);
        let args = converter.args(pdf, &prefix, self.dpi, self.max_pages);
        tracing::debug!("Running {} {:?}", converter, args);

        let child = Command::new(converter.binary())
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScanError::RenderFailed {
                    converter: converter.to_string(),
                    stderr: format!("timed out after {:?}", self.timeout),
                })
            }
        };

        if !output.status.success() {
            return Err(ScanError::RenderFailed {
                converter: converter.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        collect_page_images(out_dir, IMAGE_PREFIX)
    }
}

#[async_trait]
impl Rasterizer for CommandRasterizer {
    async fn render(&self, pdf: &Path, out_dir: &Path) -> Result<RenderedPages> {
        let mut last_error = None;

        for converter in &self.converters {
            if !converter.is_installed() {
                tracing::debug!("{} not found on PATH, skipping", converter);
                continue;
            }

            tracing::info!("🖼️ Using converter: {}", converter);
            match self.run_converter(*converter, pdf, out_dir).await {
                Ok(images) if !images.is_empty() => {
                    return Ok(RenderedPages {
                        converter: converter.to_string(),
                        images,
                    });
                }
                Ok(_) => {
                    tracing::warn!("{} produced no images", converter);
                    last_error = Some(ScanError::NoImagesRendered);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ScanError::ConverterUnavailable))
    }
}

/// PNG files named `<prefix>*.png` in `dir`, ordered by their numeric page suffix.
pub fn collect_page_images(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(prefix) && name.ends_with(".png"))
                .unwrap_or(false)
        })
        .collect();

    images.sort_by_key(|path| (page_index(path), path.clone()));
    Ok(images)
}

/// Deletes the images [`collect_page_images`] would return.
pub fn remove_page_images(dir: &Path, prefix: &str) -> Result<()> {
    for image in collect_page_images(dir, prefix)? {
        std::fs::remove_file(&image)?;
    }
    Ok(())
}

fn page_index(path: &Path) -> u64 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('-').next())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(u64::MAX)
}

/// `tesseract <image> stdout -l <lang>`
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            timeout,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.tesseract_binary.clone(),
            config.language.clone(),
            Duration::from_secs(config.ocr_timeout_seconds),
        )
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    async fn recognize(&self, image: &Path) -> OcrOutcome {
        let child = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Err(_) => OcrOutcome::Failure {
                reason: format!("Tesseract timed out after {:?}", self.timeout),
            },
            Ok(Err(e)) => OcrOutcome::Failure {
                reason: format!("Could not run tesseract: {}", e),
            },
            Ok(Ok(output)) if !output.status.success() => OcrOutcome::Failure {
                reason: format!(
                    "Tesseract failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            },
            Ok(Ok(output)) => OcrOutcome::Success {
                text: String::from_utf8_lossy(&output.stdout).into_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poppler_args_with_page_limit() {
        let args = Converter::Pdftoppm.args(Path::new("/in.pdf"), Path::new("/tmp/x/page"), 300, Some(1));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-png", "-r", "300", "-f", "1", "-l", "1", "/in.pdf", "/tmp/x/page"]
        );
    }

    #[test]
    fn test_convert_args() {
        let args = Converter::Convert.args(Path::new("/in.pdf"), Path::new("/tmp/x/page"), 150, Some(3));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-density", "150", "/in.pdf[0-2]", "/tmp/x/page-%d.png"]);

        let args = Converter::Convert.args(Path::new("/in.pdf"), Path::new("/tmp/x/page"), 150, None);
        assert_eq!(args[2].to_string_lossy(), "/in.pdf");
    }

    #[test]
    fn test_collect_page_images_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-01.png", "page-3.txt", "other-1.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let images = collect_page_images(dir.path(), "page").unwrap();
        let names: Vec<String> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn test_stale_pages_removed_before_next_converter() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-1.png", "page-2.png", "input.pdf", "other-1.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        remove_page_images(dir.path(), IMAGE_PREFIX).unwrap();

        assert!(collect_page_images(dir.path(), IMAGE_PREFIX).unwrap().is_empty());
        assert!(dir.path().join("input.pdf").exists());
        assert!(dir.path().join("other-1.png").exists());
    }

    #[tokio::test]
    async fn test_missing_converters_reported() {
        let rasterizer = CommandRasterizer::new(vec![], 300, None, Duration::from_secs(1));
        let dir = tempfile::tempdir().unwrap();
        let err = rasterizer
            .render(Path::new("missing.pdf"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ConverterUnavailable));
    }

    #[tokio::test]
    async fn test_missing_tesseract_binary_is_a_failure() {
        let engine = TesseractOcr::new("tesseract-does-not-exist-here", "eng", Duration::from_secs(5));
        assert!(!engine.is_available());
        let outcome = engine.recognize(Path::new("page-1.png")).await;
        assert!(!outcome.is_success());
    }
}
