use crate::adapters::ocr::Converter;
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_FILE_MB: u64 = 200;
pub const MAX_FILE_MB_LIMIT: u64 = 10 * 1024;

static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_file_mb: u64,
    pub static_dir: String,
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_file_mb: DEFAULT_MAX_FILE_MB,
            static_dir: "public".to_string(),
            log_format: "compact".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub enabled: bool,
    pub dpi: u32,
    pub language: String,
    pub converters: Vec<Converter>,
    pub tesseract_binary: String,
    pub render_timeout_seconds: u64,
    pub ocr_timeout_seconds: u64,
    /// Only the first N pages are rendered when set.
    pub max_pages: Option<u32>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dpi: 300,
            language: "eng".to_string(),
            converters: vec![Converter::Pdftocairo, Converter::Pdftoppm, Converter::Convert],
            tesseract_binary: "tesseract".to_string(),
            render_timeout_seconds: 30,
            ocr_timeout_seconds: 120,
            max_pages: None,
        }
    }
}

impl Validate for OcrConfig {
    fn validate(&self) -> Result<()> {
        validate_range("ocr.dpi", self.dpi, 72, 1200)?;
        validate_non_empty_string("ocr.language", &self.language)?;
        validate_non_empty_string("ocr.tesseract_binary", &self.tesseract_binary)?;
        validate_positive_number("ocr.render_timeout_seconds", self.render_timeout_seconds, 1)?;
        validate_positive_number("ocr.ocr_timeout_seconds", self.ocr_timeout_seconds, 1)?;
        if let Some(max_pages) = self.max_pages {
            validate_positive_number("ocr.max_pages", max_pages as u64, 1)?;
        }
        if self.enabled && self.converters.is_empty() {
            return Err(ScanError::ConfigValidationError {
                field: "ocr.converters".to_string(),
                message: "at least one converter is required while OCR is enabled".to_string(),
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TESSDATA_LANG})，未設定者保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Config file (when given), then `HOST`/`PORT`/`MAX_FILE_MB`, then validation.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }

        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }

        // 無效或為 0 的 MAX_FILE_MB 回到預設值
        if let Some(max_mb) = lookup("MAX_FILE_MB") {
            self.server.max_file_mb = match max_mb.trim().parse::<u64>() {
                Ok(mb) if mb > 0 => mb,
                _ => {
                    tracing::warn!(
                        "Invalid MAX_FILE_MB '{}', using {}MB",
                        max_mb,
                        DEFAULT_MAX_FILE_MB
                    );
                    DEFAULT_MAX_FILE_MB
                }
            };
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_range("server.max_file_mb", self.server.max_file_mb, 1, MAX_FILE_MB_LIMIT)?;
        validate_path("server.static_dir", &self.server.static_dir)?;

        let formats = ["compact", "json"];
        if !formats.contains(&self.server.log_format.as_str()) {
            return Err(ScanError::InvalidConfigValueError {
                field: "server.log_format".to_string(),
                value: self.server.log_format.clone(),
                reason: format!("Unsupported format. Valid formats: {}", formats.join(", ")),
            });
        }

        self.ocr.validate()
    }
}
