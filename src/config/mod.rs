#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::Feature;
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, validate_url, Validate};
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// 合併後的執行設定
///
/// 優先順序：命令列（含環境變數）> TOML 檔案 > 預設值
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub features: Vec<Feature>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            features: vec![Feature::default()],
        }
    }
}

impl ProbeSettings {
    pub fn resolve(
        file: Option<&TomlConfig>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        let defaults = Self::default();

        let base_url = base_url
            .or_else(|| file.and_then(|f| f.base_url()).map(str::to_string))
            .unwrap_or(defaults.base_url);
        let timeout_seconds = timeout_seconds
            .or_else(|| file.and_then(|f| f.timeout_seconds()))
            .unwrap_or(defaults.timeout_seconds);
        let features = match file.map(|f| f.features()) {
            Some(features) if !features.is_empty() => features.to_vec(),
            _ => defaults.features,
        };

        Self {
            base_url,
            timeout_seconds,
            features,
        }
    }
}

impl ConfigProvider for ProbeSettings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for ProbeSettings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 3600)?;
        Ok(())
    }
}
