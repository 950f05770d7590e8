use crate::config::{toml_config::TomlConfig, ProbeSettings};
use crate::domain::model::{Feature, LayerId};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "layer-probe")]
#[command(about = "Smoke-test client for a geospatial layer HTTP API")]
pub struct CliConfig {
    /// Base URL of the layer server [default: http://localhost:8888]
    #[arg(long, env = "LAYER_PROBE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds [default: 30]
    #[arg(long = "timeout", env = "LAYER_PROBE_TIMEOUT", global = true)]
    pub timeout_seconds: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a layer, add a feature, read both back and delete the layer
    Run {
        /// Print the execution report as JSON when done
        #[arg(long)]
        report_json: bool,
    },
    /// POST /api/v1/layer
    CreateLayer,
    /// GET /api/v1/layer/{id}
    GetLayer { id: String },
    /// POST /api/v1/layer/{id}/feature
    AddFeature {
        id: String,
        #[arg(long, allow_negative_numbers = true, default_value_t = 10.0)]
        lon: f64,
        #[arg(long, allow_negative_numbers = true, default_value_t = -10.0)]
        lat: f64,
        #[arg(long, default_value = "test point 1")]
        name: String,
        /// Read the feature from a GeoJSON file instead
        #[arg(long, conflicts_with_all = ["lon", "lat", "name"])]
        file: Option<PathBuf>,
    },
    /// GET /api/v1/layer/{id}/feature/{index}
    GetFeature { id: String, index: u64 },
    /// DELETE /api/v1/layer/{id}
    DeleteLayer { id: String },
    /// GET /ping
    Ping,
    /// GET /management/profile
    Profile,
}

impl Default for Command {
    fn default() -> Self {
        Command::Run { report_json: false }
    }
}

impl CliConfig {
    /// 載入設定檔（若有）並與命令列參數合併
    pub fn settings(&self) -> Result<ProbeSettings> {
        let file = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                Some(file)
            }
            None => None,
        };

        let settings = ProbeSettings::resolve(
            file.as_ref(),
            self.base_url.clone(),
            self.timeout_seconds,
        );
        settings.validate()?;
        Ok(settings)
    }
}

pub fn layer_id_arg(id: String) -> Result<LayerId> {
    validate_non_empty_string("id", &id)?;
    Ok(LayerId::new(id))
}

/// 由命令列參數或 GeoJSON 檔案建立要素
pub fn feature_from_args(
    lon: f64,
    lat: f64,
    name: &str,
    file: Option<&PathBuf>,
) -> Result<Feature> {
    match file {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(Feature::point(lon, lat).with_property("name", name)),
    }
}
