pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};

pub use config::{toml_config::TomlConfig, ProbeSettings};
pub use crate::core::{
    client::LayerClient,
    sequence::{SequenceReport, SmokeSequence, Step},
};
pub use domain::model::{Feature, FeatureIndex, Geometry, LayerId};
pub use utils::error::{ProbeError, Result};
