pub mod client;
pub mod sequence;

pub use crate::domain::model::{CreateLayerResponse, Feature, FeatureIndex, Geometry, LayerId};
pub use crate::domain::ports::{ConfigProvider, LayerApi};
pub use crate::utils::error::Result;
