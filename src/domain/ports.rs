use crate::domain::model::{CreateLayerResponse, Feature, FeatureIndex, LayerId};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout(&self) -> Duration;
}

/// 圖層服務的 HTTP 介面
#[async_trait]
pub trait LayerApi: Send + Sync {
    async fn create_layer(&self) -> Result<CreateLayerResponse>;
    async fn get_layer(&self, id: &LayerId) -> Result<Value>;
    async fn create_feature(&self, id: &LayerId, feature: &Feature) -> Result<Value>;
    async fn get_feature(&self, id: &LayerId, index: FeatureIndex) -> Result<Feature>;
    async fn delete_layer(&self, id: &LayerId) -> Result<Value>;
}
