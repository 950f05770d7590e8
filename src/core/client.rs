use crate::core::{ConfigProvider, LayerApi};
use crate::domain::model::{CreateLayerResponse, Feature, FeatureIndex, LayerId};
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Instant;
use url::Url;

/// 已解碼的回應，保留原始內容供錯誤回報使用
struct Payload {
    value: Value,
    raw: String,
}

/// 圖層服務的 HTTP 客戶端
///
/// 每個呼叫各自建立並釋放連線，不保留任何狀態。
pub struct LayerClient {
    base_url: Url,
    client: Client,
}

impl LayerClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        validate_url("base_url", config.base_url())?;

        let base_url = Url::parse(config.base_url()).map_err(|e| ProbeError::ConfigError {
            message: format!("Invalid base URL '{}': {}", config.base_url(), e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProbeError::InvalidConfigValueError {
                field: "base_url".to_string(),
                value: config.base_url().to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ProbeError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        tracing::debug!(
            "HTTP client ready for {} (timeout {:?})",
            base_url,
            config.timeout()
        );

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 伺服器健康檢查 (GET /ping)
    pub async fn ping(&self) -> Result<Value> {
        let url = self.endpoint(&["ping"]);
        Ok(self.execute("ping", Method::GET, url, None).await?.value)
    }

    /// 伺服器基本資訊 (GET /management/profile)
    pub async fn server_profile(&self) -> Result<Value> {
        let url = self.endpoint(&["management", "profile"]);
        Ok(self
            .execute("server_profile", Method::GET, url, None)
            .await?
            .value)
    }

    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // new() 已確認 base URL 可作為 base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn layer_endpoint(&self, id: &LayerId, rest: &[&str]) -> Url {
        let mut segments = vec!["api", "v1", "layer", id.as_str()];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    async fn execute(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        body: Option<&Feature>,
    ) -> Result<Payload> {
        let raw = self.fetch(operation, method, url, body).await?;
        let value = decode_payload(operation, &raw)?;
        Ok(Payload { value, raw })
    }

    /// 送出請求並取回成功回應的原始內容；非 2xx 一律視為 Server 錯誤
    async fn fetch(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        body: Option<&Feature>,
    ) -> Result<String> {
        tracing::debug!("📡 {} {} {}", operation, method, url);

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(feature) = body {
            request = request.json(feature);
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;

        tracing::debug!(
            "📡 {} {} -> {} in {:?} ({} bytes)",
            method,
            url,
            status,
            started.elapsed(),
            raw.len()
        );

        if !status.is_success() {
            tracing::error!("❌ {} {} returned {}", method, url, status);
            return Err(ProbeError::Server {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: raw,
            });
        }

        Ok(raw)
    }
}

#[async_trait]
impl LayerApi for LayerClient {
    async fn create_layer(&self) -> Result<CreateLayerResponse> {
        let url = self.endpoint(&["api", "v1", "layer"]);
        let payload = self.execute("create_layer", Method::POST, url, None).await?;

        if !payload.value.is_object() {
            return Err(ProbeError::protocol(
                "create_layer",
                "expected an object containing a datasource field",
                payload.raw,
            ));
        }

        let created: CreateLayerResponse =
            serde_json::from_value(payload.value).map_err(|e| {
                ProbeError::protocol("create_layer", format!("bad datasource: {}", e), &payload.raw)
            })?;

        if created.datasource.as_str().trim().is_empty() {
            return Err(ProbeError::protocol(
                "create_layer",
                "datasource is empty",
                payload.raw,
            ));
        }

        tracing::info!("🆕 Layer created: {}", created.datasource);
        Ok(created)
    }

    async fn get_layer(&self, id: &LayerId) -> Result<Value> {
        let url = self.layer_endpoint(id, &[]);
        Ok(self.execute("get_layer", Method::GET, url, None).await?.value)
    }

    async fn create_feature(&self, id: &LayerId, feature: &Feature) -> Result<Value> {
        let url = self.layer_endpoint(id, &["feature"]);
        Ok(self
            .execute("create_feature", Method::POST, url, Some(feature))
            .await?
            .value)
    }

    async fn get_feature(&self, id: &LayerId, index: FeatureIndex) -> Result<Feature> {
        let index = index.to_string();
        let url = self.layer_endpoint(id, &["feature", index.as_str()]);
        let payload = self.execute("get_feature", Method::GET, url, None).await?;

        serde_json::from_value(payload.value).map_err(|e| {
            ProbeError::protocol("get_feature", format!("not a feature: {}", e), payload.raw)
        })
    }

    async fn delete_layer(&self, id: &LayerId) -> Result<Value> {
        let url = self.layer_endpoint(id, &[]);
        let raw = self
            .fetch("delete_layer", Method::DELETE, url, None)
            .await?;
        // 204 或空白內容：圖層已刪除，沒有確認訊息
        let value = if raw.trim().is_empty() {
            Value::Null
        } else {
            decode_payload("delete_layer", &raw)?
        };
        tracing::info!("🗑️ Layer deleted: {}", id);
        Ok(value)
    }
}

/// 解析回應內容
///
/// 部分端點回傳「JSON 字串中包著 JSON」，此時取出內層的物件或陣列；
/// 其他字串原樣保留。完全不是 JSON 時回報 ProtocolMismatch。
pub fn decode_payload(operation: &str, raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        ProbeError::protocol(operation, format!("response is not valid JSON: {}", e), raw)
    })?;

    match value {
        Value::String(inner) => {
            let nested = serde_json::from_str::<Value>(&inner);
            match nested {
                Ok(decoded @ (Value::Object(_) | Value::Array(_))) => {
                    tracing::debug!("{}: unwrapped JSON-encoded string payload", operation);
                    Ok(decoded)
                }
                _ => Ok(Value::String(inner)),
            }
        }
        other => Ok(other),
    }
}
