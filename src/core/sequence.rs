use crate::core::LayerApi;
use crate::domain::model::{Feature, FeatureIndex, LayerId};
use crate::utils::error::{ProbeError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CreateLayer,
    GetLayer,
    CreateFeature,
    GetFeature,
    DeleteLayer,
}

impl Step {
    pub fn method(&self) -> &'static str {
        match self {
            Step::CreateLayer | Step::CreateFeature => "POST",
            Step::GetLayer | Step::GetFeature => "GET",
            Step::DeleteLayer => "DELETE",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::CreateLayer => "CREATE LAYER",
            Step::GetLayer => "GET LAYER",
            Step::CreateFeature => "POST FEATURE",
            Step::GetFeature => "GET FEATURE",
            Step::DeleteLayer => "DELETE LAYER",
        }
    }
}

/// 單一步驟的執行紀錄
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub method: &'static str,
    pub path: String,
    pub elapsed_ms: u64,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceReport {
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
    pub datasource: LayerId,
    pub steps: Vec<StepRecord>,
    pub feature_round_trip: bool,
}

impl SequenceReport {
    pub fn step(&self, step: Step) -> Option<&StepRecord> {
        self.steps.iter().find(|record| record.step == step)
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ProbeError::SerializationError)
    }
}

/// 依序執行建立圖層、讀取、新增要素、讀取要素、刪除圖層
///
/// 任何一步失敗即停止，後續步驟都依賴第一步回傳的 datasource。
pub struct SmokeSequence<A: LayerApi> {
    api: A,
    features: Vec<Feature>,
    execution_id: String,
    echo: bool,
}

impl<A: LayerApi> SmokeSequence<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            features: vec![Feature::default()],
            execution_id: format!("smoke_{}", Utc::now().format("%Y%m%d_%H%M%S")),
            echo: true,
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        if !features.is_empty() {
            self.features = features;
        }
        self
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = execution_id.into();
        self
    }

    /// 是否將每一步的原始回應印到 stdout
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub async fn run(&self) -> Result<SequenceReport> {
        let started_at = Utc::now();
        let mut steps = Vec::new();

        tracing::info!("🚀 Starting smoke sequence {}", self.execution_id);

        let timer = Instant::now();
        let created = self.api.create_layer().await?;
        let id = created.datasource.clone();
        let payload = serde_json::to_value(&created)?;
        self.record(&mut steps, Step::CreateLayer, "/api/v1/layer".to_string(), payload, timer);

        let layer_path = format!("/api/v1/layer/{}", id);

        let timer = Instant::now();
        let layer = self.api.get_layer(&id).await?;
        self.record(&mut steps, Step::GetLayer, layer_path.clone(), layer, timer);

        let mut index = FeatureIndex::FIRST;
        let mut posted = Vec::with_capacity(self.features.len());
        for feature in &self.features {
            let timer = Instant::now();
            let ack = self.api.create_feature(&id, feature).await?;
            self.record(
                &mut steps,
                Step::CreateFeature,
                format!("{}/feature", layer_path),
                ack,
                timer,
            );
            posted.push((index, feature));
            index = index.next();
        }

        let mut round_trip = true;
        for (index, sent) in posted {
            let timer = Instant::now();
            let fetched = self.api.get_feature(&id, index).await?;
            if !sent.same_content(&fetched) {
                tracing::warn!(
                    "⚠️ Feature {} of layer {} differs from what was posted",
                    index,
                    id
                );
                round_trip = false;
            }
            let payload = serde_json::to_value(&fetched)?;
            self.record(
                &mut steps,
                Step::GetFeature,
                format!("{}/feature/{}", layer_path, index),
                payload,
                timer,
            );
        }

        let timer = Instant::now();
        let confirmation = self.api.delete_layer(&id).await?;
        self.record(&mut steps, Step::DeleteLayer, layer_path, confirmation, timer);

        tracing::info!(
            "✅ Smoke sequence {} finished: {} steps, round trip {}",
            self.execution_id,
            steps.len(),
            if round_trip { "ok" } else { "MISMATCH" }
        );

        Ok(SequenceReport {
            execution_id: self.execution_id.clone(),
            started_at,
            datasource: id,
            steps,
            feature_round_trip: round_trip,
        })
    }

    fn record(
        &self,
        steps: &mut Vec<StepRecord>,
        step: Step,
        path: String,
        payload: Value,
        timer: Instant,
    ) {
        let elapsed = timer.elapsed();
        tracing::info!("📡 {} {} ({:?})", step.method(), path, elapsed);

        if self.echo {
            println!("{}", step.title());
            println!("{}", payload);
            println!();
        }

        steps.push(StepRecord {
            step,
            method: step.method(),
            path,
            elapsed_ms: elapsed.as_millis() as u64,
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CreateLayerResponse;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<String>>,
        missing_datasource: bool,
        failing_get_layer: bool,
        stored: Mutex<Vec<Feature>>,
        tamper: bool,
    }

    impl MockApi {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LayerApi for MockApi {
        async fn create_layer(&self) -> Result<CreateLayerResponse> {
            self.log("create_layer".to_string());
            if self.missing_datasource {
                return Err(ProbeError::protocol(
                    "create_layer",
                    "missing field `datasource`",
                    r#"{"status":"ok"}"#,
                ));
            }
            Ok(CreateLayerResponse {
                status: Some("ok".to_string()),
                datasource: LayerId::new("ds1"),
                extra: serde_json::Map::new(),
            })
        }

        async fn get_layer(&self, id: &LayerId) -> Result<Value> {
            self.log(format!("get_layer {}", id));
            if self.failing_get_layer {
                return Err(ProbeError::Server {
                    operation: "get_layer".to_string(),
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(json!({"type": "FeatureCollection", "features": []}))
        }

        async fn create_feature(&self, id: &LayerId, feature: &Feature) -> Result<Value> {
            self.log(format!("create_feature {}", id));
            self.stored.lock().unwrap().push(feature.clone());
            Ok(json!({"status": "ok", "datasource": id, "message": "feature added"}))
        }

        async fn get_feature(&self, id: &LayerId, index: FeatureIndex) -> Result<Feature> {
            self.log(format!("get_feature {} {}", id, index));
            let mut feature = self.stored.lock().unwrap()[index.0 as usize].clone();
            feature.kind = Some("Feature".to_string());
            if self.tamper {
                feature = feature.with_property("name", "tampered");
            }
            Ok(feature)
        }

        async fn delete_layer(&self, id: &LayerId) -> Result<Value> {
            self.log(format!("delete_layer {}", id));
            Ok(json!({"status": "ok", "datasource": id, "result": "datasource deleted"}))
        }
    }

    #[tokio::test]
    async fn test_full_sequence_in_order() {
        let sequence = SmokeSequence::new(MockApi::default())
            .with_echo(false)
            .with_execution_id("test_run");

        let report = sequence.run().await.unwrap();

        assert_eq!(report.execution_id, "test_run");
        assert_eq!(report.datasource, LayerId::new("ds1"));
        assert!(report.feature_round_trip);
        assert_eq!(
            sequence.api.calls(),
            vec![
                "create_layer",
                "get_layer ds1",
                "create_feature ds1",
                "get_feature ds1 0",
                "delete_layer ds1",
            ]
        );

        let fetched = report.step(Step::GetFeature).unwrap();
        assert_eq!(fetched.path, "/api/v1/layer/ds1/feature/0");
        assert_eq!(fetched.payload["properties"]["name"], "test point 1");
        assert_eq!(report.step(Step::DeleteLayer).unwrap().method, "DELETE");
    }

    #[tokio::test]
    async fn test_missing_datasource_stops_sequence() {
        let api = MockApi {
            missing_datasource: true,
            ..Default::default()
        };
        let sequence = SmokeSequence::new(api).with_echo(false);

        let err = sequence.run().await.unwrap_err();

        assert!(matches!(err, ProbeError::ProtocolMismatch { .. }));
        assert_eq!(sequence.api.calls(), vec!["create_layer"]);
    }

    #[tokio::test]
    async fn test_server_error_halts_before_delete() {
        let api = MockApi {
            failing_get_layer: true,
            ..Default::default()
        };
        let sequence = SmokeSequence::new(api).with_echo(false);

        let err = sequence.run().await.unwrap_err();

        assert_eq!(err.raw_payload(), Some("boom"));
        assert_eq!(sequence.api.calls(), vec!["create_layer", "get_layer ds1"]);
    }

    #[tokio::test]
    async fn test_round_trip_mismatch_is_reported_not_fatal() {
        let api = MockApi {
            tamper: true,
            ..Default::default()
        };
        let sequence = SmokeSequence::new(api).with_echo(false);

        let report = sequence.run().await.unwrap();

        assert!(!report.feature_round_trip);
        assert!(report.step(Step::DeleteLayer).is_some());
    }

    #[tokio::test]
    async fn test_features_get_sequential_indices() {
        let features = vec![
            Feature::point(1.0, 2.0).with_property("name", "a"),
            Feature::point(3.0, 4.0).with_property("name", "b"),
        ];
        let sequence = SmokeSequence::new(MockApi::default())
            .with_echo(false)
            .with_features(features);

        let report = sequence.run().await.unwrap();

        assert!(report.feature_round_trip);
        let calls = sequence.api.calls();
        assert!(calls.contains(&"get_feature ds1 0".to_string()));
        assert!(calls.contains(&"get_feature ds1 1".to_string()));
        assert_eq!(report.steps.len(), 7);
    }
}
