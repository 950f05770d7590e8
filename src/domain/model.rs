use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 圖層識別碼（伺服器回傳的 datasource 字串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 圖層內的要素位置，從 0 開始依序分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureIndex(pub u64);

impl FeatureIndex {
    pub const FIRST: FeatureIndex = FeatureIndex(0);

    pub fn next(self) -> Self {
        FeatureIndex(self.0 + 1)
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLayerResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub datasource: LayerId,
    /// 伺服器額外回傳的欄位，原樣保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Value,
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: serde_json::json!([lon, lat]),
        }
    }
}

/// GeoJSON 形式的要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            kind: None,
            geometry,
            properties: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new(Geometry::point(lon, lat))
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// 比較幾何與屬性，忽略伺服器額外加上的欄位（type、id、bbox）
    pub fn same_content(&self, other: &Feature) -> bool {
        self.geometry.kind == other.geometry.kind
            && values_match(&self.geometry.coordinates, &other.geometry.coordinates)
            && self.properties.len() == other.properties.len()
            && self.properties.iter().all(|(key, value)| {
                other
                    .properties
                    .get(key)
                    .map(|theirs| values_match(value, theirs))
                    .unwrap_or(false)
            })
    }
}

impl Default for Feature {
    fn default() -> Self {
        Feature::point(10.0, -10.0).with_property("name", "test point 1")
    }
}

/// 數值以浮點比較，`10` 與 `10.0` 視為相同
fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map(|y| values_match(x, y)).unwrap_or(false))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_feature_matches_smoke_payload() {
        let body = serde_json::to_value(Feature::default()).unwrap();
        assert_eq!(
            body,
            json!({
                "geometry": {"type": "Point", "coordinates": [10.0, -10.0]},
                "properties": {"name": "test point 1"}
            })
        );
    }

    #[test]
    fn test_same_content_ignores_server_fields_and_number_form() {
        let sent = Feature::default();
        let returned: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": 7,
            "geometry": {"type": "Point", "coordinates": [10, -10]},
            "properties": {"name": "test point 1"}
        }))
        .unwrap();

        assert_eq!(returned.kind.as_deref(), Some("Feature"));
        assert!(sent.same_content(&returned));
    }

    #[test]
    fn test_server_fields_survive_reserialization() {
        let created: CreateLayerResponse = serde_json::from_value(json!({
            "status": "success",
            "datasource": "ds1",
            "owner": "x"
        }))
        .unwrap();
        let echoed = serde_json::to_value(&created).unwrap();
        assert_eq!(echoed["owner"], "x");
        assert_eq!(echoed["datasource"], "ds1");

        let fetched: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": 3,
            "geometry": {"type": "Point", "coordinates": [10, -10]},
            "properties": {"name": "test point 1"}
        }))
        .unwrap();
        assert_eq!(fetched.extra["id"], 3);
        let echoed = serde_json::to_value(&fetched).unwrap();
        assert_eq!(echoed["id"], 3);
        assert_eq!(echoed["type"], "Feature");
    }

    #[test]
    fn test_same_content_detects_differences() {
        let sent = Feature::default();
        let moved = Feature::point(10.0, -9.5).with_property("name", "test point 1");
        let renamed = Feature::point(10.0, -10.0).with_property("name", "other");
        let extra = Feature::default().with_property("color", "red");

        assert!(!sent.same_content(&moved));
        assert!(!sent.same_content(&renamed));
        assert!(!sent.same_content(&extra));
    }

    #[test]
    fn test_create_layer_response_requires_datasource() {
        let ok: CreateLayerResponse =
            serde_json::from_value(json!({"status": "ok", "datasource": "ds1"})).unwrap();
        assert_eq!(ok.datasource, LayerId::new("ds1"));

        assert!(serde_json::from_value::<CreateLayerResponse>(json!({"status": "ok"})).is_err());
        assert!(serde_json::from_value::<CreateLayerResponse>(json!({"datasource": 5})).is_err());
    }

    #[test]
    fn test_feature_index_sequence() {
        assert_eq!(FeatureIndex::FIRST.next(), FeatureIndex(1));
        assert_eq!(FeatureIndex(3).to_string(), "3");
    }
}
