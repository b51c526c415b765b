use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MappedFeature {
    pub feature: String,
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MappedFeatureWithUser {
    pub feature: String,
    pub action: String,
    pub count: i64,
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MapathonContributor {
    pub user_id: i64,
    pub username: String,
    pub total_buildings: i64,
    pub mapped_tasks: i64,
    pub validated_tasks: i64,

    /// Editors the user worked with during the window, as reported by
    /// `editors_per_user`.
    pub editors: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MapathonSummary {
    pub total_contributors: i64,
    pub mapped_features: Vec<MappedFeature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MapathonDetail {
    pub mapped_features: Vec<MappedFeatureWithUser>,
    pub contributors: Vec<MapathonContributor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FeatureCollectionType {
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FeatureType {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PointType {
    Point,
}

/// GeoJSON point; `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: PointType,
    pub coordinates: [f64; 2],
}

impl PointGeometry {
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: PointType::Point,
            coordinates: [longitude, latitude],
        }
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataQualityProperties {
    pub osm_id: i64,
    pub changeset_id: i64,
    pub changeset_timestamp: String,
    pub issue_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataQualityPointFeature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub geometry: PointGeometry,
    pub properties: DataQualityProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataQualityReport {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    pub features: Vec<DataQualityPointFeature>,
}

impl DataQualityReport {
    #[must_use]
    pub fn new(features: Vec<DataQualityPointFeature>) -> Self {
        Self {
            kind: FeatureCollectionType::FeatureCollection,
            features,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    ReportRequest,
    DataQualityRequest,
    Summary,
    Detail,
    DataQuality,
}

#[must_use]
pub fn json_schema(kind: SchemaKind) -> Value {
    let schema = match kind {
        SchemaKind::ReportRequest => schemars::schema_for!(super::ReportRequest),
        SchemaKind::DataQualityRequest => schemars::schema_for!(super::DataQualityRequest),
        SchemaKind::Summary => schemars::schema_for!(MapathonSummary),
        SchemaKind::Detail => schemars::schema_for!(MapathonDetail),
        SchemaKind::DataQuality => schemars::schema_for!(DataQualityReport),
    };
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated report schema: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{
        DataQualityPointFeature, DataQualityProperties, DataQualityReport, FeatureType,
        PointGeometry, SchemaKind, json_schema,
    };

    #[test]
    fn data_quality_report_serializes_as_geojson() {
        let report = DataQualityReport::new(vec![DataQualityPointFeature {
            kind: FeatureType::Feature,
            geometry: PointGeometry::new(83.814697, 28.24),
            properties: DataQualityProperties {
                osm_id: 1100,
                changeset_id: 1500,
                changeset_timestamp: "2021-08-27 09:00:00".to_string(),
                issue_type: "badgeom".to_string(),
            },
        }]);

        let encoded = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(
            encoded,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [83.814697, 28.24] },
                    "properties": {
                        "osm_id": 1100,
                        "changeset_id": 1500,
                        "changeset_timestamp": "2021-08-27 09:00:00",
                        "issue_type": "badgeom"
                    }
                }]
            })
        );
    }

    #[test]
    fn summary_schema_requires_contributor_total() {
        let schema = json_schema(SchemaKind::Summary);
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .expect("schema must include required list");

        assert!(
            required
                .iter()
                .any(|value| value.as_str() == Some("total_contributors"))
        );
    }
}
