use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::db::{Database, Driver};
use crate::error::{ReportError, Result};
use crate::models::{
    DataQualityParameters, DataQualityPointFeature, DataQualityProperties, DataQualityReport,
    FeatureType, PointGeometry,
};
use crate::query::data_quality_query;

const GEOMETRY_RECORD: &str = "PointGeometry";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValidationRow {
    osm_id: i64,
    changeset_id: i64,
    changeset_timestamp: String,
    issue_type: String,
    geometry: Value,
}

/// Validation issues found in the projects' changesets, as a GeoJSON point
/// collection.
pub fn get_data_quality_report<D: Driver>(
    database: &mut Database<D>,
    params: &DataQualityParameters,
) -> Result<DataQualityReport> {
    let rows = database.execute(&data_quality_query(params)?)?;

    let features = rows
        .decode::<ValidationRow>("ValidationRow")?
        .into_iter()
        .map(|row| {
            Ok(DataQualityPointFeature {
                kind: FeatureType::Feature,
                geometry: geometry_to_point(&row.geometry)?,
                properties: DataQualityProperties {
                    osm_id: row.osm_id,
                    changeset_id: row.changeset_id,
                    changeset_timestamp: row.changeset_timestamp,
                    issue_type: row.issue_type,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(features = features.len(), "data quality report assembled");
    Ok(DataQualityReport::new(features))
}

/// Converts a GeoJSON point geometry, given as an object or as the text
/// `ST_AsGeoJSON` returns, to `(longitude, latitude)`.
pub fn geometry_to_point(geometry: &Value) -> Result<PointGeometry> {
    match geometry {
        Value::String(text) => {
            let parsed = serde_json::from_str::<Value>(text)
                .map_err(|error| mismatch(format!("geometry is not valid GeoJSON: {error}")))?;
            if parsed.is_string() {
                return Err(mismatch("geometry text must encode an object".to_string()));
            }
            geometry_to_point(&parsed)
        }
        Value::Object(object) => {
            match object.get("type").and_then(Value::as_str) {
                Some("Point") => {}
                Some(other) => {
                    return Err(mismatch(format!("expected a Point geometry, got {other}")));
                }
                None => return Err(mismatch("geometry has no `type`".to_string())),
            }
            let coordinates = object
                .get("coordinates")
                .and_then(Value::as_array)
                .ok_or_else(|| mismatch("point has no coordinate array".to_string()))?;
            let (longitude, latitude) = match coordinates.as_slice() {
                [longitude, latitude] | [longitude, latitude, _] => (
                    coordinate(longitude, "longitude")?,
                    coordinate(latitude, "latitude")?,
                ),
                other => {
                    return Err(mismatch(format!(
                        "point needs 2 or 3 coordinates, got {}",
                        other.len()
                    )));
                }
            };
            if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
                return Err(mismatch(format!(
                    "coordinates out of range: ({longitude}, {latitude})"
                )));
            }
            Ok(PointGeometry::new(longitude, latitude))
        }
        Value::Null => Err(mismatch("geometry is null".to_string())),
        other => Err(mismatch(format!("unsupported geometry value: {other}"))),
    }
}

fn coordinate(value: &Value, axis: &str) -> Result<f64> {
    value
        .as_f64()
        .filter(|number| number.is_finite())
        .ok_or_else(|| mismatch(format!("{axis} is not a number: {value}")))
}

fn mismatch(detail: String) -> ReportError {
    ReportError::SchemaMismatch {
        record: GEOMETRY_RECORD,
        detail,
    }
}
