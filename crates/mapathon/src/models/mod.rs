pub mod params;
pub mod report;

pub use params::{
    DataQualityParameters, DataQualityRequest, IssueType, PROJECT_HASHTAG_PREFIX,
    ReportParameters, ReportRequest,
};
pub use report::{
    DataQualityPointFeature, DataQualityProperties, DataQualityReport, FeatureCollectionType,
    FeatureType, MapathonContributor, MapathonDetail, MapathonSummary, MappedFeature,
    MappedFeatureWithUser, PointGeometry, PointType, SchemaKind, json_schema,
};
