use tracing::info;

use crate::db::{Database, Driver};
use crate::error::{ReportError, Result};
use crate::models::{
    MapathonContributor, MapathonDetail, MapathonSummary, MappedFeature, MappedFeatureWithUser,
    ReportParameters,
};
use crate::query::{
    ChangesetQuery, contributor_count_query, history_query, users_contributions_query,
};

const CONTRIBUTORS_COUNT_COLUMN: &str = "contributors_count";

/// Features mapped during the mapathon, most popular first, plus the number
/// of distinct contributors.
pub fn get_summary<D: Driver>(
    database: &mut Database<D>,
    params: &ReportParameters,
) -> Result<MapathonSummary> {
    let changesets = ChangesetQuery::new(params)?;

    let history = database.execute(&history_query(&changesets, false))?;
    let mapped_features = history.decode::<MappedFeature>("MappedFeature")?;

    let count = database.execute(&contributor_count_query(&changesets))?;
    let total_contributors = count
        .scalar(CONTRIBUTORS_COUNT_COLUMN)?
        .as_i64()
        .ok_or_else(|| ReportError::SchemaMismatch {
            record: "MapathonSummary",
            detail: format!("`{CONTRIBUTORS_COUNT_COLUMN}` is not an integer"),
        })?;

    info!(
        features = mapped_features.len(),
        total_contributors, "summary report assembled"
    );
    Ok(MapathonSummary {
        total_contributors,
        mapped_features,
    })
}

/// Per-user feature counts plus each contributor's building, task and editor
/// statistics.
pub fn get_detailed_report<D: Driver>(
    database: &mut Database<D>,
    params: &ReportParameters,
) -> Result<MapathonDetail> {
    let changesets = ChangesetQuery::new(params)?;

    let history = database.execute(&history_query(&changesets, true))?;
    let mapped_features = history.decode::<MappedFeatureWithUser>("MappedFeatureWithUser")?;

    let contributions = database.execute(&users_contributions_query(params, &changesets))?;
    let contributors = contributions.decode::<MapathonContributor>("MapathonContributor")?;

    info!(
        features = mapped_features.len(),
        contributors = contributors.len(),
        "detailed report assembled"
    );
    Ok(MapathonDetail {
        mapped_features,
        contributors,
    })
}
