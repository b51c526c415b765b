use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ReportError, Result};

pub const PROJECT_HASHTAG_PREFIX: &str = "hotosm-project-";

/// Wire shape of a mapathon report request, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReportRequest {
    #[serde(default)]
    pub project_ids: Vec<i64>,

    #[serde(default)]
    pub hashtags: Vec<String>,

    /// RFC 3339 timestamp, inclusive.
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub from_timestamp: OffsetDateTime,

    /// RFC 3339 timestamp, inclusive.
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub to_timestamp: OffsetDateTime,
}

/// Validated filter for the summary and detailed mapathon reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParameters {
    project_ids: BTreeSet<i64>,
    hashtags: BTreeSet<String>,
    from_timestamp: OffsetDateTime,
    to_timestamp: OffsetDateTime,
}

impl ReportParameters {
    pub fn new<P, H, S>(
        project_ids: P,
        hashtags: H,
        from_timestamp: OffsetDateTime,
        to_timestamp: OffsetDateTime,
    ) -> Result<Self>
    where
        P: IntoIterator<Item = i64>,
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let project_ids = validate_project_ids(project_ids)?;
        let hashtags = hashtags
            .into_iter()
            .map(|hashtag| normalize_hashtag(hashtag.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;

        if project_ids.is_empty() && hashtags.is_empty() {
            return Err(ReportError::invalid(
                "at least one project id or hashtag is required",
            ));
        }
        if from_timestamp > to_timestamp {
            return Err(ReportError::invalid(format!(
                "from_timestamp ({from_timestamp}) is after to_timestamp ({to_timestamp})"
            )));
        }

        Ok(Self {
            project_ids,
            hashtags,
            from_timestamp,
            to_timestamp,
        })
    }

    #[must_use]
    pub fn project_ids(&self) -> &BTreeSet<i64> {
        &self.project_ids
    }

    #[must_use]
    pub fn hashtags(&self) -> &BTreeSet<String> {
        &self.hashtags
    }

    #[must_use]
    pub fn from_timestamp(&self) -> OffsetDateTime {
        self.from_timestamp
    }

    #[must_use]
    pub fn to_timestamp(&self) -> OffsetDateTime {
        self.to_timestamp
    }
}

impl TryFrom<ReportRequest> for ReportParameters {
    type Error = ReportError;

    fn try_from(request: ReportRequest) -> Result<Self> {
        Self::new(
            request.project_ids,
            request.hashtags,
            request.from_timestamp,
            request.to_timestamp,
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    BadGeometry,
    BadValue,
    IncompleteTags,
    All,
}

impl IssueType {
    /// Validation statuses the issue type selects in the `validation` table.
    #[must_use]
    pub const fn statuses(self) -> &'static [&'static str] {
        match self {
            Self::BadGeometry => &["badgeom"],
            Self::BadValue => &["badvalue"],
            Self::IncompleteTags => &["incomplete"],
            Self::All => &["badvalue", "badgeom"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DataQualityRequest {
    pub project_ids: Vec<i64>,
    pub issue_types: Vec<IssueType>,
}

/// Validated filter for the data-quality report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityParameters {
    project_ids: BTreeSet<i64>,
    issue_types: BTreeSet<IssueType>,
}

impl DataQualityParameters {
    pub fn new<P, I>(project_ids: P, issue_types: I) -> Result<Self>
    where
        P: IntoIterator<Item = i64>,
        I: IntoIterator<Item = IssueType>,
    {
        let project_ids = validate_project_ids(project_ids)?;
        if project_ids.is_empty() {
            return Err(ReportError::invalid(
                "data quality report requires at least one project id",
            ));
        }
        let issue_types = issue_types.into_iter().collect::<BTreeSet<_>>();
        if issue_types.is_empty() {
            return Err(ReportError::invalid(
                "data quality report requires at least one issue type",
            ));
        }

        Ok(Self {
            project_ids,
            issue_types,
        })
    }

    #[must_use]
    pub fn project_ids(&self) -> &BTreeSet<i64> {
        &self.project_ids
    }

    #[must_use]
    pub fn issue_types(&self) -> &BTreeSet<IssueType> {
        &self.issue_types
    }

    /// Changeset hashtags identifying the requested projects.
    #[must_use]
    pub fn project_hashtags(&self) -> Vec<String> {
        self.project_ids
            .iter()
            .map(|id| format!("{PROJECT_HASHTAG_PREFIX}{id}"))
            .collect()
    }

    /// Distinct validation statuses, in first-seen order.
    #[must_use]
    pub fn statuses(&self) -> Vec<&'static str> {
        let mut statuses: Vec<&'static str> = Vec::new();
        for status in self
            .issue_types
            .iter()
            .flat_map(|issue_type| issue_type.statuses())
        {
            if !statuses.contains(status) {
                statuses.push(*status);
            }
        }
        statuses
    }
}

impl TryFrom<DataQualityRequest> for DataQualityParameters {
    type Error = ReportError;

    fn try_from(request: DataQualityRequest) -> Result<Self> {
        Self::new(request.project_ids, request.issue_types)
    }
}

fn validate_project_ids<P>(project_ids: P) -> Result<BTreeSet<i64>>
where
    P: IntoIterator<Item = i64>,
{
    project_ids
        .into_iter()
        .map(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(ReportError::invalid(format!(
                    "project id must be positive, got {id}"
                )))
            }
        })
        .collect()
}

fn normalize_hashtag(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return Err(ReportError::invalid(format!(
            "hashtag must not be empty, got `{raw}`"
        )));
    }
    Ok(trimmed.to_string())
}
