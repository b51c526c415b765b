use super::filter::{any_array_filter, hashtag_filter, timestamp_filter};
use super::statement::{SqlFragment, Statement, StatementBuilder};
use crate::error::Result;
use crate::models::{DataQualityParameters, ReportParameters};

pub const HISTORY_LABEL: &str = "osm_history";
pub const CONTRIBUTIONS_LABEL: &str = "user_contributions";
pub const CONTRIBUTOR_COUNT_LABEL: &str = "contributor_count";
pub const DATA_QUALITY_LABEL: &str = "data_quality";

const BUILDING_FEATURE: &str = "building";

/// Changesets matching the mapathon's hashtag and time window, projected to
/// `(user_id, changeset_id, username)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangesetQuery {
    hashtag_filter: SqlFragment,
    timestamp_filter: SqlFragment,
}

impl ChangesetQuery {
    pub fn new(params: &ReportParameters) -> Result<Self> {
        Ok(Self {
            hashtag_filter: hashtag_filter(params.project_ids(), params.hashtags())?,
            timestamp_filter: timestamp_filter(params.from_timestamp(), params.to_timestamp())?,
        })
    }

    #[must_use]
    pub fn hashtag_filter(&self) -> &SqlFragment {
        &self.hashtag_filter
    }

    #[must_use]
    pub fn timestamp_filter(&self) -> &SqlFragment {
        &self.timestamp_filter
    }

    /// `<timestamp filter> AND (<hashtag filter>)`
    #[must_use]
    pub fn where_clause(&self) -> SqlFragment {
        let mut clause = SqlFragment::new();
        clause
            .push_fragment(&self.timestamp_filter)
            .push_sql(" AND (")
            .push_fragment(&self.hashtag_filter)
            .push_sql(")");
        clause
    }

    #[must_use]
    pub fn select(&self) -> SqlFragment {
        let mut select = SqlFragment::sql(
            "SELECT user_id, id AS changeset_id, user_name AS username\n\
             FROM osm_changeset\n\
             WHERE ",
        );
        select.push_fragment(&self.where_clause());
        select
    }
}

/// Per-feature edit counts over the changesets, optionally split per user.
///
/// Without usernames the rows rank by popularity (`count DESC`); with
/// usernames they are grouped per user (`user_id, action, count`).
#[must_use]
pub fn history_query(changesets: &ChangesetQuery, include_username: bool) -> Statement {
    let mut columns = vec![
        "(each(h.tags)).key AS feature",
        "h.action::text AS action",
        "count(DISTINCT h.id) AS count",
    ];
    let mut group_by = vec!["feature", "h.action"];
    if include_username {
        columns.extend(["t1.user_id", "t1.username"]);
        group_by.extend(["t1.user_id", "t1.username"]);
    }
    let order_by = if include_username {
        "user_id, action, count"
    } else {
        "count DESC"
    };

    let mut builder = StatementBuilder::new(HISTORY_LABEL);
    builder
        .push_sql("WITH t1 AS (\n")
        .push_fragment(&changesets.select())
        .push_sql("\n)\nSELECT ")
        .push_sql(&columns.join(", "))
        .push_sql(
            "\nFROM osm_element_history AS h, t1\n\
             WHERE t1.changeset_id = h.changeset\n\
             GROUP BY ",
        )
        .push_sql(&group_by.join(", "))
        .push_sql("\nORDER BY ")
        .push_sql(order_by);
    builder.finish()
}

/// Distinct users behind the matching changesets.
#[must_use]
pub fn contributor_count_query(changesets: &ChangesetQuery) -> Statement {
    let mut builder = StatementBuilder::new(CONTRIBUTOR_COUNT_LABEL);
    builder
        .push_sql(
            "SELECT COUNT(DISTINCT user_id) AS contributors_count\n\
             FROM osm_changeset\n\
             WHERE ",
        )
        .push_fragment(&changesets.where_clause());
    builder.finish()
}

/// Per-user building totals joined with task and editor statistics from the
/// `tasks_per_user` / `editors_per_user` database functions.
#[must_use]
pub fn users_contributions_query(params: &ReportParameters, changesets: &ChangesetQuery) -> Statement {
    let project_ids = params
        .project_ids()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut builder = StatementBuilder::new(CONTRIBUTIONS_LABEL);
    builder
        .push_sql("WITH t1 AS (\n")
        .push_fragment(&changesets.select())
        .push_sql(
            "\n),\n\
             t2 AS (\n    \
                 SELECT (each(h.tags)).key AS feature, t1.user_id, t1.username, count(DISTINCT h.id) AS count\n    \
                 FROM osm_element_history AS h, t1\n    \
                 WHERE t1.changeset_id = h.changeset\n    \
                 GROUP BY feature, t1.user_id, t1.username\n\
             ),\n\
             t3 AS (\n    \
                 SELECT user_id, username, SUM(count)::bigint AS total_buildings\n    \
                 FROM t2\n    \
                 WHERE feature = '",
        )
        .push_sql(BUILDING_FEATURE)
        .push_sql(
            "'\n    \
                 GROUP BY user_id, username\n\
             )\n\
             SELECT user_id, username, total_buildings,\n    \
                 public.tasks_per_user(user_id, ",
        );
    push_task_args(&mut builder, &project_ids, params);
    builder.push_sql(", 'MAPPED') AS mapped_tasks,\n    public.tasks_per_user(user_id, ");
    push_task_args(&mut builder, &project_ids, params);
    builder
        .push_sql(", 'VALIDATED') AS validated_tasks,\n    public.editors_per_user(user_id, ")
        .push_bind(params.from_timestamp())
        .push_sql(", ")
        .push_bind(params.to_timestamp())
        .push_sql(")::text AS editors\nFROM t3\nORDER BY user_id");
    builder.finish()
}

fn push_task_args(builder: &mut StatementBuilder, project_ids: &str, params: &ReportParameters) {
    builder
        .push_bind(project_ids)
        .push_sql(", ")
        .push_bind(params.from_timestamp())
        .push_sql(", ")
        .push_bind(params.to_timestamp());
}

/// Validation findings for the projects' changesets, with the geometry as
/// GeoJSON text.
pub fn data_quality_query(params: &DataQualityParameters) -> Result<Statement> {
    let hashtag_filter = any_array_filter("hashtags", &params.project_hashtags())?;
    let status_filter = any_array_filter("status", &params.statuses())?;

    let mut builder = StatementBuilder::new(DATA_QUALITY_LABEL);
    builder
        .push_sql(
            "WITH t1 AS (\n    \
                 SELECT id\n    \
                 FROM changesets\n    \
                 WHERE ",
        )
        .push_fragment(&hashtag_filter)
        .push_sql(
            "\n),\n\
             t2 AS (\n    \
                 SELECT v.osm_id,\n        \
                     v.change_id AS changeset_id,\n        \
                     v.timestamp::text AS changeset_timestamp,\n        \
                     v.status::text AS issue_type,\n        \
                     ST_AsGeoJSON(v.location::geometry) AS geometry\n    \
                 FROM validation AS v\n    \
                 JOIN t1 ON v.change_id = t1.id\n    \
                 WHERE ",
        )
        .push_fragment(&status_filter)
        .push_sql(
            "\n)\n\
             SELECT osm_id, changeset_id, changeset_timestamp, issue_type, geometry\n\
             FROM t2\n\
             ORDER BY changeset_id, osm_id",
        );
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{
        ChangesetQuery, contributor_count_query, data_quality_query, history_query,
        users_contributions_query,
    };
    use crate::models::{DataQualityParameters, IssueType, ReportParameters};
    use crate::query::statement::SqlParam;

    fn params() -> ReportParameters {
        ReportParameters::new(
            [5],
            ["mapathon"],
            datetime!(2021-08-01 00:00 UTC),
            datetime!(2021-08-31 23:59 UTC),
        )
        .expect("params should validate")
    }

    #[test]
    fn changeset_select_puts_time_window_before_tag_match() {
        let changesets = ChangesetQuery::new(&params()).expect("changeset query should build");
        let (sql, params) = changesets.select().render();

        assert!(sql.starts_with("SELECT user_id, id AS changeset_id, user_name AS username\n"));
        assert!(sql.contains("WHERE \"created_at\" BETWEEN $1 AND $2 AND ((\"tags\" -> $3) LIKE $4"));
        assert!(sql.ends_with("LIKE $10)"));
        assert_eq!(params.len(), 10);
    }

    #[test]
    fn summary_history_ranks_by_count() {
        let changesets = ChangesetQuery::new(&params()).expect("changeset query should build");
        let statement = history_query(&changesets, false);

        assert!(statement.sql().starts_with("WITH t1 AS (\nSELECT user_id"));
        assert!(statement.sql().contains("GROUP BY feature, h.action\n"));
        assert!(statement.sql().ends_with("ORDER BY count DESC"));
        assert!(
            statement.sql().contains(", h.action::text AS action, "),
            "enum-typed action must be cast to text: {}",
            statement.sql()
        );
        assert!(!statement.sql().contains("t1.username"));
        assert_eq!(statement.params().len(), 10);
    }

    #[test]
    fn detailed_history_groups_per_user() {
        let changesets = ChangesetQuery::new(&params()).expect("changeset query should build");
        let statement = history_query(&changesets, true);

        assert!(statement.sql().contains(
            "SELECT (each(h.tags)).key AS feature, h.action::text AS action, count(DISTINCT h.id) AS count, t1.user_id, t1.username\n"
        ));
        assert!(
            statement
                .sql()
                .contains("GROUP BY feature, h.action, t1.user_id, t1.username\n")
        );
        assert!(statement.sql().ends_with("ORDER BY user_id, action, count"));
    }

    #[test]
    fn contributor_count_reuses_changeset_filters() {
        let changesets = ChangesetQuery::new(&params()).expect("changeset query should build");
        let statement = contributor_count_query(&changesets);

        assert!(
            statement
                .sql()
                .starts_with("SELECT COUNT(DISTINCT user_id) AS contributors_count\nFROM osm_changeset\nWHERE \"created_at\" BETWEEN $1 AND $2")
        );
        assert_eq!(statement.params().len(), 10);
    }

    #[test]
    fn contributions_query_binds_function_arguments() {
        let params = ReportParameters::new(
            [7, 5],
            Vec::<String>::new(),
            datetime!(2021-08-01 00:00 UTC),
            datetime!(2021-08-31 23:59 UTC),
        )
        .expect("params should validate");
        let changesets = ChangesetQuery::new(&params).expect("changeset query should build");
        let statement = users_contributions_query(&params, &changesets);

        // 2 time bounds + 4 tag clauses * 2 binds, then 3 + 3 + 2 function arguments
        assert_eq!(statement.params().len(), 10 + 8);
        assert!(
            statement
                .sql()
                .contains("public.tasks_per_user(user_id, $11, $12, $13, 'MAPPED') AS mapped_tasks")
        );
        assert!(
            statement
                .sql()
                .contains("public.tasks_per_user(user_id, $14, $15, $16, 'VALIDATED') AS validated_tasks")
        );
        assert!(
            statement
                .sql()
                .contains("public.editors_per_user(user_id, $17, $18)::text AS editors")
        );
        assert_eq!(statement.params()[10], SqlParam::Text("5,7".to_string()));
        assert_eq!(
            statement.params()[16],
            SqlParam::Timestamp(datetime!(2021-08-01 00:00 UTC))
        );
        assert!(!statement.sql().contains("2021-08"));
        assert!(statement.sql().contains("WHERE feature = 'building'"));
    }

    #[test]
    fn data_quality_query_binds_hashtags_and_statuses() {
        let params = DataQualityParameters::new([5, 9], [IssueType::All])
            .expect("params should validate");
        let statement = data_quality_query(&params).expect("query should build");

        assert!(statement.sql().contains(
            "WHERE $1::text = ANY(\"hashtags\"::text[]) OR $2::text = ANY(\"hashtags\"::text[])\n"
        ));
        assert!(statement.sql().contains(
            "WHERE $3::text = ANY(\"status\"::text[]) OR $4::text = ANY(\"status\"::text[])\n"
        ));
        assert_eq!(
            statement.params(),
            &[
                SqlParam::Text("hotosm-project-5".to_string()),
                SqlParam::Text("hotosm-project-9".to_string()),
                SqlParam::Text("badvalue".to_string()),
                SqlParam::Text("badgeom".to_string()),
            ]
        );
        assert!(!statement.sql().contains("hotosm-project"));
    }
}
