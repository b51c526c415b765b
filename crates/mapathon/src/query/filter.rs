use std::collections::BTreeSet;

use time::OffsetDateTime;

use super::statement::SqlFragment;
use crate::error::{ReportError, Result};
use crate::models::PROJECT_HASHTAG_PREFIX;

pub const HSTORE_COLUMN: &str = "tags";
pub const TIMESTAMP_COLUMN: &str = "created_at";
pub const HASHTAGS_TAG_KEY: &str = "hashtags";
pub const COMMENT_TAG_KEY: &str = "comment";

/// Matches changesets whose `hashtags` or `comment` tag mentions any of the
/// projects or hashtags.
///
/// Emits one `("tags" -> $k) LIKE $m` clause per candidate: first the
/// space-terminated patterns against the `hashtags` key, then the
/// semicolon-terminated patterns against the `comment` key. Each group lists
/// projects before hashtags.
pub fn hashtag_filter(project_ids: &BTreeSet<i64>, hashtags: &BTreeSet<String>) -> Result<SqlFragment> {
    if project_ids.is_empty() && hashtags.is_empty() {
        return Err(ReportError::invalid(
            "hashtag filter needs at least one project id or hashtag",
        ));
    }

    let tokens = project_ids
        .iter()
        .map(|id| escape_like(&format!("{PROJECT_HASHTAG_PREFIX}{id}")))
        .chain(hashtags.iter().map(|hashtag| escape_like(hashtag)))
        .collect::<Vec<_>>();

    let clauses = tokens
        .iter()
        .map(|token| tag_like_clause(HASHTAGS_TAG_KEY, format!("%{token} %")))
        .chain(
            tokens
                .iter()
                .map(|token| tag_like_clause(COMMENT_TAG_KEY, format!("%{token};%"))),
        )
        .collect::<Vec<_>>();

    Ok(SqlFragment::join(&clauses, " OR "))
}

/// `"created_at" BETWEEN $a AND $b`, inclusive on both ends.
pub fn timestamp_filter(from: OffsetDateTime, to: OffsetDateTime) -> Result<SqlFragment> {
    if from > to {
        return Err(ReportError::invalid(format!(
            "timestamp filter lower bound ({from}) is after upper bound ({to})"
        )));
    }

    let mut fragment = SqlFragment::sql(format!("{} BETWEEN ", quote_identifier(TIMESTAMP_COLUMN)));
    fragment.push_bind(from).push_sql(" AND ").push_bind(to);
    Ok(fragment)
}

/// `$k::text = ANY(column::text[])` for each value, OR-joined.
pub fn any_array_filter<S>(column: &str, values: &[S]) -> Result<SqlFragment>
where
    S: AsRef<str>,
{
    if values.is_empty() {
        return Err(ReportError::invalid(format!(
            "`{column}` filter needs at least one value"
        )));
    }

    let column = quote_identifier(column);
    let clauses = values
        .iter()
        .map(|value| {
            let mut clause = SqlFragment::new();
            clause
                .push_bind(value.as_ref())
                .push_sql(format!("::text = ANY({column}::text[])"));
            clause
        })
        .collect::<Vec<_>>();

    Ok(SqlFragment::join(&clauses, " OR "))
}

fn tag_like_clause(key: &str, pattern: String) -> SqlFragment {
    let mut clause = SqlFragment::sql(format!("({} -> ", quote_identifier(HSTORE_COLUMN)));
    clause
        .push_bind(key)
        .push_sql(") LIKE ")
        .push_bind(pattern);
    clause
}

/// Escapes LIKE metacharacters so a token only matches itself.
#[must_use]
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
