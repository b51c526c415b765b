use std::fmt::Write as _;

use time::OffsetDateTime;

/// A value bound to a `$n` placeholder. Caller input only ever reaches the
/// database this way.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Timestamp(OffsetDateTime),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<OffsetDateTime> for SqlParam {
    fn from(value: OffsetDateTime) -> Self {
        Self::Timestamp(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Sql(String),
    Param(SqlParam),
}

/// SQL text interleaved with bind values. Placeholders are numbered only when
/// the fragment is pushed into a [`StatementBuilder`], so fragments compose
/// without renumbering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    pieces: Vec<Piece>,
}

impl SqlFragment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sql(text: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.push_sql(text);
        fragment
    }

    pub fn push_sql(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        match self.pieces.last_mut() {
            Some(Piece::Sql(existing)) => existing.push_str(&text),
            _ => self.pieces.push(Piece::Sql(text)),
        }
        self
    }

    pub fn push_bind(&mut self, value: impl Into<SqlParam>) -> &mut Self {
        self.pieces.push(Piece::Param(value.into()));
        self
    }

    pub fn push_fragment(&mut self, other: &SqlFragment) -> &mut Self {
        for piece in &other.pieces {
            match piece {
                Piece::Sql(text) => {
                    self.push_sql(text.as_str());
                }
                Piece::Param(value) => {
                    self.push_bind(value.clone());
                }
            }
        }
        self
    }

    /// Joins fragments with `separator`.
    #[must_use]
    pub fn join<'a, I>(fragments: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = &'a SqlFragment>,
    {
        let mut joined = Self::new();
        for (index, fragment) in fragments.into_iter().enumerate() {
            if index > 0 {
                joined.push_sql(separator);
            }
            joined.push_fragment(fragment);
        }
        joined
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn params(&self) -> impl Iterator<Item = &SqlParam> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Param(value) => Some(value),
            Piece::Sql(_) => None,
        })
    }

    /// Renders the fragment on its own, numbering placeholders from `$1`.
    #[must_use]
    pub fn render(&self) -> (String, Vec<SqlParam>) {
        let mut builder = StatementBuilder::new("fragment");
        builder.push_fragment(self);
        let statement = builder.finish();
        (statement.sql, statement.params)
    }
}

/// One execution unit: SQL text plus its ordered bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    label: &'static str,
    sql: String,
    params: Vec<SqlParam>,
}

impl Statement {
    /// Short name used in logs and errors.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

#[derive(Debug)]
pub struct StatementBuilder {
    label: &'static str,
    sql: String,
    params: Vec<SqlParam>,
}

impl StatementBuilder {
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub fn push_sql(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    pub fn push_bind(&mut self, value: impl Into<SqlParam>) -> &mut Self {
        self.params.push(value.into());
        let _ = write!(self.sql, "${}", self.params.len());
        self
    }

    pub fn push_fragment(&mut self, fragment: &SqlFragment) -> &mut Self {
        for piece in &fragment.pieces {
            match piece {
                Piece::Sql(text) => {
                    self.push_sql(text);
                }
                Piece::Param(value) => {
                    self.push_bind(value.clone());
                }
            }
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> Statement {
        Statement {
            label: self.label,
            sql: self.sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SqlFragment, SqlParam, StatementBuilder};

    #[test]
    fn numbers_placeholders_in_push_order() {
        let mut left = SqlFragment::sql("a = ");
        left.push_bind("x");
        let mut right = SqlFragment::sql("b = ");
        right.push_bind(7_i64);

        let mut builder = StatementBuilder::new("test");
        builder
            .push_sql("SELECT 1 WHERE ")
            .push_fragment(&SqlFragment::join([&left, &right], " OR "));
        let statement = builder.finish();

        assert_eq!(statement.sql(), "SELECT 1 WHERE a = $1 OR b = $2");
        assert_eq!(
            statement.params(),
            &[SqlParam::Text("x".to_string()), SqlParam::Int(7)]
        );
    }

    #[test]
    fn same_fragment_pushed_twice_gets_fresh_placeholders() {
        let mut fragment = SqlFragment::sql("c = ");
        fragment.push_bind("v");

        let mut builder = StatementBuilder::new("test");
        builder
            .push_fragment(&fragment)
            .push_sql(" AND ")
            .push_fragment(&fragment);
        let statement = builder.finish();

        assert_eq!(statement.sql(), "c = $1 AND c = $2");
        assert_eq!(statement.params().len(), 2);
    }

    #[test]
    fn hostile_text_stays_out_of_sql() {
        let mut fragment = SqlFragment::sql("name = ");
        fragment.push_bind("x'; DROP TABLE osm_changeset; --");

        let (sql, params) = fragment.render();
        assert_eq!(sql, "name = $1");
        assert!(!sql.contains("DROP"));
        assert_eq!(params.len(), 1);
    }
}
