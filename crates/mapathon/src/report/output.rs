use std::fs::File;
use std::path::Path;

use serde_json::{Map, Value};

use crate::db::{Database, Driver, Record, RowSet};
use crate::error::{ReportError, Result};
use crate::query::Statement;

/// Anything that can run a statement and hand back rows.
pub trait QueryRunner {
    fn run(&mut self, statement: &Statement) -> Result<RowSet>;
}

impl<D: Driver> QueryRunner for Database<D> {
    fn run(&mut self, statement: &Statement) -> Result<RowSet> {
        self.execute(statement)
    }
}

/// Input shapes the tabular converter accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSource {
    Rows(RowSet),
    /// An array of objects or a single object; nested objects flatten into
    /// dotted column names.
    Structured(Value),
    Query(Statement),
}

/// Tabular view of a result, renderable as JSON, lists, records or CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    table: RowSet,
}

impl Output {
    pub fn load(source: OutputSource, runner: Option<&mut dyn QueryRunner>) -> Result<Self> {
        let table = match source {
            OutputSource::Rows(rows) => rows,
            OutputSource::Structured(value) => structured_table(value)?,
            OutputSource::Query(statement) => {
                let Some(runner) = runner else {
                    return Err(ReportError::invalid(format!(
                        "a database connection is required to run `{}`",
                        statement.label()
                    )));
                };
                runner.run(&statement)?
            }
        };
        Ok(Self { table })
    }

    #[must_use]
    pub fn table(&self) -> &RowSet {
        &self.table
    }

    /// JSON array of records, keys in column order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_dict())
            .map_err(|error| ReportError::Serialization(error.to_string()))
    }

    #[must_use]
    pub fn to_list(&self) -> Vec<Vec<Value>> {
        self.table.rows().to_vec()
    }

    /// Records with keys in column order.
    #[must_use]
    pub fn to_dict(&self) -> Vec<Record> {
        self.table.records()
    }

    /// Writes the table as CSV with a leading row-index column, replacing any
    /// existing file.
    pub fn to_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = csv::Writer::from_writer(file);

        let header = std::iter::once(String::new()).chain(self.table.columns().iter().cloned());
        writer
            .write_record(header)
            .map_err(|error| csv_error(path, error))?;
        for (index, row) in self.table.rows().iter().enumerate() {
            let cells = std::iter::once(index.to_string()).chain(row.iter().map(csv_cell));
            writer
                .write_record(cells)
                .map_err(|error| csv_error(path, error))?;
        }
        writer.flush().map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn structured_table(value: Value) -> Result<RowSet> {
    let records = match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(object) => Ok(flatten_object(object)),
                other => Err(ReportError::invalid(format!(
                    "structured output rows must be objects, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Value::Object(object) => vec![flatten_object(object)],
        other => {
            return Err(ReportError::invalid(format!(
                "structured output must be an object or an array of objects, got {other}"
            )));
        }
    };
    Ok(RowSet::from_records(&records))
}

fn flatten_object(object: Map<String, Value>) -> Record {
    let mut flat = Record::new();
    flatten_into(&mut flat, None, object);
    flat
}

fn flatten_into(flat: &mut Record, prefix: Option<&str>, object: Map<String, Value>) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_into(flat, Some(&name), nested),
            other => {
                flat.insert(name, other);
            }
        }
    }
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn csv_error(path: &Path, error: csv::Error) -> ReportError {
    match error.into_kind() {
        csv::ErrorKind::Io(source) => ReportError::Io {
            path: path.display().to_string(),
            source,
        },
        other => ReportError::Serialization(format!("{other:?}")),
    }
}
