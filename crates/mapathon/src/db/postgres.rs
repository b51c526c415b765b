use std::error::Error;

use postgres::types::{FromSql, Kind, ToSql, Type};
use postgres::{Client, Config, NoTls, Row};
use serde_json::{Number, Value};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use super::{Driver, DriverConnection, DriverError, RowSet};
use crate::config::DatabaseCredentials;
use crate::query::{SqlParam, Statement};

const APPLICATION_NAME: &str = "mapathon";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

pub struct PostgresConnection {
    client: Client,
}

impl Driver for PostgresDriver {
    type Connection = PostgresConnection;

    fn connect(
        &self,
        credentials: &DatabaseCredentials,
    ) -> Result<PostgresConnection, DriverError> {
        let mut config = Config::new();
        config
            .host(&credentials.host)
            .port(credentials.port)
            .dbname(&credentials.dbname)
            .user(&credentials.user)
            .application_name(APPLICATION_NAME);
        if let Some(password) = &credentials.password {
            config.password(password);
        }

        let client = config.connect(NoTls).map_err(driver_error)?;
        Ok(PostgresConnection { client })
    }
}

impl DriverConnection for PostgresConnection {
    fn query(&mut self, statement: &Statement) -> Result<RowSet, DriverError> {
        self.client.batch_execute("BEGIN").map_err(driver_error)?;

        let prepared = self
            .client
            .prepare(statement.sql())
            .map_err(driver_error)?;
        if prepared.params().len() != statement.params().len() {
            return Err(DriverError::new(format!(
                "statement expects {} parameters, {} bound",
                prepared.params().len(),
                statement.params().len()
            )));
        }
        let binds = prepared
            .params()
            .iter()
            .zip(statement.params())
            .enumerate()
            .map(|(index, (ty, value))| bind_param(index + 1, ty, value))
            .collect::<Result<Vec<_>, _>>()?;
        let bind_refs = binds
            .iter()
            .map(|bind| &**bind as &(dyn ToSql + Sync))
            .collect::<Vec<_>>();

        let rows = self
            .client
            .query(&prepared, &bind_refs)
            .map_err(driver_error)?;
        self.client.batch_execute("COMMIT").map_err(driver_error)?;

        let columns = prepared
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect::<Vec<_>>();
        let values = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;
        RowSet::new(columns, values).map_err(|error| DriverError::new(error.to_string()))
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.client.batch_execute("ROLLBACK").map_err(driver_error)
    }

    fn close(self) -> Result<(), DriverError> {
        self.client.close().map_err(driver_error)
    }
}

fn driver_error(error: postgres::Error) -> DriverError {
    let message = error
        .as_db_error()
        .map(|db_error| db_error.message().to_string())
        .unwrap_or_else(|| error.to_string());
    let diagnostic = DriverError::new(message);
    match error.code() {
        Some(state) => diagnostic.with_code(state.code()),
        None => diagnostic,
    }
}

/// Converts a bind value to the Rust type matching the parameter type the
/// server inferred for its placeholder.
fn bind_param(
    position: usize,
    ty: &Type,
    value: &SqlParam,
) -> Result<Box<dyn ToSql + Sync>, DriverError> {
    let textual = matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    );
    let bound = match value {
        SqlParam::Text(text) if textual => boxed(text.clone()),
        SqlParam::Text(_) => None,
        SqlParam::Int(number) => match *ty {
            Type::INT8 => boxed(*number),
            Type::INT4 => i32::try_from(*number).ok().and_then(boxed),
            Type::INT2 => i16::try_from(*number).ok().and_then(boxed),
            _ if textual => boxed(number.to_string()),
            _ => None,
        },
        SqlParam::Timestamp(instant) => {
            let utc = instant.to_offset(UtcOffset::UTC);
            match *ty {
                Type::TIMESTAMPTZ => boxed(utc),
                Type::TIMESTAMP => boxed(PrimitiveDateTime::new(utc.date(), utc.time())),
                Type::DATE => boxed(utc.date()),
                _ if textual => utc.format(&Rfc3339).ok().and_then(boxed),
                _ => None,
            }
        }
    };

    bound.ok_or_else(|| {
        DriverError::new(format!(
            "cannot bind {} to parameter ${position} of type {ty}",
            param_kind(value)
        ))
    })
}

fn boxed<T>(value: T) -> Option<Box<dyn ToSql + Sync>>
where
    T: ToSql + Sync + 'static,
{
    Some(Box::new(value))
}

fn param_kind(value: &SqlParam) -> &'static str {
    match value {
        SqlParam::Text(_) => "text",
        SqlParam::Int(_) => "integer",
        SqlParam::Timestamp(_) => "timestamp",
    }
}

fn decode_row(row: &Row) -> Result<Vec<Value>, DriverError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            decode_column(row, index, column.type_()).map_err(|error| {
                DriverError::new(format!("column `{}`: {}", column.name(), error.message))
            })
        })
        .collect()
}

fn decode_column(row: &Row, index: usize, ty: &Type) -> Result<Value, DriverError> {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, index)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, index)?.map(|n| Value::from(i64::from(n))),
        Type::INT4 => get::<i32>(row, index)?.map(|n| Value::from(i64::from(n))),
        Type::INT8 => get::<i64>(row, index)?.map(Value::from),
        Type::FLOAT4 => get::<f32>(row, index)?.map(|n| float_value(f64::from(n))),
        Type::FLOAT8 => get::<f64>(row, index)?.map(float_value),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, index)?.map(Value::String)
        }
        Type::JSON | Type::JSONB => get::<Value>(row, index)?,
        Type::TIMESTAMPTZ => get::<OffsetDateTime>(row, index)?
            .map(|instant| format_rfc3339(instant.to_offset(UtcOffset::UTC)))
            .transpose()?,
        Type::TIMESTAMP => get::<PrimitiveDateTime>(row, index)?
            .map(|instant| format_rfc3339(instant.assume_utc()))
            .transpose()?,
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => get::<Vec<String>>(row, index)?
            .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        Type::INT8_ARRAY => get::<Vec<i64>>(row, index)?
            .map(|items| Value::Array(items.into_iter().map(Value::from).collect())),
        _ if matches!(ty.kind(), Kind::Enum(_)) => {
            get::<EnumLabel>(row, index)?.map(|label| Value::String(label.0))
        }
        _ => {
            return Err(DriverError::new(format!(
                "unsupported column type {ty}; cast it in the query"
            )));
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Label of a user-defined enum value; its wire form is the label text.
struct EnumLabel(String);

impl<'a> FromSql<'a> for EnumLabel {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Self(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
    }
}

fn get<'a, T>(row: &'a Row, index: usize) -> Result<Option<T>, DriverError>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(index).map_err(driver_error)
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn format_rfc3339(instant: OffsetDateTime) -> Result<Value, DriverError> {
    instant
        .format(&Rfc3339)
        .map(Value::String)
        .map_err(|error| DriverError::new(format!("timestamp formatting failed: {error}")))
}
