use thiserror::Error;

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("database connection failed{}: {message}", code_suffix(.code.as_deref()))]
    ConnectionError {
        code: Option<String>,
        message: String,
    },

    #[error("query `{label}` failed{}: {message}", code_suffix(.code.as_deref()))]
    QueryError {
        label: String,
        code: Option<String>,
        message: String,
    },

    #[error("row shape does not match `{record}`: {detail}")]
    SchemaMismatch { record: &'static str, detail: String },

    #[error("output write failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output encoding failed: {0}")]
    Serialization(String),
}

impl ReportError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameters(message.into())
    }

    /// Stable machine-readable key, logged by the CLI on failure.
    #[must_use]
    pub const fn kind_key(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::ConnectionError { .. } => "connection_error",
            Self::QueryError { .. } => "query_error",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::Io { .. } => "io_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|code| format!(" (code {code})")).unwrap_or_default()
}
