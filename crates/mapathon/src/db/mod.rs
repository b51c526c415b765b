pub mod postgres;
pub mod rows;

use std::time::Instant;

use tracing::{debug, info, warn};

pub use self::postgres::{PostgresConnection, PostgresDriver};
pub use rows::{Record, RowSet};

use crate::config::DatabaseCredentials;
use crate::error::{ReportError, Result};
use crate::query::Statement;

/// Diagnostic reported by a database driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

pub trait Driver {
    type Connection: DriverConnection;

    fn connect(&self, credentials: &DatabaseCredentials)
    -> Result<Self::Connection, DriverError>;
}

pub trait DriverConnection {
    /// Runs one statement inside its own transaction.
    fn query(&mut self, statement: &Statement) -> Result<RowSet, DriverError>;

    fn rollback(&mut self) -> Result<(), DriverError>;

    fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Closed,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }
}

/// One database session. Statements run one at a time; the connection is
/// released on [`Database::close`] or drop.
pub struct Database<D: Driver> {
    driver: D,
    connection: Option<D::Connection>,
    state: SessionState,
}

impl<D: Driver> Database<D> {
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            connection: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn open(driver: D, credentials: &DatabaseCredentials) -> Result<Self> {
        let mut database = Self::new(driver);
        database.connect(credentials)?;
        Ok(database)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connect(&mut self, credentials: &DatabaseCredentials) -> Result<()> {
        match self.state {
            SessionState::Connected => return Ok(()),
            SessionState::Closed => {
                return Err(ReportError::ConnectionError {
                    code: None,
                    message: "session is closed".to_string(),
                });
            }
            SessionState::Disconnected => {}
        }

        match self.driver.connect(credentials) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state = SessionState::Connected;
                info!(db = %credentials.display_target(), "database connected");
                Ok(())
            }
            Err(error) => {
                warn!(
                    db = %credentials.display_target(),
                    code = error.code.as_deref().unwrap_or("-"),
                    "database connection failed"
                );
                Err(ReportError::ConnectionError {
                    code: error.code,
                    message: error.message,
                })
            }
        }
    }

    /// Runs `statement`. A failed statement is rolled back and the session
    /// stays usable; if the rollback itself fails the connection is dropped
    /// and the session returns to `Disconnected`.
    pub fn execute(&mut self, statement: &Statement) -> Result<RowSet> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(ReportError::ConnectionError {
                code: None,
                message: format!("database is not connected (state {})", self.state.as_str()),
            });
        };

        let started = Instant::now();
        match connection.query(statement) {
            Ok(rows) => {
                debug!(
                    label = statement.label(),
                    params = statement.params().len(),
                    rows = rows.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "statement executed"
                );
                Ok(rows)
            }
            Err(error) => {
                warn!(
                    label = statement.label(),
                    code = error.code.as_deref().unwrap_or("-"),
                    message = %error.message,
                    "statement failed; rolling back"
                );
                let mut message = error.message;
                if let Err(rollback_error) = connection.rollback() {
                    message = format!(
                        "{message}; rollback failed, connection dropped: {}",
                        rollback_error.message
                    );
                    if let Some(connection) = self.connection.take() {
                        let _ = connection.close();
                    }
                    self.state = SessionState::Disconnected;
                }
                Err(ReportError::QueryError {
                    label: statement.label().to_string(),
                    code: error.code,
                    message,
                })
            }
        }
    }

    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        connection.close().map_err(|error| ReportError::ConnectionError {
            code: error.code,
            message: error.message,
        })?;
        debug!("database connection closed");
        Ok(())
    }
}

impl<D: Driver> Drop for Database<D> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(%error, "database close on drop failed");
        }
    }
}
