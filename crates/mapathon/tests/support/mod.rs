#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use mapathon::config::DatabaseCredentials;
use mapathon::db::{Database, Driver, DriverConnection, DriverError, RowSet};
use mapathon::models::ReportParameters;
use mapathon::query::Statement;
use serde_json::Value;
use time::macros::datetime;

#[derive(Debug, Default)]
pub struct Journal {
    pub statements: Vec<Statement>,
    pub rollbacks: usize,
    pub closes: usize,
}

impl Journal {
    pub fn labels(&self) -> Vec<&'static str> {
        self.statements.iter().map(Statement::label).collect()
    }
}

/// Answers statements by label from a queue of canned responses.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    responses: Rc<RefCell<HashMap<&'static str, VecDeque<Result<RowSet, DriverError>>>>>,
    pub journal: Rc<RefCell<Journal>>,
}

pub struct ScriptedConnection {
    driver: ScriptedDriver,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, label: &'static str, rows: RowSet) -> &Self {
        self.push(label, Ok(rows))
    }

    pub fn fail(&self, label: &'static str, error: DriverError) -> &Self {
        self.push(label, Err(error))
    }

    fn push(&self, label: &'static str, response: Result<RowSet, DriverError>) -> &Self {
        self.responses
            .borrow_mut()
            .entry(label)
            .or_default()
            .push_back(response);
        self
    }

    pub fn open(&self) -> Database<ScriptedDriver> {
        Database::open(self.clone(), &DatabaseCredentials::default())
            .expect("scripted driver should connect")
    }
}

impl Driver for ScriptedDriver {
    type Connection = ScriptedConnection;

    fn connect(&self, _: &DatabaseCredentials) -> Result<ScriptedConnection, DriverError> {
        Ok(ScriptedConnection {
            driver: self.clone(),
        })
    }
}

impl DriverConnection for ScriptedConnection {
    fn query(&mut self, statement: &Statement) -> Result<RowSet, DriverError> {
        self.driver
            .journal
            .borrow_mut()
            .statements
            .push(statement.clone());
        self.driver
            .responses
            .borrow_mut()
            .get_mut(statement.label())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(DriverError::new(format!(
                    "no scripted response for `{}`",
                    statement.label()
                )))
            })
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.driver.journal.borrow_mut().rollbacks += 1;
        Ok(())
    }

    fn close(self) -> Result<(), DriverError> {
        self.driver.journal.borrow_mut().closes += 1;
        Ok(())
    }
}

pub fn rows(columns: &[&str], values: Vec<Vec<Value>>) -> RowSet {
    RowSet::new(
        columns.iter().map(|column| (*column).to_string()).collect(),
        values,
    )
    .expect("fixture rows should be rectangular")
}

pub fn mapathon_params() -> ReportParameters {
    ReportParameters::new(
        [1234, 5678],
        ["mapathon"],
        datetime!(2021-06-01 00:00 UTC),
        datetime!(2021-06-02 00:00 UTC),
    )
    .expect("fixture parameters should be valid")
}
