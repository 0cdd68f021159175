//! In-memory engine that records statements instead of running them
//!
//! Used by the unit tests of every table variant and by the bootstrap
//! binary's `--dry-run` mode to print the SQL it would send.

use async_trait::async_trait;
use pg_tables_models::{Row, TableError, TableResult};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::{SqlEngine, Statement};

/// Scripted reply for the next statement
#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows(Vec<Row>),
    Affected(u64),
    Error(TableError),
}

#[derive(Default)]
struct MockState {
    statements: Vec<Statement>,
    batches: Vec<Statement>,
    responses: VecDeque<MockResponse>,
}

/// Recording engine with a queue of scripted responses.
///
/// `fetch_all`/`execute` consume one queued response each (an empty queue
/// yields no rows / zero affected). `execute_batch` only consumes a queued
/// response when it is an error.
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.state().responses.push_back(MockResponse::Rows(rows));
        self
    }

    pub fn push_affected(&self, count: u64) -> &Self {
        self.state().responses.push_back(MockResponse::Affected(count));
        self
    }

    pub fn push_error(&self, error: TableError) -> &Self {
        self.state().responses.push_back(MockResponse::Error(error));
        self
    }

    /// Statements sent through `fetch_all`/`execute`, in order
    pub fn statements(&self) -> Vec<Statement> {
        self.state().statements.clone()
    }

    /// Scripts sent through `execute_batch`, in order
    pub fn batches(&self) -> Vec<Statement> {
        self.state().batches.clone()
    }

    /// Total round trips, batches included
    pub fn round_trips(&self) -> usize {
        let state = self.state();
        state.statements.len() + state.batches.len()
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.state().statements.last().cloned()
    }

    fn next_response(&self, statement: &Statement) -> Option<MockResponse> {
        let mut state = self.state();
        state.statements.push(statement.clone());
        state.responses.pop_front()
    }
}

#[async_trait]
impl SqlEngine for MockEngine {
    async fn fetch_all(&self, statement: &Statement) -> TableResult<Vec<Row>> {
        match self.next_response(statement) {
            Some(MockResponse::Rows(rows)) => Ok(rows),
            Some(MockResponse::Error(e)) => Err(e),
            Some(MockResponse::Affected(_)) | None => Ok(Vec::new()),
        }
    }

    async fn execute(&self, statement: &Statement) -> TableResult<u64> {
        match self.next_response(statement) {
            Some(MockResponse::Affected(count)) => Ok(count),
            Some(MockResponse::Rows(rows)) => Ok(rows.len() as u64),
            Some(MockResponse::Error(e)) => Err(e),
            None => Ok(0),
        }
    }

    async fn execute_batch(&self, script: &Statement) -> TableResult<()> {
        let mut state = self.state();
        state.batches.push(script.clone());
        if let Some(MockResponse::Error(_)) = state.responses.front() {
            if let Some(MockResponse::Error(e)) = state.responses.pop_front() {
                return Err(e);
            }
        }
        Ok(())
    }
}
