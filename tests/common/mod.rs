//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use finq::llm::{Completion, CompletionRequest, CompletionService};
use finq::query::{GateMode, SafetyGate, SqliteStore};
use finq::schema::bootstrap;
use finq::{FinqError, Pipeline, Result};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Completion service that replays canned responses and records requests.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FinqError::completion("script exhausted")));
        next.map(Completion::text)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Seeded dataset in a temporary directory.
pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn seeded() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bloomberg_mini.db");
        bootstrap(&path).unwrap();
        Self { _dir: dir, path }
    }

    pub fn store(&self) -> Arc<SqliteStore> {
        Arc::new(SqliteStore::new(&self.path))
    }

    pub fn pipeline(&self, llm: Arc<ScriptedLlm>, mode: GateMode) -> Pipeline {
        Pipeline::new(llm, self.store(), SafetyGate::new(mode))
    }
}
