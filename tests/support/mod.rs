//! Scripted in-memory transport for driving the connection state machine in
//! tests. Every call is recorded; per-method queues let a test inject an
//! error (or a canned result) for the Nth call, with success as the default.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use mssql_odbc::prelude::*;

#[derive(Debug, Default)]
pub struct Script {
    /// `Err` entries override the default successful prepare.
    pub prepare: VecDeque<Result<(), Error>>,
    /// Overrides for execute; default is an empty successful result.
    pub execute: VecDeque<Result<RawResult, Error>>,
    pub begin: VecDeque<Result<(), Error>>,
    pub commit: VecDeque<Result<(), Error>>,
    pub rollback: VecDeque<Result<(), Error>>,
    pub savepoint: VecDeque<Result<(), Error>>,
    pub rollback_to: VecDeque<Result<(), Error>>,
    /// Every transport call, in order, e.g. `"prepare:SELECT 1"`.
    pub calls: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ScriptHandle(Arc<Mutex<Script>>);

impl ScriptHandle {
    pub fn lock(&self) -> MutexGuard<'_, Script> {
        self.0.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn calls_named(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[derive(Debug)]
pub struct MockPrepared {
    pub sql: String,
}

#[derive(Debug)]
pub struct MockTransport {
    script: ScriptHandle,
}

impl MockTransport {
    /// A transport plus the handle a test uses to program and inspect it.
    pub fn scripted() -> (Self, ScriptHandle) {
        let handle = ScriptHandle::default();
        (
            Self {
                script: handle.clone(),
            },
            handle,
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Prepared = MockPrepared;

    async fn connect(options: &ConnectOptions) -> Result<Self, Error> {
        if options.database == "refuse" {
            return Err(Error::Connect("login failed for test user".into()));
        }
        let (transport, handle) = Self::scripted();
        // Connections pool tests cannot script directly: the first statement
        // fails, and so does the rollback after it.
        if options.database == "in_doubt" {
            let mut s = handle.lock();
            s.execute
                .push_back(Err(statement_error(547, "constraint violated")));
            s.rollback
                .push_back(Err(statement_error(3903, "rollback failed")));
        }
        Ok(transport)
    }

    async fn prepare(&mut self, sql: &str) -> Result<MockPrepared, Error> {
        let step = {
            let mut s = self.script.lock();
            s.calls.push(format!("prepare:{sql}"));
            s.prepare.pop_front()
        };
        match step {
            Some(Err(e)) => Err(e),
            _ => Ok(MockPrepared {
                sql: sql.to_string(),
            }),
        }
    }

    async fn execute(
        &mut self,
        statement: &MockPrepared,
        _params: &[WireParam],
    ) -> Result<RawResult, Error> {
        let step = {
            let mut s = self.script.lock();
            s.calls.push(format!("execute:{}", statement.sql));
            s.execute.pop_front()
        };
        step.unwrap_or_else(|| Ok(RawResult::default()))
    }

    async fn begin(&mut self) -> Result<(), Error> {
        self.simple("begin", |s| s.begin.pop_front())
    }

    async fn commit(&mut self) -> Result<(), Error> {
        self.simple("commit", |s| s.commit.pop_front())
    }

    async fn rollback(&mut self) -> Result<(), Error> {
        self.simple("rollback", |s| s.rollback.pop_front())
    }

    async fn savepoint(&mut self, name: &str) -> Result<(), Error> {
        self.simple(&format!("savepoint:{name}"), |s| s.savepoint.pop_front())
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), Error> {
        self.simple(&format!("rollback_to:{name}"), |s| {
            s.rollback_to.pop_front()
        })
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.simple("disconnect", |_| None)
    }
}

impl MockTransport {
    fn simple(
        &self,
        call: &str,
        pop: impl FnOnce(&mut Script) -> Option<Result<(), Error>>,
    ) -> Result<(), Error> {
        let step = {
            let mut s = self.script.lock();
            s.calls.push(call.to_string());
            pop(&mut s)
        };
        step.unwrap_or(Ok(()))
    }
}

pub fn column(name: &str, wire_type: WireType, precision: u8, scale: u8) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        wire_type,
        precision,
        scale,
        nullable: true,
    }
}

pub fn statement_error(code: i32, message: &str) -> Error {
    Error::Statement {
        code,
        message: message.to_string(),
    }
}
