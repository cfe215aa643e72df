//! The connection protocol state machine.
//!
//! One [`Connection`] owns exactly one transport handle and serves one
//! logical caller at a time: every operation takes `&mut self` and runs to
//! completion before the next is accepted. Concurrency across callers comes
//! from running many connections under a pool's checkout discipline (see
//! [`crate::pool`]), never from sharing one connection.
//!
//! Fatal transport errors move the connection to its terminal disconnected
//! state and are never retried here; retry and backoff belong to the pool
//! manager. Statement-level failures leave connection state untouched beyond
//! the rollback dictated by the call's [`StatementMode`].

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::codec;
use crate::config::ConnectOptions;
use crate::error::Error;
use crate::options::{QueryOptions, StatementMode};
use crate::results::{QueryResult, assemble};
use crate::statement::{CacheMode, Statement};
use crate::transport::{RawResult, Transport, WireParam};
use crate::types::Value;

/// Prepared handles kept per connection. Old entries fall out LRU-style;
/// they are re-prepared transparently on next use.
const STATEMENT_CACHE_CAPACITY: usize = 64;

/// Savepoint name used to bracket a single statement in
/// [`StatementMode::Savepoint`].
const STATEMENT_SAVEPOINT: &str = "mssql_odbc_stmt";

/// Health of a connection, as consulted by the uncached-retry decision and
/// the pool's recycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Idle,
    /// `savepoints` counts nested `begin`s beyond the outermost transaction.
    InTransaction { savepoints: u32 },
}

/// One physical connection and its protocol state.
#[derive(Debug)]
pub struct Connection<T: Transport> {
    /// `None` once disconnected; disconnected is terminal.
    transport: Option<T>,
    statements: LruCache<crate::statement::StatementKey, T::Prepared>,
    tx: TxState,
    status: ConnectionStatus,
}

impl<T: Transport> Connection<T> {
    /// Establish the transport handle and wrap it in an idle connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] on transport-level refusal, authentication
    /// failure, or encryption negotiation failure.
    pub async fn connect(options: &ConnectOptions) -> Result<Self, Error> {
        let transport = T::connect(options).await.map_err(|error| match error {
            error @ Error::Connect(_) => error,
            other => Error::Connect(other.to_string()),
        })?;
        tracing::debug!(
            server = %options.host,
            database = %options.database,
            "connection established"
        );
        Ok(Self::from_transport(transport))
    }

    /// Adopt an already-established transport handle. This is how embedders
    /// and tests supply their own transport; the handle is owned exclusively
    /// by the returned connection from here on.
    #[must_use]
    pub fn from_transport(transport: T) -> Self {
        let capacity =
            NonZeroUsize::new(STATEMENT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            transport: Some(transport),
            statements: LruCache::new(capacity),
            tx: TxState::Idle,
            status: ConnectionStatus::Ok,
        }
    }

    /// Prepare and execute one statement with positional parameters.
    ///
    /// For a statement in [`CacheMode::StatementCache`], the prepared handle
    /// is looked up (or created) in the connection's cache. Some SQL Server
    /// configurations reject server-side caching for certain statement
    /// shapes; when the transport reports that as
    /// [`Error::FeatureNotSupported`] and the connection is otherwise
    /// healthy, the statement is transparently retried once as an uncached
    /// one-shot and that outcome is returned instead. If the connection is
    /// already in a known-bad status the original error is surfaced
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Encode, decode, and statement errors are always surfaced; the
    /// uncached retry above is the only error recovered locally.
    pub async fn prepare_execute(
        &mut self,
        statement: &Statement,
        params: &[Value],
        options: &QueryOptions,
    ) -> Result<QueryResult, Error> {
        let mut wire_params = Vec::with_capacity(params.len());
        for value in params {
            wire_params.push(codec::encode(value)?);
        }

        let statement_savepoint =
            options.mode == StatementMode::Savepoint && self.in_transaction();
        if statement_savepoint {
            let bracketed = self.transport_mut()?.savepoint(STATEMENT_SAVEPOINT).await;
            if let Err(error) = bracketed {
                return Err(self.note_error(error));
            }
        }

        match self.run_statement(statement, &wire_params).await {
            Ok(raw) => assemble(raw, options),
            Err(error) => {
                let error = self.note_error(error);
                if !error.is_fatal() && self.in_transaction() {
                    self.roll_back_failed_statement(statement_savepoint).await;
                }
                Err(error)
            }
        }
    }

    /// Convenience entry: builds the [`Statement`] from the SQL text and the
    /// `cache_statement` option, then calls
    /// [`Connection::prepare_execute`].
    ///
    /// # Errors
    ///
    /// Same as [`Connection::prepare_execute`].
    pub async fn query(
        &mut self,
        sql: &str,
        params: &[Value],
        options: &QueryOptions,
    ) -> Result<QueryResult, Error> {
        let statement = match &options.cache_statement {
            Some(name) => Statement::cached(name.clone(), sql),
            None => Statement::one_shot(sql),
        };
        self.prepare_execute(&statement, params, options).await
    }

    /// Open a transaction, or a savepoint when one is already open.
    ///
    /// # Errors
    ///
    /// Surfaces the transport error; fatal ones disconnect the connection.
    pub async fn begin(&mut self) -> Result<(), Error> {
        match self.tx {
            TxState::Idle => {
                if let Err(error) = self.transport_mut()?.begin().await {
                    return Err(self.note_error(error));
                }
                self.tx = TxState::InTransaction { savepoints: 0 };
            }
            TxState::InTransaction { savepoints } => {
                let name = savepoint_name(savepoints + 1);
                if let Err(error) = self.transport_mut()?.savepoint(&name).await {
                    return Err(self.note_error(error));
                }
                self.tx = TxState::InTransaction {
                    savepoints: savepoints + 1,
                };
            }
        }
        Ok(())
    }

    /// Commit the innermost bracket: the transaction itself at depth zero.
    /// A nested bracket has no commit of its own on SQL Server; its work
    /// simply folds into the enclosing transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] outside a transaction, otherwise the
    /// transport error, if any.
    pub async fn commit(&mut self) -> Result<(), Error> {
        match self.tx {
            TxState::Idle => Err(Error::Protocol("commit outside of a transaction".into())),
            TxState::InTransaction { savepoints: 0 } => {
                if let Err(error) = self.transport_mut()?.commit().await {
                    return Err(self.note_error(error));
                }
                self.tx = TxState::Idle;
                Ok(())
            }
            TxState::InTransaction { savepoints } => {
                self.tx = TxState::InTransaction {
                    savepoints: savepoints - 1,
                };
                Ok(())
            }
        }
    }

    /// Roll back the innermost bracket: to the pre-savepoint point inside a
    /// nested bracket, or the whole transaction at depth zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] outside a transaction, otherwise the
    /// transport error, if any.
    pub async fn rollback(&mut self) -> Result<(), Error> {
        match self.tx {
            TxState::Idle => Err(Error::Protocol("rollback outside of a transaction".into())),
            TxState::InTransaction { savepoints: 0 } => {
                if let Err(error) = self.transport_mut()?.rollback().await {
                    return Err(self.note_error(error));
                }
                self.tx = TxState::Idle;
                Ok(())
            }
            TxState::InTransaction { savepoints } => {
                let name = savepoint_name(savepoints);
                if let Err(error) = self.transport_mut()?.rollback_to_savepoint(&name).await {
                    return Err(self.note_error(error));
                }
                self.tx = TxState::InTransaction {
                    savepoints: savepoints - 1,
                };
                Ok(())
            }
        }
    }

    /// Release the transport handle. Idempotent: the second and later calls
    /// are no-ops.
    ///
    /// # Errors
    ///
    /// Surfaces the transport's release error, if any; the connection is
    /// considered disconnected either way.
    pub async fn disconnect(&mut self) -> Result<(), Error> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };
        self.statements.clear();
        self.tx = TxState::Idle;
        transport.disconnect().await
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        matches!(self.tx, TxState::InTransaction { .. })
    }

    /// `None` outside a transaction; otherwise the number of open savepoints
    /// beyond the outermost transaction.
    #[must_use]
    pub fn transaction_depth(&self) -> Option<u32> {
        match self.tx {
            TxState::Idle => None,
            TxState::InTransaction { savepoints } => Some(savepoints),
        }
    }

    async fn run_statement(
        &mut self,
        statement: &Statement,
        params: &[WireParam],
    ) -> Result<RawResult, Error> {
        match statement.cache_mode {
            CacheMode::StatementCache => {
                match self.execute_cached(statement, params).await {
                    Err(Error::FeatureNotSupported(message)) => {
                        if self.status == ConnectionStatus::Error {
                            // Known-bad connection: no retry, surface the
                            // original error unchanged.
                            return Err(Error::FeatureNotSupported(message));
                        }
                        tracing::debug!(
                            statement = %statement.name,
                            "server rejected the cached statement; retrying uncached"
                        );
                        self.statements.pop(&statement.key());
                        self.execute_uncached(&statement.text, params).await
                    }
                    other => other,
                }
            }
            CacheMode::Uncached => self.execute_uncached(&statement.text, params).await,
        }
    }

    async fn execute_cached(
        &mut self,
        statement: &Statement,
        params: &[WireParam],
    ) -> Result<RawResult, Error> {
        let key = statement.key();
        if !self.statements.contains(&key) {
            let transport = self.transport.as_mut().ok_or_else(closed)?;
            let prepared = transport.prepare(&statement.text).await?;
            self.statements.put(key.clone(), prepared);
        }
        let Some(prepared) = self.statements.get(&key) else {
            return Err(Error::Protocol("statement cache lookup failed".into()));
        };
        let transport = self.transport.as_mut().ok_or_else(closed)?;
        transport.execute(prepared, params).await
    }

    async fn execute_uncached(
        &mut self,
        sql: &str,
        params: &[WireParam],
    ) -> Result<RawResult, Error> {
        let transport = self.transport.as_mut().ok_or_else(closed)?;
        let prepared = transport.prepare(sql).await?;
        transport.execute(&prepared, params).await
    }

    async fn roll_back_failed_statement(&mut self, to_statement_savepoint: bool) {
        let result = if to_statement_savepoint {
            match self.transport_mut() {
                Ok(transport) => transport.rollback_to_savepoint(STATEMENT_SAVEPOINT).await,
                Err(error) => Err(error),
            }
        } else {
            let rolled_back = match self.transport_mut() {
                Ok(transport) => transport.rollback().await,
                Err(error) => Err(error),
            };
            if rolled_back.is_ok() {
                self.tx = TxState::Idle;
            }
            rolled_back
        };
        if let Err(rollback_error) = result {
            let rollback_error = self.note_error(rollback_error);
            // The transaction is now in doubt; flag the connection so the
            // uncached-retry path and the pool stop trusting it.
            self.status = ConnectionStatus::Error;
            tracing::warn!(error = %rollback_error, "rollback after failed statement failed");
        }
    }

    fn transport_mut(&mut self) -> Result<&mut T, Error> {
        self.transport.as_mut().ok_or_else(closed)
    }

    /// Record a transport error's effect on connection state and hand it
    /// back for propagation. Fatal errors drop the handle without a
    /// disconnect round trip: once the transport is severed mid-operation
    /// the only safe move is to abandon it.
    fn note_error(&mut self, error: Error) -> Error {
        if error.is_fatal() {
            self.transport = None;
            self.statements.clear();
            self.tx = TxState::Idle;
            self.status = ConnectionStatus::Error;
            tracing::warn!(error = %error, "transport error severed the connection");
        }
        error
    }
}

fn savepoint_name(depth: u32) -> String {
    format!("mssql_odbc_sp_{depth}")
}

fn closed() -> Error {
    Error::Connection("connection is closed".into())
}
