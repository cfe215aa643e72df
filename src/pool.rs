//! Pool-manager integration.
//!
//! The driver core deliberately implements no pooling policy. The external
//! pool collaborator's contract — checkout, checkin, health status — maps
//! onto `deadpool`'s managed API: [`ConnectionManager::create`] establishes
//! a connection, `Pool::get` is checkout, dropping the pooled object is
//! checkin, and [`ConnectionManager::recycle`] consults
//! [`Connection::status`] to drop connections the state machine has flagged.
//! Any other pool strategy can drive [`Connection`] the same way; nothing in
//! the core depends on deadpool's callback shape.

use std::fmt;
use std::marker::PhantomData;

use deadpool::managed::{Manager, Metrics, RecycleError, RecycleResult};

use crate::config::ConnectOptions;
use crate::connection::{Connection, ConnectionStatus};
use crate::error::Error;
use crate::transport::Transport;

/// Creates and recycles [`Connection`]s for a managed pool.
pub struct ConnectionManager<T: Transport> {
    options: ConnectOptions,
    _transport: PhantomData<fn() -> T>,
}

impl<T: Transport> ConnectionManager<T> {
    #[must_use]
    pub fn new(options: ConnectOptions) -> Self {
        Self {
            options,
            _transport: PhantomData,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }
}

impl<T: Transport> fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("options", &self.options)
            .finish()
    }
}

impl<T> Manager for ConnectionManager<T>
where
    T: Transport + 'static,
{
    type Type = Connection<T>;
    type Error = Error;

    async fn create(&self) -> Result<Connection<T>, Error> {
        Connection::connect(&self.options).await
    }

    async fn recycle(
        &self,
        connection: &mut Connection<T>,
        _metrics: &Metrics,
    ) -> RecycleResult<Error> {
        if connection.is_connected() && connection.status() == ConnectionStatus::Ok {
            Ok(())
        } else {
            Err(RecycleError::Message(
                "connection is disconnected or in error state".into(),
            ))
        }
    }
}

/// Managed pool of driver connections over one transport implementation.
pub type Pool<T> = deadpool::managed::Pool<ConnectionManager<T>>;

/// A checked-out pooled connection.
pub type PooledConnection<T> = deadpool::managed::Object<ConnectionManager<T>>;
