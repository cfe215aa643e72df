//! Typed SQL Server access over an ODBC transport.
//!
//! The crate is a client-side driver core with two load-bearing pieces: the
//! [`codec`] that maps the closed [`Value`] union onto the narrower,
//! precision-losing wire forms ODBC/SQL Server accepts and returns, and the
//! [`connection`] state machine that sequences prepare, execute, the
//! retry-on-unsupported-feature fallback, and transaction/savepoint
//! rollback so a failed statement never corrupts connection or transaction
//! state.
//!
//! The byte-level ODBC layer is not implemented here; it is a collaborator
//! behind the [`transport::Transport`] trait. Pooling policy likewise stays
//! external — [`pool`] only provides the manager glue a pool plugs into.
//!
//! ```rust,no_run
//! use mssql_odbc::prelude::*;
//! # use mssql_odbc::transport::Transport;
//!
//! # async fn example<OdbcTransport: Transport>() -> Result<(), Error> {
//! let options = ConnectOptions::builder()
//!     .host("db.example.com")
//!     .database("app")
//!     .username("app_user")
//!     .password("secret")
//!     .build()?;
//! let mut conn = Connection::<OdbcTransport>::connect(&options).await?;
//!
//! let result = conn
//!     .query(
//!         "SELECT id, name FROM users WHERE id = ?",
//!         &[Value::Int(1)],
//!         &QueryOptions::default(),
//!     )
//!     .await?;
//! for row in &result.rows {
//!     let _ = row.get("name");
//! }
//! # Ok(()) }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod options;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod transport;
pub mod types;

pub use config::{ConnectOptions, ConnectOptionsBuilder};
pub use connection::{Connection, ConnectionStatus};
pub use error::Error;
pub use options::{QueryOptions, RowMapper, StatementMode};
pub use results::{QueryResult, QueryRow};
pub use statement::{CacheMode, Statement, StatementKey};
pub use types::Value;
