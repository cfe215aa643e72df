//! Convenient imports for common functionality.

pub use crate::codec::{DecodeOptions, decode, encode};
pub use crate::config::{ConnectOptions, ConnectOptionsBuilder};
pub use crate::connection::{Connection, ConnectionStatus};
pub use crate::error::Error;
pub use crate::options::{QueryOptions, RowMapper, StatementMode};
pub use crate::pool::{ConnectionManager, Pool, PooledConnection};
pub use crate::results::{QueryResult, QueryRow};
pub use crate::statement::{CacheMode, Statement, StatementKey};
pub use crate::transport::{
    ColumnDescriptor, RawResult, Transport, WireParam, WireType, WireValue,
};
pub use crate::types::Value;
