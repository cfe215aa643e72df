use thiserror::Error;

use crate::transport::WireType;

/// Errors surfaced by the driver.
///
/// Every public operation returns `Result<_, Error>`; nothing panics on the
/// non-test paths. The only error recovered internally is
/// [`Error::FeatureNotSupported`] on a healthy connection, which triggers a
/// single uncached retry of the statement (see
/// [`Connection::prepare_execute`](crate::connection::Connection::prepare_execute)).
#[derive(Debug, Error)]
pub enum Error {
    /// The connection attempt was refused, authentication failed, or
    /// encryption negotiation failed. Fatal to the connection attempt.
    #[error("connection failed: {0}")]
    Connect(String),

    /// A value cannot be represented in the wire form SQL Server accepts.
    #[error("cannot encode value: {0}")]
    Encode(String),

    /// A result column has no decode rule. Select the column as text
    /// (e.g. `CONVERT(varchar(36), col)`) to read it.
    #[error("column {column:?} has unsupported type {wire_type:?}; select it as text instead")]
    UnsupportedColumn {
        column: String,
        wire_type: WireType,
    },

    /// A server-reported SQL error: syntax, constraint, permission.
    /// Carries the server's error code and message.
    #[error("server error {code}: {message}")]
    Statement { code: i32, message: String },

    /// The server rejected a capability, such as server-side statement
    /// caching for a particular statement shape.
    #[error("feature not supported by server: {0}")]
    FeatureNotSupported(String),

    /// The transport was severed mid-operation or the connection is closed.
    /// Fatal to the connection; never retried by this layer.
    #[error("connection lost: {0}")]
    Connection(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The transport handed back data that violates the driver contract
    /// (mismatched buffers, bad row arity), or an operation was issued in a
    /// state that cannot accept it (e.g. commit outside a transaction).
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl Error {
    /// Whether this error severs the connection. Fatal errors transition the
    /// state machine to disconnected; recovery belongs to the pool manager.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connect(_) | Error::Connection(_))
    }
}
