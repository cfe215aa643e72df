//! The seam between the driver core and the ODBC layer it sits on.
//!
//! The core never talks to a driver manager directly. Everything it needs
//! from the ODBC side is expressed by the [`Transport`] trait plus the wire
//! data model in this module; any ODBC binding (or a scripted fake in tests)
//! can implement it.

use async_trait::async_trait;

use crate::config::ConnectOptions;
use crate::error::Error;

/// Column types the transport can report for a result column.
///
/// The decode rule table in [`crate::codec`] is total over this enum, so
/// narrowing or adding a rule is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Char,
    VarChar,
    Text,
    NChar,
    NVarChar,
    NText,
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Decimal,
    Numeric,
    Float,
    Real,
    Money,
    SmallMoney,
    Date,
    Time,
    SmallDateTime,
    DateTime,
    DateTime2,
    DateTimeOffset,
    UniqueIdentifier,
    Binary,
    VarBinary,
    Image,
    RowVersion,
    Xml,
}

/// Metadata for one result column, as reported by the transport after a
/// successful prepare. Drives the per-column decode rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub wire_type: WireType,
    pub precision: u8,
    pub scale: u8,
    pub nullable: bool,
}

/// An encoded statement parameter, ready for the transport to bind.
///
/// Deliberately narrower than [`crate::Value`]: everything the codec cannot
/// pass through losslessly as a native wire type travels as text.
#[derive(Debug, Clone, PartialEq)]
pub enum WireParam {
    /// Single-byte character data, bound as `varchar`.
    VarChar(String),
    /// UTF-16LE bytes, bound as `nvarchar`.
    NVarChar(Vec<u8>),
    /// Native 32-bit integer.
    Integer(i32),
    /// Typed NULL.
    Null,
}

/// A raw column value as fetched by the transport, before decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// Single-byte character data (`char`/`varchar` family).
    Text(String),
    /// UTF-16LE bytes (`nchar`/`nvarchar` family).
    Utf16(Vec<u8>),
    /// Integer-family buffer.
    Int(i64),
    /// Floating point buffer (`float`/`real`).
    Float(f64),
    /// `decimal`/`numeric`/`money` fetched as its character form; the digits
    /// are exact, unlike any fixed-width numeric buffer.
    Numeric(String),
    /// ODBC DATE_STRUCT.
    Date { year: i32, month: u32, day: u32 },
    /// ODBC TIMESTAMP_STRUCT. `nanos` holds the fractional-second part.
    Timestamp {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        nanos: u32,
    },
    /// Raw bytes (binary family).
    Bytes(Vec<u8>),
    /// SQL NULL.
    Null,
}

/// What comes back from executing a statement: column metadata, row data in
/// transport order, and the affected-row count for DML.
#[derive(Debug, Clone, Default)]
pub struct RawResult {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<WireValue>>,
    pub rows_affected: u64,
}

/// Operations the driver core requires from the ODBC layer.
///
/// Implementations report failures with the crate's [`Error`] taxonomy:
/// `Error::Connection` (or `Error::Connect` from [`Transport::connect`]) for
/// anything that severed the handle, `Error::FeatureNotSupported` when the
/// server rejects a capability such as server-side statement caching, and
/// `Error::Statement` for server-reported SQL errors.
#[async_trait]
pub trait Transport: Send + Sized {
    /// Prepared statement handle owned by the transport.
    type Prepared: Send + Sync;

    /// Establish a handle using the rendered connection options.
    async fn connect(options: &ConnectOptions) -> Result<Self, Error>;

    /// Prepare a statement and return its handle.
    async fn prepare(&mut self, sql: &str) -> Result<Self::Prepared, Error>;

    /// Execute a prepared statement with already-encoded parameters.
    async fn execute(
        &mut self,
        statement: &Self::Prepared,
        params: &[WireParam],
    ) -> Result<RawResult, Error>;

    async fn begin(&mut self) -> Result<(), Error>;

    async fn commit(&mut self) -> Result<(), Error>;

    async fn rollback(&mut self) -> Result<(), Error>;

    async fn savepoint(&mut self, name: &str) -> Result<(), Error>;

    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), Error>;

    /// Release the handle. Called at most once per connection.
    async fn disconnect(&mut self) -> Result<(), Error>;
}
