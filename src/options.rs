//! Per-call options for `prepare_execute`/`query`.

use std::fmt;
use std::sync::Arc;

use crate::types::Value;

/// How a single statement relates to the enclosing transaction on failure.
/// Honored per call, never globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementMode {
    /// A failing statement rolls back the enclosing transaction.
    #[default]
    Transaction,
    /// A savepoint is set before the statement; a failure rolls back to that
    /// savepoint only, leaving the outer transaction intact.
    Savepoint,
}

/// Mapping applied to each decoded row before it is returned. Always runs
/// after decoding, so the function sees fully-typed values.
pub type RowMapper = Arc<dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync>;

/// Options for one `prepare_execute`/`query` call.
#[derive(Clone, Default)]
pub struct QueryOptions {
    /// Hand back `nchar`/`nvarchar` columns as raw UTF-16LE bytes.
    pub preserve_encoding: bool,
    pub mode: StatementMode,
    /// Cache the statement's prepared handle under this name for reuse on
    /// the same connection. `query` turns this into a cached
    /// [`Statement`](crate::Statement); `prepare_execute` callers state
    /// caching intent on the statement itself.
    pub cache_statement: Option<String>,
    pub decode_mapper: Option<RowMapper>,
}

impl QueryOptions {
    #[must_use]
    pub fn with_preserve_encoding(mut self, preserve: bool) -> Self {
        self.preserve_encoding = preserve;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: StatementMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_cache_statement(mut self, name: impl Into<String>) -> Self {
        self.cache_statement = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_decode_mapper(mut self, mapper: RowMapper) -> Self {
        self.decode_mapper = Some(mapper);
        self
    }
}

// Manual Debug because the mapper is an opaque closure.
impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("preserve_encoding", &self.preserve_encoding)
            .field("mode", &self.mode)
            .field("cache_statement", &self.cache_statement)
            .field(
                "decode_mapper",
                &self.decode_mapper.as_ref().map(|_| "<mapper>"),
            )
            .finish()
    }
}
