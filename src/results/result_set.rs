use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{self, DecodeOptions};
use crate::error::Error;
use crate::options::QueryOptions;
use crate::results::QueryRow;
use crate::transport::{ColumnDescriptor, RawResult};

/// A fully decoded statement result: column metadata, typed rows in
/// transport order, and the affected-row count for DML.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<QueryRow>,
    /// Affected-row count reported by the transport. For SELECTs prefer
    /// [`QueryResult::row_count`].
    pub rows_affected: u64,
}

impl QueryResult {
    /// Number of rows returned.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Decode raw transport output into a [`QueryResult`].
///
/// Each column uses the codec rule for its descriptor; row order and column
/// order are preserved exactly as the transport reported them. The
/// `decode_mapper` option, when present, is applied to each row after
/// decoding, never before, so mapping functions always see fully-typed
/// values.
///
/// # Errors
///
/// Propagates codec errors, and returns [`Error::Protocol`] when a raw row's
/// arity does not match the column metadata.
pub fn assemble(raw: RawResult, options: &QueryOptions) -> Result<QueryResult, Error> {
    let decode_options = DecodeOptions {
        preserve_encoding: options.preserve_encoding,
    };
    let column_names: Arc<Vec<String>> =
        Arc::new(raw.columns.iter().map(|c| c.name.clone()).collect());
    let column_index: Arc<HashMap<String, usize>> = Arc::new(
        column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect(),
    );

    let mut rows = Vec::with_capacity(raw.rows.len());
    for raw_row in raw.rows {
        if raw_row.len() != raw.columns.len() {
            return Err(Error::Protocol(format!(
                "row has {} values but {} columns were described",
                raw_row.len(),
                raw.columns.len()
            )));
        }
        let mut values = Vec::with_capacity(raw_row.len());
        for (value, column) in raw_row.into_iter().zip(&raw.columns) {
            values.push(codec::decode(value, column, &decode_options)?);
        }
        let values = match &options.decode_mapper {
            Some(mapper) => mapper(values),
            None => values,
        };
        rows.push(QueryRow::with_shared_index(
            Arc::clone(&column_names),
            Arc::clone(&column_index),
            values,
        ));
    }

    Ok(QueryResult {
        columns: raw.columns,
        rows,
        rows_affected: raw.rows_affected,
    })
}
