use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Value;

/// One decoded result row.
///
/// Column names are shared across all rows of a result via `Arc`, with a
/// name-to-index map built once per result set so repeated lookups avoid
/// string comparisons.
#[derive(Debug, Clone)]
pub struct QueryRow {
    column_names: Arc<Vec<String>>,
    values: Vec<Value>,
    column_index: Arc<HashMap<String, usize>>,
}

impl QueryRow {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        let column_index = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            column_names,
            values,
            column_index,
        }
    }

    pub(crate) fn with_shared_index(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<Value>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get a value by column name, or `None` if the column doesn't exist.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        let idx = self.column_index.get(column_name).copied()?;
        self.values.get(idx)
    }

    /// Get a value by position, in transport column order.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
