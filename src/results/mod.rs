//! Assembling raw transport output into typed results.

mod result_set;
mod row;

pub use result_set::{QueryResult, assemble};
pub use row::QueryRow;
