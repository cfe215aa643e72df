//! Bidirectional value codec between [`Value`](crate::Value) and the
//! narrower wire forms ODBC/SQL Server accepts and returns.
//!
//! Both directions are pure functions. Encoding picks the wire form from the
//! value alone; decoding picks the rule from the column's reported wire type
//! and precision/scale, never from inspecting the fetched buffer.

mod decode;
mod encode;

pub use decode::{DecodeOptions, decode};
pub use encode::encode;
