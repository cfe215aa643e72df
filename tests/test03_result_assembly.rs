//! Turning raw transport output into typed results.

mod support;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use mssql_odbc::prelude::*;
use mssql_odbc::results::assemble;
use support::{MockTransport, column};

fn sample_raw() -> RawResult {
    RawResult {
        columns: vec![
            column("id", WireType::Int, 0, 0),
            column("name", WireType::VarChar, 0, 0),
            column("qty", WireType::Numeric, 12, 2),
        ],
        rows: vec![
            vec![
                WireValue::Int(1),
                WireValue::Text("widget".into()),
                WireValue::Numeric("10.50".into()),
            ],
            vec![
                WireValue::Int(2),
                WireValue::Text("gadget".into()),
                WireValue::Null,
            ],
        ],
        rows_affected: 0,
    }
}

#[test]
fn preserves_row_and_column_order() {
    let result = assemble(sample_raw(), &QueryOptions::default()).unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(result.columns[1].name, "name");

    let first = &result.rows[0];
    assert_eq!(first.get_by_index(0), Some(&Value::Int(1)));
    assert_eq!(first.get("name"), Some(&Value::Text("widget".into())));
    assert_eq!(
        first.get("qty"),
        Some(&Value::Decimal(Decimal::from_str("10.50").unwrap()))
    );
    assert_eq!(result.rows[1].get("qty"), Some(&Value::Null));
}

#[test]
fn decode_mapper_sees_fully_typed_values() {
    let mapper: RowMapper = Arc::new(|values| {
        values
            .into_iter()
            .map(|v| match v {
                Value::Int(i) => Value::Text(format!("#{i}")),
                other => other,
            })
            .collect()
    });
    let options = QueryOptions::default().with_decode_mapper(mapper);

    let result = assemble(sample_raw(), &options).unwrap();
    // The mapper ran after decoding: it received a typed Int, not a buffer.
    assert_eq!(result.rows[0].get("id"), Some(&Value::Text("#1".into())));
    assert_eq!(result.rows[1].get("id"), Some(&Value::Text("#2".into())));
}

#[test]
fn preserve_encoding_passes_raw_utf16_through() {
    let bytes: Vec<u8> = "grüße".encode_utf16().flat_map(u16::to_le_bytes).collect();
    let raw = RawResult {
        columns: vec![column("title", WireType::NVarChar, 0, 0)],
        rows: vec![vec![WireValue::Utf16(bytes.clone())]],
        rows_affected: 0,
    };

    let options = QueryOptions::default().with_preserve_encoding(true);
    let result = assemble(raw, &options).unwrap();
    assert_eq!(result.rows[0].get("title"), Some(&Value::Binary(bytes)));
}

#[test]
fn row_arity_mismatch_is_a_protocol_error() {
    let mut raw = sample_raw();
    raw.rows[1].pop();
    let err = assemble(raw, &QueryOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[test]
fn dml_results_carry_the_affected_row_count() {
    let raw = RawResult {
        columns: vec![],
        rows: vec![],
        rows_affected: 3,
    };
    let result = assemble(raw, &QueryOptions::default()).unwrap();
    assert_eq!(result.rows_affected, 3);
    assert_eq!(result.row_count(), 0);
}

#[tokio::test]
async fn unsupported_column_surfaces_through_a_query() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);
    script.lock().execute.push_back(Ok(RawResult {
        columns: vec![column("ref", WireType::UniqueIdentifier, 0, 0)],
        rows: vec![vec![WireValue::Bytes(vec![0; 16])]],
        rows_affected: 0,
    }));

    let err = conn
        .query("SELECT ref FROM t", &[], &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedColumn {
            wire_type: WireType::UniqueIdentifier,
            ..
        }
    ));
}

#[tokio::test]
async fn encode_errors_surface_before_anything_reaches_the_wire() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);

    let dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_micro_opt(9, 5, 1, 250_000)
        .unwrap();
    let err = conn
        .query(
            "INSERT INTO t VALUES (?)",
            &[Value::DateTime(dt)],
            &QueryOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Encode(_)));
    assert!(script.calls().is_empty());
}
