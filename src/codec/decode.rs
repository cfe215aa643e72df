use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::error::Error;
use crate::transport::{ColumnDescriptor, WireType, WireValue};
use crate::types::Value;

/// Per-call switches consulted while decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Return `nchar`/`nvarchar` data as the raw UTF-16LE bytes instead of
    /// converting to a Rust string.
    pub preserve_encoding: bool,
}

/// Decode one fetched column value.
///
/// The rule is selected by the column's wire type plus precision/scale, not
/// by inspecting the buffer, and the rule table is total: every type the
/// transport can report either has a rule or fails with
/// [`Error::UnsupportedColumn`].
///
/// Known lossy conversion: `smalldatetime`/`datetime`/`datetime2` decode
/// with microseconds forced to 0. Callers that need sub-second precision
/// must select the column as text.
///
/// # Errors
///
/// [`Error::UnsupportedColumn`] for column types with no decode rule, and
/// [`Error::Protocol`] when the transport's buffer does not match the type
/// it reported.
pub fn decode(
    value: WireValue,
    column: &ColumnDescriptor,
    options: &DecodeOptions,
) -> Result<Value, Error> {
    match column.wire_type {
        WireType::Char | WireType::VarChar | WireType::Text => decode_char(value, column),
        WireType::NChar | WireType::NVarChar | WireType::NText => {
            decode_nchar(value, column, options)
        }
        WireType::Bit | WireType::TinyInt | WireType::SmallInt | WireType::Int => {
            decode_int(value, column)
        }
        WireType::Decimal | WireType::Numeric => decode_numeric(value, column),
        WireType::Float | WireType::Real => decode_float(value, column),
        WireType::BigInt | WireType::Money | WireType::SmallMoney => {
            decode_widest_as_text(value, column)
        }
        WireType::Date => decode_date(value, column),
        WireType::SmallDateTime | WireType::DateTime | WireType::DateTime2 => {
            decode_datetime(value, column)
        }
        WireType::Time
        | WireType::DateTimeOffset
        | WireType::UniqueIdentifier
        | WireType::Binary
        | WireType::VarBinary
        | WireType::Image
        | WireType::RowVersion
        | WireType::Xml => Err(unsupported(column)),
    }
}

fn decode_char(value: WireValue, column: &ColumnDescriptor) -> Result<Value, Error> {
    match value {
        WireValue::Text(s) => Ok(Value::Text(s)),
        WireValue::Null => Ok(Value::Null),
        other => Err(mismatch(column, &other)),
    }
}

fn decode_nchar(
    value: WireValue,
    column: &ColumnDescriptor,
    options: &DecodeOptions,
) -> Result<Value, Error> {
    match value {
        WireValue::Utf16(bytes) => {
            if options.preserve_encoding {
                return Ok(Value::Binary(bytes));
            }
            if bytes.len() % 2 != 0 {
                return Err(Error::Protocol(format!(
                    "column {:?}: UTF-16LE buffer has odd length {}",
                    column.name,
                    bytes.len()
                )));
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            let text = String::from_utf16(&units).map_err(|_| {
                Error::Protocol(format!(
                    "column {:?}: buffer is not valid UTF-16LE",
                    column.name
                ))
            })?;
            Ok(Value::Text(text))
        }
        WireValue::Null => Ok(Value::Null),
        other => Err(mismatch(column, &other)),
    }
}

fn decode_int(value: WireValue, column: &ColumnDescriptor) -> Result<Value, Error> {
    match value {
        WireValue::Int(i) => Ok(Value::Int(i)),
        WireValue::Null => Ok(Value::Null),
        other => Err(mismatch(column, &other)),
    }
}

/// `decimal`/`numeric` splits three ways on the declared precision/scale:
/// narrow integral columns decode as integers, anything wider than 15 digits
/// stays text, the rest decode as exact decimals.
fn decode_numeric(value: WireValue, column: &ColumnDescriptor) -> Result<Value, Error> {
    let digits = match value {
        WireValue::Numeric(s) => s,
        WireValue::Null => return Ok(Value::Null),
        other => return Err(mismatch(column, &other)),
    };
    if column.precision > 15 {
        return Ok(Value::Text(digits));
    }
    if column.precision < 10 && column.scale == 0 {
        let n: i64 = digits.parse().map_err(|_| {
            Error::Protocol(format!(
                "column {:?}: {digits:?} is not an integer",
                column.name
            ))
        })?;
        return Ok(Value::Int(n));
    }
    let d = Decimal::from_str_exact(&digits).map_err(|e| {
        Error::Protocol(format!(
            "column {:?}: {digits:?} is not a decimal: {e}",
            column.name
        ))
    })?;
    Ok(Value::Decimal(d))
}

fn decode_float(value: WireValue, column: &ColumnDescriptor) -> Result<Value, Error> {
    match value {
        WireValue::Float(f) => Decimal::from_f64(f).map(Value::Decimal).ok_or_else(|| {
            Error::Protocol(format!(
                "column {:?}: float {f} has no decimal representation",
                column.name
            ))
        }),
        WireValue::Null => Ok(Value::Null),
        other => Err(mismatch(column, &other)),
    }
}

/// `bigint` and the money types exceed what any fixed-width numeric the
/// codec hands out can hold without loss, so they decode as text.
fn decode_widest_as_text(value: WireValue, column: &ColumnDescriptor) -> Result<Value, Error> {
    match value {
        WireValue::Int(i) => Ok(Value::Text(i.to_string())),
        WireValue::Numeric(s) => Ok(Value::Text(s)),
        WireValue::Null => Ok(Value::Null),
        other => Err(mismatch(column, &other)),
    }
}

fn decode_date(value: WireValue, column: &ColumnDescriptor) -> Result<Value, Error> {
    match value {
        WireValue::Date { year, month, day } => NaiveDate::from_ymd_opt(year, month, day)
            .map(Value::Date)
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "column {:?}: {year:04}-{month:02}-{day:02} is not a valid date",
                    column.name
                ))
            }),
        WireValue::Null => Ok(Value::Null),
        other => Err(mismatch(column, &other)),
    }
}

fn decode_datetime(value: WireValue, column: &ColumnDescriptor) -> Result<Value, Error> {
    match value {
        WireValue::Timestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
            // Sub-second data is dropped on decode; see the module docs.
            nanos: _,
        } => {
            let dt = NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|d| d.and_hms_opt(hour, minute, second));
            dt.map(Value::DateTime).ok_or_else(|| {
                Error::Protocol(format!(
                    "column {:?}: timestamp fields out of range",
                    column.name
                ))
            })
        }
        WireValue::Null => Ok(Value::Null),
        other => Err(mismatch(column, &other)),
    }
}

fn unsupported(column: &ColumnDescriptor) -> Error {
    Error::UnsupportedColumn {
        column: column.name.clone(),
        wire_type: column.wire_type,
    }
}

fn mismatch(column: &ColumnDescriptor, value: &WireValue) -> Error {
    Error::Protocol(format!(
        "column {:?}: buffer {value:?} does not match reported type {:?}",
        column.name, column.wire_type
    ))
}
