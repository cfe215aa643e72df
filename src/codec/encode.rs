use chrono::Timelike;

use crate::error::Error;
use crate::transport::WireParam;
use crate::types::Value;

/// Largest magnitude that still has fewer than 10 decimal digits. Anything
/// beyond this travels as text so it can never overflow a wire integer.
const NATIVE_INT_MAX: i64 = 999_999_999;

/// Encode one parameter value into the wire form the transport binds.
///
/// Dates, times and datetimes are rendered in fixed, locale-independent
/// formats. A time or datetime with non-zero microseconds has no lossless
/// wire form and fails with [`Error::Encode`]; callers that want sub-second
/// precision must format the value as text themselves.
///
/// # Errors
///
/// Returns [`Error::Encode`] when the value cannot be represented without
/// losing information.
pub fn encode(value: &Value) -> Result<WireParam, Error> {
    match value {
        Value::Text(s) => Ok(encode_text(s)),
        Value::Binary(bytes) => encode_binary(bytes),
        // Canonical string form keeps every digit; the wire integer and
        // float types cannot.
        Value::Decimal(d) => Ok(WireParam::VarChar(d.to_string())),
        Value::Int(i) => Ok(encode_int(*i)),
        // Text avoids the binary-float round trip through the server's
        // decimal literal parser.
        Value::Float(f) => Ok(WireParam::VarChar(f.to_string())),
        Value::Date(d) => Ok(WireParam::VarChar(d.format("%Y-%m-%d").to_string())),
        Value::Time(t) => {
            if t.nanosecond() != 0 {
                return Err(Error::Encode(
                    "time with sub-second precision has no wire form; bind it as text instead"
                        .into(),
                ));
            }
            Ok(WireParam::VarChar(t.format("%H:%M:%S").to_string()))
        }
        Value::DateTime(dt) => {
            if dt.time().nanosecond() != 0 {
                return Err(Error::Encode(
                    "datetime with sub-second precision would be truncated on the wire; \
                     bind it as text instead"
                        .into(),
                ));
            }
            Ok(WireParam::VarChar(
                dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            ))
        }
        Value::Null => Ok(WireParam::Null),
    }
}

fn encode_text(s: &str) -> WireParam {
    if s.is_ascii() {
        WireParam::VarChar(s.to_string())
    } else {
        WireParam::NVarChar(utf16_le(s))
    }
}

fn encode_binary(bytes: &[u8]) -> Result<WireParam, Error> {
    if bytes.is_ascii() {
        return Ok(WireParam::VarChar(
            String::from_utf8_lossy(bytes).into_owned(),
        ));
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(WireParam::NVarChar(utf16_le(s))),
        Err(_) => Err(Error::Encode(
            "binary string is not valid UTF-8 and cannot be re-encoded as UTF-16LE".into(),
        )),
    }
}

fn encode_int(value: i64) -> WireParam {
    match i32::try_from(value) {
        Ok(native) if value.unsigned_abs() <= NATIVE_INT_MAX as u64 => WireParam::Integer(native),
        _ => WireParam::VarChar(value.to_string()),
    }
}

/// SQL Server's native unicode wire form.
fn utf16_le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}
