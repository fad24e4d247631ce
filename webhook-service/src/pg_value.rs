//! Postgres row decoding.
//!
//! Every cell becomes a JSON value by its Postgres type name. Types without a
//! dedicated arm are read as text when their wire bytes are readable
//! (enums, domains and most extension types send UTF-8 even in binary
//! format); anything else renders as `<typename>`.

use serde_json::Value;
use sqlx::postgres::types::{Oid, PgInterval, PgTimeTz};
use sqlx::postgres::{PgRow, Postgres};
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::types::{BigDecimal, Uuid};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

use common::models::query::ColumnInfo;

type Decoded = Result<Option<Value>, sqlx::Error>;

/// Column names and type names of a row.
pub fn column_info(row: &PgRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|c| ColumnInfo {
            name: c.name().to_string(),
            data_type: c.type_info().name().to_string(),
        })
        .collect()
}

/// Every cell of a row, in column order.
pub fn row_values(row: &PgRow) -> Vec<Value> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> Value {
    let type_name = row.column(idx).type_info().name().to_string();

    let decoded: Decoded = match type_name.as_str() {
        "BOOL" => scalar(row, idx, Value::Bool),
        "INT2" => scalar(row, idx, |v: i16| Value::from(v)),
        "INT4" => scalar(row, idx, |v: i32| Value::from(v)),
        "INT8" => scalar(row, idx, |v: i64| Value::from(v)),
        "FLOAT4" => scalar(row, idx, |v: f32| Value::from(v)),
        "FLOAT8" => scalar(row, idx, |v: f64| Value::from(v)),
        "OID" => scalar(row, idx, |v: Oid| Value::from(v.0)),
        "NUMERIC" => scalar(row, idx, |v: BigDecimal| Value::String(v.to_string())),
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => scalar(row, idx, Value::String),
        "JSON" | "JSONB" => scalar(row, idx, |v: Value| v),
        "UUID" => scalar(row, idx, |v: Uuid| Value::String(v.to_string())),
        "BYTEA" => scalar(row, idx, |v: Vec<u8>| Value::String(bytea_text(&v))),
        "INET" | "CIDR" => scalar(row, idx, |v: IpNetwork| Value::String(inet_text(&v))),
        "TIMESTAMPTZ" => scalar(row, idx, |v: chrono::DateTime<chrono::Utc>| {
            Value::String(v.to_rfc3339())
        }),
        "TIMESTAMP" => scalar(row, idx, |v: chrono::NaiveDateTime| Value::String(v.to_string())),
        "DATE" => scalar(row, idx, |v: chrono::NaiveDate| Value::String(v.to_string())),
        "TIME" => scalar(row, idx, |v: chrono::NaiveTime| Value::String(v.to_string())),
        "TIMETZ" => scalar(row, idx, |v: PgTimeTz<chrono::NaiveTime, chrono::FixedOffset>| {
            Value::String(format!("{}{}", v.time, v.offset))
        }),
        "INTERVAL" => scalar(row, idx, |v: PgInterval| Value::String(interval_text(&v))),

        "BOOL[]" => array(row, idx, Value::Bool),
        "INT2[]" => array(row, idx, |v: i16| Value::from(v)),
        "INT4[]" => array(row, idx, |v: i32| Value::from(v)),
        "INT8[]" => array(row, idx, |v: i64| Value::from(v)),
        "FLOAT4[]" => array(row, idx, |v: f32| Value::from(v)),
        "FLOAT8[]" => array(row, idx, |v: f64| Value::from(v)),
        "NUMERIC[]" => array(row, idx, |v: BigDecimal| Value::String(v.to_string())),
        "TEXT[]" | "VARCHAR[]" | "CHAR[]" | "NAME[]" => array(row, idx, Value::String),
        "UUID[]" => array(row, idx, |v: Uuid| Value::String(v.to_string())),
        "DATE[]" => array(row, idx, |v: chrono::NaiveDate| Value::String(v.to_string())),
        "TIMESTAMPTZ[]" => array(row, idx, |v: chrono::DateTime<chrono::Utc>| {
            Value::String(v.to_rfc3339())
        }),

        _ => readable_text(row, idx),
    };

    match decoded {
        Ok(Some(value)) => value,
        Ok(None) => Value::Null,
        Err(e) => {
            tracing::debug!(column = idx, type_name = %type_name, error = %e, "无法解码列值");
            Value::String(format!("<{}>", type_name.to_lowercase()))
        }
    }
}

fn scalar<'r, T, F>(row: &'r PgRow, idx: usize, to_json: F) -> Decoded
where
    Option<T>: Decode<'r, Postgres> + Type<Postgres>,
    F: Fn(T) -> Value,
{
    row.try_get::<Option<T>, _>(idx).map(|v| v.map(to_json))
}

fn array<'r, T, F>(row: &'r PgRow, idx: usize, to_json: F) -> Decoded
where
    Option<Vec<Option<T>>>: Decode<'r, Postgres> + Type<Postgres>,
    F: Fn(T) -> Value,
{
    row.try_get::<Option<Vec<Option<T>>>, _>(idx).map(|v| {
        v.map(|items| {
            Value::Array(
                items
                    .into_iter()
                    .map(|item| item.map(&to_json).unwrap_or(Value::Null))
                    .collect(),
            )
        })
    })
}

/// Reads the raw cell as text; binary payloads are rejected.
fn readable_text(row: &PgRow, idx: usize) -> Decoded {
    let text = row.try_get_unchecked::<Option<String>, _>(idx)?;
    match text {
        None => Ok(None),
        Some(text) if is_readable(&text) => Ok(Some(Value::String(text))),
        Some(_) => Err(sqlx::Error::Decode("binary payload is not text".into())),
    }
}

fn is_readable(text: &str) -> bool {
    text.chars().all(|c| !c.is_control() || c == '\n' || c == '\t' || c == '\r')
}

/// Postgres hex output: `\x0102ff`.
fn bytea_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Host addresses print without their full-length prefix, as Postgres does.
fn inet_text(net: &IpNetwork) -> String {
    match net {
        IpNetwork::V4(n) if n.prefix() == 32 => n.ip().to_string(),
        IpNetwork::V6(n) if n.prefix() == 128 => n.ip().to_string(),
        other => other.to_string(),
    }
}

/// Postgres-style interval text, e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn interval_text(interval: &PgInterval) -> String {
    fn unit(n: i64, singular: &str, plural: &str) -> String {
        format!("{} {}", n, if n.abs() == 1 { singular } else { plural })
    }

    let mut parts = Vec::new();
    let years = i64::from(interval.months / 12);
    let months = i64::from(interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year", "years"));
    }
    if months != 0 {
        parts.push(unit(months, "mon", "mons"));
    }
    if interval.days != 0 {
        parts.push(unit(i64::from(interval.days), "day", "days"));
    }

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let frac = micros % 1_000_000;
        let mut clock = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        if frac != 0 {
            let digits = format!("{:06}", frac);
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_text_matches_postgres_output() {
        let interval = PgInterval {
            months: 14,
            days: 3,
            microseconds: 4 * 3_600_000_000 + 5 * 60_000_000 + 6_500_000,
        };
        assert_eq!(interval_text(&interval), "1 year 2 mons 3 days 04:05:06.5");

        let one_day = PgInterval {
            months: 0,
            days: 1,
            microseconds: 2 * 3_600_000_000,
        };
        assert_eq!(interval_text(&one_day), "1 day 02:00:00");

        let zero = PgInterval {
            months: 0,
            days: 0,
            microseconds: 0,
        };
        assert_eq!(interval_text(&zero), "00:00:00");
    }

    #[test]
    fn test_bytea_text_is_hex() {
        assert_eq!(bytea_text(&[0x01, 0x02, 0xff]), "\\x0102ff");
        assert_eq!(bytea_text(&[]), "\\x");
    }

    #[test]
    fn test_inet_text_hides_host_prefix() {
        let host: IpNetwork = "10.0.0.1/32".parse().unwrap();
        let net: IpNetwork = "10.0.0.0/8".parse().unwrap();
        assert_eq!(inet_text(&host), "10.0.0.1");
        assert_eq!(inet_text(&net), "10.0.0.0/8");
    }

    #[test]
    fn test_binary_payload_is_not_readable() {
        assert!(is_readable("happy"));
        assert!(is_readable("line one\nline two"));
        assert!(!is_readable("\u{0}\u{3}\u{0}\u{0}"));
    }
}
