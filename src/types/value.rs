use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::types::{MAX_TEXT_BYTES, error::DatabaseError};

const MILLIS_PER_DAY: u32 = 86_400_000;
const TEXT_SERIAL_CODE: u8 = 12;
const YEAR_BASE: i16 = 2000;

/// Years are stored as `2000 - year` in a signed byte.
pub const MIN_YEAR: i16 = YEAR_BASE - i8::MAX as i16;
pub const MAX_YEAR: i16 = YEAR_BASE - i8::MIN as i16;

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Column types with their serial codes and fixed widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Null,
    TinyInt,
    SmallInt,
    Int,
    #[serde(alias = "LONG")]
    BigInt,
    Float,
    Double,
    Year,
    Time,
    DateTime,
    Date,
    Text,
}

/// Binary codec shared by every column type.
pub trait ColumnCodec {
    /// Serial code written ahead of the payload; TEXT adds its byte length.
    fn type_id_byte(&self, value: &Value) -> Result<u8, DatabaseError>;
    fn encode(&self, value: &Value) -> Result<Vec<u8>, DatabaseError>;
    fn decode(&self, bytes: &[u8]) -> Result<Value, DatabaseError>;
}

impl DataType {
    pub const ALL: [DataType; 12] = [
        DataType::Null,
        DataType::TinyInt,
        DataType::SmallInt,
        DataType::Int,
        DataType::BigInt,
        DataType::Float,
        DataType::Double,
        DataType::Year,
        DataType::Time,
        DataType::DateTime,
        DataType::Date,
        DataType::Text,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "NULL",
            DataType::TinyInt => "TINYINT",
            DataType::SmallInt => "SMALLINT",
            DataType::Int => "INT",
            DataType::BigInt => "BIGINT",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Year => "YEAR",
            DataType::Time => "TIME",
            DataType::DateTime => "DATETIME",
            DataType::Date => "DATE",
            DataType::Text => "TEXT",
        }
    }

    pub fn serial_code(&self) -> u8 {
        match self {
            DataType::Null => 0,
            DataType::TinyInt => 1,
            DataType::SmallInt => 2,
            DataType::Int => 3,
            DataType::BigInt => 4,
            DataType::Float => 5,
            DataType::Double => 6,
            DataType::Year => 8,
            DataType::Time => 9,
            DataType::DateTime => 10,
            DataType::Date => 11,
            DataType::Text => TEXT_SERIAL_CODE,
        }
    }

    /// Fixed payload width, `None` for TEXT.
    pub fn byte_width(&self) -> Option<usize> {
        match self {
            DataType::Null => Some(0),
            DataType::TinyInt | DataType::Year => Some(1),
            DataType::SmallInt => Some(2),
            DataType::Int | DataType::Float | DataType::Time => Some(4),
            DataType::BigInt | DataType::Double | DataType::DateTime | DataType::Date => Some(8),
            DataType::Text => None,
        }
    }

    /// Resolve a type id byte into its type and payload length.
    /// Unrecognised codes are read as TEXT.
    pub fn from_id_byte(id: u8) -> (DataType, usize) {
        let data_type = match id {
            0 => DataType::Null,
            1 => DataType::TinyInt,
            2 => DataType::SmallInt,
            3 => DataType::Int,
            4 => DataType::BigInt,
            5 => DataType::Float,
            6 => DataType::Double,
            8 => DataType::Year,
            9 => DataType::Time,
            10 => DataType::DateTime,
            11 => DataType::Date,
            _ => DataType::Text,
        };
        let len = data_type
            .byte_width()
            .unwrap_or_else(|| id.saturating_sub(TEXT_SERIAL_CODE) as usize);
        (data_type, len)
    }

    /// Convert a loosely typed value into this column type.
    ///
    /// NULL passes through untouched; nullability is the table's concern.
    pub fn coerce(&self, value: Value) -> Result<Value, DatabaseError> {
        let value = value.unquoted();
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            DataType::Null => Err(self.coercion_error(&value, "only NULL is accepted")),
            DataType::TinyInt => self
                .integer_in_range(&value, i8::MIN as i64, i8::MAX as i64)
                .map(|v| Value::TinyInt(v as i8)),
            DataType::SmallInt => self
                .integer_in_range(&value, i16::MIN as i64, i16::MAX as i64)
                .map(|v| Value::SmallInt(v as i16)),
            DataType::Int => self
                .integer_in_range(&value, i32::MIN as i64, i32::MAX as i64)
                .map(|v| Value::Int(v as i32)),
            DataType::BigInt => self
                .integer_in_range(&value, i64::MIN, i64::MAX)
                .map(Value::BigInt),
            DataType::Float => {
                let real = self.real(&value)?;
                if real.is_finite() && real.abs() > f32::MAX as f64 {
                    return Err(self.range_error(&value));
                }
                Ok(Value::Float(real as f32))
            }
            DataType::Double => self.real(&value).map(Value::Double),
            DataType::Year => self
                .integer_in_range(&value, MIN_YEAR as i64, MAX_YEAR as i64)
                .map(|v| Value::Year(v as i16)),
            DataType::Time => match &value {
                Value::Time(ms) if *ms < MILLIS_PER_DAY => Ok(Value::Time(*ms)),
                Value::Time(_) => Err(self.range_error(&value)),
                Value::Text(s) => parse_time(s)
                    .map(Value::Time)
                    .ok_or_else(|| self.coercion_error(&value, "expected HH:MM[:SS[.fff]]")),
                _ => self
                    .integer_in_range(&value, 0, MILLIS_PER_DAY as i64 - 1)
                    .map(|v| Value::Time(v as u32)),
            },
            DataType::Date => match &value {
                Value::Date(ms) => Ok(Value::Date(*ms)),
                Value::DateTime(ms) if ms.rem_euclid(MILLIS_PER_DAY as i64) == 0 => {
                    Ok(Value::Date(*ms))
                }
                Value::DateTime(_) => {
                    Err(self.coercion_error(&value, "datetime is not at midnight"))
                }
                Value::Text(s) => parse_date(s)
                    .map(Value::Date)
                    .ok_or_else(|| self.coercion_error(&value, "expected YYYY-MM-DD")),
                _ => self
                    .integer_in_range(&value, i64::MIN, i64::MAX)
                    .map(Value::Date),
            },
            DataType::DateTime => match &value {
                Value::DateTime(ms) | Value::Date(ms) => Ok(Value::DateTime(*ms)),
                Value::Text(s) => parse_datetime(s).map(Value::DateTime).ok_or_else(|| {
                    self.coercion_error(&value, "expected YYYY-MM-DD HH:MM:SS")
                }),
                _ => self
                    .integer_in_range(&value, i64::MIN, i64::MAX)
                    .map(Value::DateTime),
            },
            DataType::Text => {
                let text = match value {
                    Value::Text(s) => s,
                    other => other.to_string(),
                };
                if text.len() > MAX_TEXT_BYTES {
                    return Err(DatabaseError::TypeCoercion {
                        value: format!("'{}...'", text.chars().take(16).collect::<String>()),
                        expected: self.name().to_string(),
                        details: format!(
                            "{} bytes exceeds the {} byte limit",
                            text.len(),
                            MAX_TEXT_BYTES
                        ),
                    });
                }
                Ok(Value::Text(text))
            }
        }
    }

    fn integer_in_range(&self, value: &Value, min: i64, max: i64) -> Result<i64, DatabaseError> {
        let integer = value
            .as_integer()
            .ok_or_else(|| self.coercion_error(value, "not an integer"))?;
        if integer < min || integer > max {
            return Err(self.range_error(value));
        }
        Ok(integer)
    }

    fn real(&self, value: &Value) -> Result<f64, DatabaseError> {
        match value {
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        }
        .ok_or_else(|| self.coercion_error(value, "not a number"))
    }

    fn coercion_error(&self, value: &Value, details: &str) -> DatabaseError {
        DatabaseError::TypeCoercion {
            value: value.to_string(),
            expected: self.name().to_string(),
            details: details.to_string(),
        }
    }

    fn range_error(&self, value: &Value) -> DatabaseError {
        DatabaseError::Range {
            value: value.to_string(),
            data_type: self.name().to_string(),
        }
    }

    fn check_width(&self, bytes: &[u8]) -> Result<(), DatabaseError> {
        match self.byte_width() {
            Some(width) if width != bytes.len() => Err(DatabaseError::SerializationError {
                details: format!(
                    "{} expects {} bytes, got {}",
                    self.name(),
                    width,
                    bytes.len()
                ),
            }),
            _ => Ok(()),
        }
    }
}

impl ColumnCodec for DataType {
    fn type_id_byte(&self, value: &Value) -> Result<u8, DatabaseError> {
        match (self, value) {
            (DataType::Text, Value::Text(s)) => u8::try_from(s.len())
                .ok()
                .and_then(|len| TEXT_SERIAL_CODE.checked_add(len))
                .ok_or_else(|| self.coercion_error(value, "text too long for its type id byte")),
            _ => Ok(self.serial_code()),
        }
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, DatabaseError> {
        if value.data_type() != *self {
            return Err(self.coercion_error(value, "value does not match column type"));
        }
        let bytes = match value {
            Value::Null => Vec::new(),
            Value::TinyInt(v) => v.to_be_bytes().to_vec(),
            Value::SmallInt(v) => v.to_be_bytes().to_vec(),
            Value::Int(v) => v.to_be_bytes().to_vec(),
            Value::BigInt(v) => v.to_be_bytes().to_vec(),
            Value::Float(v) => v.to_be_bytes().to_vec(),
            Value::Double(v) => v.to_be_bytes().to_vec(),
            Value::Year(year) => {
                let stored = i8::try_from(YEAR_BASE - year).map_err(|_| self.range_error(value))?;
                stored.to_be_bytes().to_vec()
            }
            Value::Time(ms) => {
                if *ms >= MILLIS_PER_DAY {
                    return Err(self.range_error(value));
                }
                ms.to_be_bytes().to_vec()
            }
            Value::DateTime(ms) | Value::Date(ms) => ms.to_be_bytes().to_vec(),
            Value::Text(s) => {
                self.type_id_byte(value)?;
                s.as_bytes().to_vec()
            }
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, DatabaseError> {
        self.check_width(bytes)?;
        let value = match self {
            DataType::Null => Value::Null,
            DataType::TinyInt => Value::TinyInt(i8::from_be_bytes([bytes[0]])),
            DataType::SmallInt => Value::SmallInt(i16::from_be_bytes([bytes[0], bytes[1]])),
            DataType::Int => Value::Int(i32::from_be_bytes(fixed(bytes))),
            DataType::BigInt => Value::BigInt(i64::from_be_bytes(fixed(bytes))),
            DataType::Float => Value::Float(f32::from_be_bytes(fixed(bytes))),
            DataType::Double => Value::Double(f64::from_be_bytes(fixed(bytes))),
            DataType::Year => Value::Year(YEAR_BASE - i8::from_be_bytes([bytes[0]]) as i16),
            DataType::Time => Value::Time(u32::from_be_bytes(fixed(bytes))),
            DataType::DateTime => Value::DateTime(i64::from_be_bytes(fixed(bytes))),
            DataType::Date => Value::Date(i64::from_be_bytes(fixed(bytes))),
            DataType::Text => Value::Text(String::from_utf8(bytes.to_vec()).map_err(|_| {
                DatabaseError::SerializationError {
                    details: "Invalid UTF-8 in TEXT value".to_string(),
                }
            })?),
        };
        Ok(value)
    }
}

// Width is checked by the caller.
fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buffer = [0u8; N];
    buffer.copy_from_slice(&bytes[..N]);
    buffer
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "LONG" {
            return Ok(DataType::BigInt);
        }
        DataType::ALL
            .into_iter()
            .find(|data_type| data_type.name() == upper)
            .ok_or_else(|| DatabaseError::TypeCoercion {
                value: s.to_string(),
                expected: "column type".to_string(),
                details: "unknown type name".to_string(),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    /// Calendar year.
    Year(i16),
    /// Milliseconds since midnight.
    Time(u32),
    /// Milliseconds since the Unix epoch (UTC).
    DateTime(i64),
    /// Milliseconds since the Unix epoch (UTC), at midnight.
    Date(i64),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::TinyInt(_) => DataType::TinyInt,
            Value::SmallInt(_) => DataType::SmallInt,
            Value::Int(_) => DataType::Int,
            Value::BigInt(_) => DataType::BigInt,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::Year(_) => DataType::Year,
            Value::Time(_) => DataType::Time,
            Value::DateTime(_) => DataType::DateTime,
            Value::Date(_) => DataType::Date,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Encoded payload size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Value::Text(s) => s.len(),
            other => other.data_type().byte_width().unwrap_or(0),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_id_byte(&self) -> Result<u8, DatabaseError> {
        self.data_type().type_id_byte(self)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DatabaseError> {
        self.data_type().encode(self)
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Integer view used by coercion: integer variants, years and numeric text.
    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Year(year) => Some(*year as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            other => other.as_i64(),
        }
    }

    /// Strip the single quotes the statement parser leaves around literals.
    fn unquoted(self) -> Value {
        match self {
            Value::Text(s) if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') => {
                Value::Text(s[1..s.len() - 1].to_string())
            }
            other => other,
        }
    }
}

/// Agrees with `partial_cmp`: numeric variants compare by value and a DATE
/// equals the DATETIME at the same instant.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Year(a), Value::Year(b)) => a.partial_cmp(b),
            (Value::Time(a), Value::Time(b)) => a.partial_cmp(b),
            (Value::Date(a) | Value::DateTime(a), Value::Date(b) | Value::DateTime(b)) => {
                a.partial_cmp(b)
            }
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None, // Mixed types
                },
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Year(v) => write!(f, "{v}"),
            Value::Time(ms) => {
                match NaiveTime::from_num_seconds_from_midnight_opt(
                    ms / 1000,
                    (ms % 1000) * 1_000_000,
                ) {
                    Some(time) if ms % 1000 == 0 => write!(f, "{}", time.format("%H:%M:%S")),
                    Some(time) => write!(f, "{}", time.format("%H:%M:%S%.3f")),
                    None => write!(f, "{ms}"),
                }
            }
            Value::DateTime(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(dt) if ms.rem_euclid(1000) == 0 => {
                    write!(f, "{}", dt.naive_utc().format("%Y-%m-%d %H:%M:%S"))
                }
                Some(dt) => write!(f, "{}", dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.3f")),
                None => write!(f, "{ms}"),
            },
            Value::Date(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.date_naive().format("%Y-%m-%d")),
                None => write!(f, "{ms}"),
            },
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

fn parse_time(s: &str) -> Option<u32> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
        .map(|time| time.num_seconds_from_midnight() * 1000 + (time.nanosecond() / 1_000_000).min(999))
}

fn parse_date(s: &str) -> Option<i64> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

fn parse_datetime(s: &str) -> Option<i64> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
        .or_else(|| parse_date(s))
}
