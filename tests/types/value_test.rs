use lumbung::types::{
    error::DatabaseError,
    value::{ColumnCodec, DataType, MAX_YEAR, MIN_YEAR, Value},
};

#[test]
fn test_serial_codes_match_the_id_byte_table() {
    let codes: Vec<u8> = DataType::ALL.iter().map(DataType::serial_code).collect();
    assert_eq!(codes, vec![0, 1, 2, 3, 4, 5, 6, 8, 9, 10, 11, 12]);
    assert_eq!("LONG".parse::<DataType>().unwrap(), DataType::BigInt);
    assert_eq!("datetime".parse::<DataType>().unwrap(), DataType::DateTime);
    assert!("BLOB".parse::<DataType>().is_err());
}

#[test]
fn test_text_id_byte_carries_its_length() {
    let value = Value::text("hello");
    assert_eq!(value.type_id_byte().unwrap(), 12 + 5);
    assert_eq!(DataType::from_id_byte(17), (DataType::Text, 5));
    // Unknown codes fall back to TEXT.
    assert_eq!(DataType::from_id_byte(7).0, DataType::Text);
}

#[test]
fn test_fixed_width_encoding_is_big_endian() {
    assert_eq!(Value::SmallInt(258).to_bytes().unwrap(), vec![0x01, 0x02]);
    assert_eq!(Value::Int(-1).to_bytes().unwrap(), vec![0xFF; 4]);
    assert_eq!(Value::Double(1.5).to_bytes().unwrap(), 1.5f64.to_be_bytes().to_vec());
    assert!(Value::Null.to_bytes().unwrap().is_empty());
}

#[test]
fn test_values_survive_encode_and_decode() {
    let values = vec![
        Value::Null,
        Value::TinyInt(-128),
        Value::SmallInt(i16::MAX),
        Value::Int(123_456),
        Value::BigInt(i64::MIN),
        Value::Float(2.5),
        Value::Double(-0.125),
        Value::Year(1999),
        Value::Time(45_296_789),
        Value::DateTime(1_700_000_000_123),
        Value::Date(1_699_920_000_000),
        Value::text("x".repeat(115)),
    ];
    for value in values {
        let data_type = value.data_type();
        let bytes = value.to_bytes().unwrap();
        let (decoded_type, len) = DataType::from_id_byte(value.type_id_byte().unwrap());
        assert_eq!(decoded_type, data_type);
        assert_eq!(len, bytes.len());
        assert_eq!(data_type.decode(&bytes).unwrap(), value);
    }
}

#[test]
fn test_year_is_stored_relative_to_2000() {
    let year = DataType::Year.coerce(Value::text("2023")).unwrap();
    assert_eq!(year, Value::Year(2023));
    assert_eq!(year.to_bytes().unwrap(), vec![(-23i8) as u8]);

    assert!(DataType::Year.coerce(Value::Int(MIN_YEAR as i32)).is_ok());
    assert!(DataType::Year.coerce(Value::Int(MAX_YEAR as i32)).is_ok());
    assert!(matches!(
        DataType::Year.coerce(Value::Int(MAX_YEAR as i32 + 1)),
        Err(DatabaseError::Range { .. })
    ));
}

#[test]
fn test_coercion_strips_quotes_and_checks_bounds() {
    assert_eq!(
        DataType::Int.coerce(Value::text("'123'")).unwrap(),
        Value::Int(123)
    );
    assert_eq!(
        DataType::Text.coerce(Value::text("'Don Juan'")).unwrap(),
        Value::text("Don Juan")
    );
    assert!(matches!(
        DataType::TinyInt.coerce(Value::Int(200)),
        Err(DatabaseError::Range { .. })
    ));
    assert!(matches!(
        DataType::Int.coerce(Value::text("twelve")),
        Err(DatabaseError::TypeCoercion { .. })
    ));
    assert!(matches!(
        DataType::Text.coerce(Value::text("y".repeat(116))),
        Err(DatabaseError::TypeCoercion { .. })
    ));
    assert_eq!(DataType::Int.coerce(Value::Null).unwrap(), Value::Null);
}

#[test]
fn test_dates_and_times_parse_with_chrono() {
    assert_eq!(
        DataType::Time.coerce(Value::text("12:34:56")).unwrap(),
        Value::Time((12 * 3600 + 34 * 60 + 56) * 1000)
    );
    assert_eq!(
        DataType::Date.coerce(Value::text("1970-01-02")).unwrap(),
        Value::Date(86_400_000)
    );
    assert_eq!(
        DataType::DateTime
            .coerce(Value::text("'1970-01-01 00:00:01'"))
            .unwrap(),
        Value::DateTime(1000)
    );
    assert!(DataType::Date.coerce(Value::text("01/02/1970")).is_err());

    assert_eq!(Value::DateTime(1000).to_string(), "1970-01-01 00:00:01");
    assert_eq!(Value::Date(86_400_000).to_string(), "1970-01-02");
    assert_eq!(Value::Time(3_600_000).to_string(), "01:00:00");
}

#[test]
fn test_value_ordering() {
    assert!(Value::Null < Value::Int(0));
    assert!(Value::TinyInt(5) < Value::BigInt(10));
    assert!(Value::Int(5) < Value::Double(5.5));
    assert!(Value::text("apple") < Value::text("banana"));
    assert!(Value::Date(0) < Value::DateTime(1));
    assert_eq!(Value::Int(1).partial_cmp(&Value::text("1")), None);
}

#[test]
fn test_equality_agrees_with_ordering() {
    let pairs = [
        (Value::Int(1), Value::BigInt(1)),
        (Value::Date(0), Value::DateTime(0)),
        (Value::SmallInt(7), Value::Double(7.0)),
        (Value::Null, Value::Null),
    ];
    for (a, b) in pairs {
        assert_eq!(a.partial_cmp(&b), Some(std::cmp::Ordering::Equal));
        assert_eq!(a, b);
    }

    assert_ne!(Value::Int(1), Value::text("1"));
    assert_ne!(Value::Null, Value::Int(0));
    assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
}

#[test]
fn test_date_accepts_a_midnight_datetime() {
    let midnight = DataType::Date.coerce(Value::DateTime(86_400_000)).unwrap();
    assert!(matches!(midnight, Value::Date(86_400_000)));

    assert!(matches!(
        DataType::Date.coerce(Value::DateTime(86_400_001)),
        Err(DatabaseError::TypeCoercion { details, .. }) if details == "datetime is not at midnight"
    ));
    assert!(matches!(
        DataType::DateTime.coerce(Value::Date(0)).unwrap(),
        Value::DateTime(0)
    ));
}
