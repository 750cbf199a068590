use lumbung::types::{
    record::{CELL_PREFIX_SIZE, Record},
    value::Value,
};

#[test]
fn test_cell_layout() {
    let record = Record::new(
        7,
        vec![Value::text("ab"), Value::Null, Value::SmallInt(3)],
    );
    let bytes = record.to_bytes().unwrap();

    // payload: num_columns(1) + ids(3) + "ab"(2) + smallint(2)
    assert_eq!(record.payload_size(), 8);
    assert_eq!(bytes.len(), CELL_PREFIX_SIZE + 8);
    assert_eq!(&bytes[0..2], &[0, 8]);
    assert_eq!(&bytes[2..6], &7u32.to_be_bytes());
    assert_eq!(bytes[6], 3);
    assert_eq!(&bytes[7..10], &[14, 0, 2]);
    assert_eq!(&bytes[10..], &[b'a', b'b', 0, 3]);
}

#[test]
fn test_record_round_trip() {
    let record = Record::new(
        42,
        vec![
            Value::text("Rocinante"),
            Value::Int(10),
            Value::Null,
            Value::DateTime(1_600_000_000_000),
            Value::Year(1605),
        ],
    );
    // 2000 - 1605 does not fit the signed YEAR byte.
    assert!(record.to_bytes().is_err());

    let record = Record::new(42, record.values[..4].to_vec());
    let decoded = Record::from_bytes(&record.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn test_cell_size_reads_the_prefix() {
    let record = Record::new(1, vec![Value::text("asdasda"), Value::Int(10), Value::text("scsc")]);
    let mut bytes = record.to_bytes().unwrap();
    assert_eq!(Record::cell_size(&bytes).unwrap(), 25);

    // Trailing bytes beyond the cell are ignored by from_bytes.
    bytes.extend_from_slice(&[0xAA, 0xBB]);
    assert_eq!(Record::from_bytes(&bytes).unwrap(), record);
}

#[test]
fn test_truncated_cell_is_rejected() {
    let record = Record::new(1, vec![Value::BigInt(5)]);
    let bytes = record.to_bytes().unwrap();
    assert!(Record::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    assert!(Record::from_bytes(&bytes[..1]).is_err());
}

#[test]
fn test_set_value_bounds() {
    let mut record = Record::new(1, vec![Value::Int(1)]);
    record.set_value(0, Value::Int(2)).unwrap();
    assert_eq!(record.get_value(0), Some(&Value::Int(2)));
    assert!(record.set_value(1, Value::Int(3)).is_err());
}
