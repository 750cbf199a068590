use lumbung::{
    config::EngineConfig,
    executor::{
        command::{Assignment, ColumnDefinition, WhereClause},
        predicate::Comparator,
    },
    storage::table::Table,
    types::{NO_PAGE, error::DatabaseError, page::Page, value::{DataType, Value}},
};

fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

fn quixote_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("FirstString", DataType::Text).not_null(),
        ColumnDefinition::new("MiddleInt", DataType::Int).not_null(),
        ColumnDefinition::new("LastString", DataType::Text).not_null(),
        ColumnDefinition::new("TimeOfCreation", DataType::DateTime)
            .unique()
            .not_null(),
    ]
}

fn quixote_row(i: u32) -> Vec<Value> {
    vec![
        Value::text("'Alonso Quixano'"),
        Value::text(format!("'{}'", i * 10)),
        Value::text("'de la Mancha'"),
        Value::text(format!("'2024-01-01 00:{:02}:{:02}'", i / 60, i % 60)),
    ]
}

/// Rows 1..=n with MiddleInt = 10 * (row - 1).
fn quixote_table(n: u32) -> Table {
    let mut table = Table::create_table("quixote", &quixote_columns(), EngineConfig::default()).unwrap();
    for i in 0..n {
        let row_id = table.insert(&[], quixote_row(i)).unwrap();
        assert_eq!(row_id, i + 1);
    }
    table
}

#[test]
fn test_record_budget_follows_page_size() {
    let table = quixote_table(0);
    assert_eq!(table.max_record_bytes(), (512 - 16) / 6 - 2);

    let config = EngineConfig::default().with_page_size(1024);
    let table = Table::create_table("wide", &quixote_columns(), config).unwrap();
    assert_eq!(table.max_record_bytes(), (1024 - 16) / 6 - 2);
}

#[test]
fn test_update_then_select_with_not_equal() {
    let mut table = quixote_table(30);

    let updated = table
        .update(
            &Assignment::new("FirstString", "'Don Juan Quixote'"),
            Some(&WhereClause::new("MiddleInt", Comparator::Eq, "10")),
        )
        .unwrap();
    assert_eq!(updated, 1);

    let result = table
        .select(
            &[],
            Some(&WhereClause::new("FirstString", Comparator::Ne, "'Don Juan Quixote'")),
        )
        .unwrap();
    assert_eq!(result.len(), 29);
    assert_eq!(result.columns, names(&["FirstString", "MiddleInt", "LastString", "TimeOfCreation"]));

    let negated = WhereClause::new("FirstString", Comparator::Eq, "'Don Juan Quixote'").negated();
    assert_eq!(table.select(&[], Some(&negated)).unwrap().len(), 29);

    let don = table.get(2).unwrap();
    assert_eq!(don.values[0], Value::text("Don Juan Quixote"));
    assert_eq!(don.values[1], Value::Int(10));
}

#[test]
fn test_oversized_record_is_rejected() {
    let mut table = quixote_table(3);
    let long = "x".repeat(100);
    let result = table.insert(
        &[],
        vec![
            Value::text(long),
            Value::Int(1),
            Value::text("y"),
            Value::text("2030-01-01 00:00:00"),
        ],
    );
    assert!(matches!(result, Err(DatabaseError::RecordTooLarge { max: 80, .. })));
    assert_eq!(table.record_count(), 3);
    assert_eq!(table.next_row_id(), 4);
}

#[test]
fn test_duplicate_unique_value_is_rejected() {
    let mut table = quixote_table(5);
    let result = table.insert(&[], quixote_row(2));
    assert!(matches!(
        result,
        Err(DatabaseError::UniquenessViolation { ref column, .. }) if column == "TimeOfCreation"
    ));
    assert_eq!(table.record_count(), 5);
    assert_eq!(table.next_row_id(), 6);
}

#[test]
fn test_missing_not_null_column() {
    let mut table = quixote_table(0);
    let result = table.insert(
        &names(&["FirstString", "MiddleInt", "TimeOfCreation"]),
        vec![Value::text("a"), Value::Int(1), Value::text("2024-02-02")],
    );
    assert!(matches!(
        result,
        Err(DatabaseError::NullConstraintViolation { ref column }) if column == "LastString"
    ));
    assert_eq!(table.record_count(), 0);
}

#[test]
fn test_insert_with_reordered_columns() {
    let mut table = quixote_table(0);
    table
        .insert(
            &names(&["TimeOfCreation", "LastString", "MiddleInt", "FirstString"]),
            vec![
                Value::text("'2024-05-05 05:05:05'"),
                Value::text("'last'"),
                Value::text("'-7'"),
                Value::text("'first'"),
            ],
        )
        .unwrap();

    let result = table
        .select(&names(&["MiddleInt", "FirstString"]), None)
        .unwrap();
    assert_eq!(result.columns, names(&["MiddleInt", "FirstString"]));
    assert_eq!(result.rows, vec![vec![Value::Int(-7), Value::text("first")]]);
}

#[test]
fn test_bad_values_and_columns() {
    let mut table = quixote_table(1);
    let mut row = quixote_row(5);
    row[1] = Value::text("'ten'");
    assert!(matches!(table.insert(&[], row), Err(DatabaseError::TypeCoercion { .. })));

    assert!(matches!(
        table.select(&names(&["Nope"]), None),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
    assert!(table.insert(&[], vec![Value::Int(1)]).is_err());
    assert_eq!(table.record_count(), 1);
}

#[test]
fn test_update_is_all_or_nothing() {
    let mut table = quixote_table(20);

    let too_long = Assignment::new("LastString", "z".repeat(60));
    assert!(matches!(
        table.update(&too_long, None),
        Err(DatabaseError::RecordTooLarge { .. })
    ));

    let same_time = Assignment::new("TimeOfCreation", "2000-01-01 00:00:00");
    assert!(matches!(
        table.update(&same_time, Some(&WhereClause::new("MiddleInt", Comparator::Lt, 30))),
        Err(DatabaseError::UniquenessViolation { .. })
    ));

    let rows = table.select(&names(&["LastString"]), None).unwrap();
    assert!(rows.rows.iter().all(|r| r[0] == Value::text("de la Mancha")));

    let one = table
        .update(&same_time, Some(&WhereClause::new("MiddleInt", Comparator::Eq, 30)))
        .unwrap();
    assert_eq!(one, 1);
}

#[test]
fn test_conditional_and_full_delete() {
    let mut table = quixote_table(30);

    let removed = table
        .delete(Some(&WhereClause::new("MiddleInt", Comparator::Ge, 150)))
        .unwrap();
    assert_eq!(removed, 15);
    assert_eq!(table.record_count(), 15);
    table.tree().check_integrity().unwrap();
    assert!(table.records().all(|r| r.values[1] < Value::Int(150)));

    assert_eq!(table.delete(None).unwrap(), 15);
    assert_eq!(table.record_count(), 0);
    assert_eq!(table.tree().height(), 1);

    // Row ids are never reused.
    assert_eq!(table.insert(&[], quixote_row(99)).unwrap(), 31);
}

#[test]
fn test_byte_stream_round_trip() {
    let table = quixote_table(60);
    assert!(table.tree().height() >= 3);

    let bytes = table.to_byte_stream().unwrap();
    assert_eq!(bytes.len() % 512, 0);

    // Post-order numbering puts the root last.
    let root = Page::from_byte_stream(&bytes[bytes.len() - 512..], 0).unwrap();
    assert!(!root.is_leaf());
    assert_eq!(root.parent(), NO_PAGE);

    let loaded = Table::from_byte_stream(table.schema().clone(), *table.config(), table.next_row_id(), &bytes).unwrap();
    assert_eq!(loaded.record_count(), 60);
    assert_eq!(loaded.next_row_id(), 61);
    assert_eq!(
        loaded.select(&[], None).unwrap(),
        table.select(&[], None).unwrap()
    );
    loaded.tree().check_integrity().unwrap();
}

#[test]
fn test_empty_table_round_trip() {
    let table = quixote_table(0);
    let bytes = table.to_byte_stream().unwrap();
    assert_eq!(bytes.len(), 512);
    let loaded = Table::from_byte_stream(table.schema().clone(), *table.config(), table.next_row_id(), &bytes).unwrap();
    assert_eq!(loaded.record_count(), 0);
    assert_eq!(loaded.next_row_id(), 1);
}

#[test]
fn test_corrupt_stream_is_rejected() {
    let table = quixote_table(10);
    let mut bytes = table.to_byte_stream().unwrap();

    assert!(Table::from_byte_stream(table.schema().clone(), *table.config(), table.next_row_id(), &bytes[..700]).is_err());

    bytes[0] = 42;
    assert!(matches!(
        Table::from_byte_stream(table.schema().clone(), *table.config(), table.next_row_id(), &bytes),
        Err(DatabaseError::UnknownPageType(42))
    ));
}

#[test]
fn test_reload_never_reissues_deleted_row_ids() {
    let mut table = quixote_table(5);
    let removed = table
        .delete(Some(&WhereClause::new("MiddleInt", Comparator::Ge, 20)))
        .unwrap();
    assert_eq!(removed, 3);
    assert_eq!(table.next_row_id(), 6);

    let bytes = table.to_byte_stream().unwrap();
    let mut loaded =
        Table::from_byte_stream(table.schema().clone(), *table.config(), table.next_row_id(), &bytes)
            .unwrap();
    assert_eq!(loaded.next_row_id(), 6);
    assert_eq!(loaded.insert(&[], quixote_row(99)).unwrap(), 6);

    // A counter behind the stored rows still cannot hand out a live id.
    let stale = Table::from_byte_stream(table.schema().clone(), *table.config(), 1, &bytes).unwrap();
    assert_eq!(stale.next_row_id(), 3);
}
