use lumbung::{
    executor::predicate::{
        Comparator, Condition, Operation, filter_delete, filter_select, filter_update,
    },
    types::{record::Record, value::Value},
};

fn create_test_records() -> Vec<Record> {
    (1..=5)
        .map(|i| {
            Record::new(
                i,
                vec![Value::text(format!("name{}", i)), Value::Int(i as i32 * 10)],
            )
        })
        .collect()
}

#[test]
fn test_negation_pairs() {
    let pairs = [
        (Comparator::Eq, Comparator::Ne),
        (Comparator::Lt, Comparator::Ge),
        (Comparator::Le, Comparator::Gt),
    ];
    for (a, b) in pairs {
        assert_eq!(a.negate(), b);
        assert_eq!(b.negate(), a);
    }
    assert_eq!("<>".parse::<Comparator>().unwrap(), Comparator::Ne);
    assert_eq!("!=".parse::<Comparator>().unwrap(), Comparator::Ne);
    assert_eq!(Comparator::Le.to_string(), "<=");
    assert!("LIKE".parse::<Comparator>().is_err());
}

#[test]
fn test_comparator_evaluation() {
    let ten = Value::Int(10);
    assert!(Comparator::Eq.evaluate(&ten, &Value::BigInt(10)));
    assert!(Comparator::Le.evaluate(&ten, &Value::Int(10)));
    assert!(Comparator::Gt.evaluate(&ten, &Value::Double(9.5)));
    assert!(!Comparator::Lt.evaluate(&ten, &ten));
    // Unrelated types never match, whatever the operator.
    assert!(!Comparator::Ne.evaluate(&ten, &Value::text("10")));
}

#[test]
fn test_negated_condition_is_the_complement() {
    let records = create_test_records();
    let condition = Condition::new(1, Comparator::Lt, Value::Int(30));

    let matching = filter_select(&records, &[], Some(&condition));
    let rest = filter_select(&records, &[], Some(&condition.clone().negated()));
    assert_eq!(matching.len(), 2);
    assert_eq!(rest.len(), 3);
    assert_eq!(condition.clone().negated().effective_comparator(), Comparator::Ge);
}

#[test]
fn test_filter_select_projects_columns() {
    let records = create_test_records();
    let rows = filter_select(&records, &[1], Some(&Condition::new(0, Comparator::Eq, Value::text("name4"))));
    assert_eq!(rows, vec![Record::new(4, vec![Value::Int(40)])]);

    let all = filter_select(&records, &[], None);
    assert_eq!(all, records);
}

#[test]
fn test_filter_delete_keeps_the_non_matching_rows() {
    let records = create_test_records();
    let kept = filter_delete(&records, &Condition::new(1, Comparator::Ge, Value::Int(40)));
    let ids: Vec<u32> = kept.iter().map(Record::row_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_filter_update_touches_only_matches() {
    let records = create_test_records();
    let updated = filter_update(
        &records,
        &Operation::new(0, Value::text("Don Juan Quixote")),
        Some(&Condition::new(1, Comparator::Eq, Value::Int(10))),
    )
    .unwrap();

    assert_eq!(updated.len(), 5);
    assert_eq!(updated[0].values[0], Value::text("Don Juan Quixote"));
    assert_eq!(updated[1..], records[1..]);

    let bad = filter_update(&records, &Operation::new(9, Value::Null), None);
    assert!(bad.is_err());
}
