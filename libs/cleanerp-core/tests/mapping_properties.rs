//! Key mapping and record preparation

use cleanerp_core::{map_from_db, map_to_db, prepare_for_db, to_db_record, NaiveDate};
use proptest::prelude::*;
use serde::Serialize;
use serde_json::{json, Map, Value};

fn camel_key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}([A-Z]{1,3}[a-z]{0,5}){0,3}|[A-Z]{1,4}"
}

fn record() -> impl Strategy<Value = Value> {
    (
        prop::collection::btree_map(camel_key(), any::<i64>(), 0..6),
        prop::collection::btree_map(camel_key(), "[a-z ]{0,8}", 0..4),
    )
        .prop_map(|(numbers, nested)| {
            let mut map: Map<String, Value> =
                numbers.into_iter().map(|(k, v)| (k, json!(v))).collect();
            let inner: Map<String, Value> =
                nested.into_iter().map(|(k, v)| (k, json!(v))).collect();
            map.insert("nestedRecords".to_string(), json!([Value::Object(inner)]));
            Value::Object(map)
        })
}

proptest! {
    #[test]
    fn camel_keys_survive_a_round_trip(value in record()) {
        prop_assert_eq!(map_from_db(map_to_db(value.clone())), value);
    }

    #[test]
    fn db_keys_contain_no_capitals(value in record()) {
        let mapped = map_to_db(value);
        for key in mapped.as_object().unwrap().keys() {
            prop_assert!(!key.chars().any(char::is_uppercase), "{}", key);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Visit {
    site_name: String,
    visit_date: NaiveDate,
    supervisor_name: Option<String>,
    readings: Vec<Option<f64>>,
}

#[test]
fn prepare_for_db_renders_dates_and_drops_nulls() {
    let visit = Visit {
        site_name: "Depot".to_string(),
        visit_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        supervisor_name: None,
        readings: vec![Some(1.5), None],
    };

    assert_eq!(
        prepare_for_db(&visit).unwrap(),
        json!({ "siteName": "Depot", "visitDate": "2024-02-29", "readings": [1.5, null] })
    );
    assert_eq!(
        to_db_record(&visit).unwrap(),
        json!({ "site_name": "Depot", "visit_date": "2024-02-29", "readings": [1.5, null] })
    );
}

#[test]
fn scalars_pass_through_unchanged() {
    assert_eq!(map_to_db(json!("siteName")), json!("siteName"));
    assert_eq!(map_from_db(json!(42)), json!(42));
    assert_eq!(map_to_db(Value::Null), Value::Null);
}
