//! Key mapping between the camelCase record shape and snake_case columns
//!
//! Records travel as `serde_json::Value`. [`map_to_db`] and [`map_from_db`]
//! rewrite object keys recursively; values other than objects and arrays are
//! returned untouched.

use crate::error::Result;
use cleanerp_common::{to_camel_case, to_snake_case};
use serde::Serialize;
use serde_json::{Map, Value};

fn map_keys(value: Value, convert: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (convert(&key), map_keys(value, convert)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| map_keys(v, convert)).collect())
        }
        other => other,
    }
}

/// Rename object keys from camelCase to snake_case
#[must_use]
pub fn map_to_db(value: Value) -> Value {
    map_keys(value, to_snake_case)
}

/// Rename object keys from snake_case to camelCase
#[must_use]
pub fn map_from_db(value: Value) -> Value {
    map_keys(value, to_camel_case)
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Serialize a record and drop every `null` object member.
///
/// Dates serialize through chrono as ISO-8601 strings. `null` array elements
/// are kept so positions are preserved.
///
/// # Errors
/// Returns `CleanErpError::Serialization` if the value cannot be serialized
pub fn prepare_for_db<T: Serialize + ?Sized>(record: &T) -> Result<Value> {
    Ok(strip_nulls(serde_json::to_value(record)?))
}

/// [`prepare_for_db`] followed by [`map_to_db`]
///
/// # Errors
/// Returns `CleanErpError::Serialization` if the value cannot be serialized
pub fn to_db_record<T: Serialize + ?Sized>(record: &T) -> Result<Value> {
    Ok(map_to_db(prepare_for_db(record)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_map_to_db_nested() {
        let input = json!({
            "siteName": "Depot",
            "contactDetails": { "contactPhone": "0400 000 000" },
            "workOrders": [{ "dueDate": "2024-01-01" }],
        });
        let expected = json!({
            "site_name": "Depot",
            "contact_details": { "contact_phone": "0400 000 000" },
            "work_orders": [{ "due_date": "2024-01-01" }],
        });
        assert_eq!(map_to_db(input), expected);
    }

    #[test]
    fn test_map_from_db_nested() {
        let input = json!({
            "client_id": "abc",
            "billing_frequency": "weekly",
            "sites": [{ "square_meters": 120.5 }],
        });
        let expected = json!({
            "clientId": "abc",
            "billingFrequency": "weekly",
            "sites": [{ "squareMeters": 120.5 }],
        });
        assert_eq!(map_from_db(input), expected);
    }

    #[test]
    fn test_non_objects_unchanged() {
        assert_eq!(map_to_db(json!("someValue")), json!("someValue"));
        assert_eq!(map_from_db(json!(42)), json!(42));
        assert_eq!(map_to_db(Value::Null), Value::Null);
    }

    #[test]
    fn test_round_trip() {
        let record = json!({ "companyName": "Acme", "paymentTermsDays": 30, "id": "x" });
        assert_eq!(map_from_db(map_to_db(record.clone())), record);
    }

    #[test]
    fn test_acronym_keys_round_trip() {
        let record = json!({ "siteID": 1, "URL": 3, "geoJSONData": { "lat": 0 } });
        let mapped = map_to_db(record.clone());
        assert_eq!(
            mapped,
            json!({ "site_i_d": 1, "_u_r_l": 3, "geo_j_s_o_n_data": { "lat": 0 } })
        );
        assert_eq!(map_from_db(mapped), record);
    }

    #[test]
    fn test_prepare_for_db_strips_null_members() {
        let prepared = prepare_for_db(&json!({
            "title": "Clean",
            "description": null,
            "nested": { "keep": 1, "drop": null },
            "list": [1, null, { "gone": null }],
        }))
        .unwrap();
        assert_eq!(
            prepared,
            json!({
                "title": "Clean",
                "nested": { "keep": 1 },
                "list": [1, null, {}],
            })
        );
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Visit {
        site_name: String,
        visit_date: NaiveDate,
        logged_at: chrono::DateTime<Utc>,
        notes: Option<String>,
    }

    #[test]
    fn test_to_db_record_formats_dates_and_keys() {
        let visit = Visit {
            site_name: "Depot".to_string(),
            visit_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            logged_at: Utc.with_ymd_and_hms(2024, 2, 29, 8, 30, 0).unwrap(),
            notes: None,
        };
        let record = to_db_record(&visit).unwrap();
        assert_eq!(record["site_name"], "Depot");
        assert_eq!(record["visit_date"], "2024-02-29");
        assert!(record["logged_at"]
            .as_str()
            .unwrap()
            .starts_with("2024-02-29T08:30:00"));
        assert!(record.get("notes").is_none());
    }
}
