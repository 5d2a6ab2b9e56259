//! Property-based test generators using proptest.
//!
//! Provides strategies for report keys and payloads that the ingest
//! path accepts.

use proptest::prelude::*;

/// Strategy for `YYYY-MM-DD` dates.
pub fn date_strategy() -> impl Strategy<Value = String> {
    (2020u32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(year, month, day)| format!("{year}-{month:02}-{day:02}"))
}

/// Strategy for ISO `YYYY-Www` weeks.
pub fn week_strategy() -> impl Strategy<Value = String> {
    (2020u32..2030, 1u32..=52).prop_map(|(year, week)| format!("{year}-W{week:02}"))
}

/// Strategy for extra report fields as `(name, integer)` pairs.
///
/// Names never collide with the `date`/`week` key fields.
pub fn extra_fields_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec(
        (
            prop::string::string_regex("x_[a-z]{1,8}").expect("Invalid regex"),
            any::<i64>(),
        ),
        0..6,
    )
}

fn object_with(key: Option<(&str, &str)>, extra: &[(String, i64)]) -> Vec<u8> {
    let mut map = serde_json::Map::new();
    if let Some((name, value)) = key {
        map.insert(name.to_string(), serde_json::Value::from(value));
    }
    for (name, value) in extra {
        map.insert(name.clone(), serde_json::Value::from(*value));
    }
    serde_json::to_vec(&serde_json::Value::Object(map)).expect("JSON object serializes")
}

/// Strategy for a valid daily payload, paired with its date.
pub fn daily_payload_strategy() -> impl Strategy<Value = (String, Vec<u8>)> {
    (date_strategy(), extra_fields_strategy()).prop_map(|(date, extra)| {
        let payload = object_with(Some(("date", &date)), &extra);
        (date, payload)
    })
}

/// Strategy for a valid weekly payload, paired with its week.
pub fn weekly_payload_strategy() -> impl Strategy<Value = (String, Vec<u8>)> {
    (week_strategy(), extra_fields_strategy()).prop_map(|(week, extra)| {
        let payload = object_with(Some(("week", &week)), &extra);
        (week, payload)
    })
}

/// Strategy for a status payload (any JSON object).
pub fn status_payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    extra_fields_strategy().prop_map(|extra| object_with(None, &extra))
}

/// Strategy for request bodies that are not JSON objects.
pub fn non_object_body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(b"[]".to_vec()),
        Just(b"null".to_vec()),
        Just(b"\"text\"".to_vec()),
        any::<i32>().prop_map(|n| n.to_string().into_bytes()),
        prop::string::string_regex("[a-z ]{1,16}")
            .expect("Invalid regex")
            .prop_map(String::into_bytes),
    ]
}
