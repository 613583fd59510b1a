//! snake_case <-> camelCase field-name mapping.
//!
//! Persisted rows use snake_case column names; the wire and view models use
//! camelCase. Field tables built from these helpers must be total and
//! invertible, which [`check_field_table`] verifies.

use serde_json::{Map, Value};

/// `estimated_end_date` -> `estimatedEndDate`.
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// `estimatedEndDate` -> `estimated_end_date`.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Direction for [`recase_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Snake,
    Camel,
}

/// Rename every object key in `value` (recursively) to `case`.
pub fn recase_keys(value: Value, case: Case) -> Value {
    match value {
        Value::Object(map) => {
            let recased: Map<String, Value> = map
                .into_iter()
                .map(|(key, inner)| {
                    let key = match case {
                        Case::Snake => camel_to_snake(&key),
                        Case::Camel => snake_to_camel(&key),
                    };
                    (key, recase_keys(inner, case))
                })
                .collect();
            Value::Object(recased)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| recase_keys(v, case)).collect()),
        other => other,
    }
}

/// Verify a `(snake, camel)` field table: each pair must convert into each
/// other and neither side may repeat.
pub fn check_field_table(table: &[(&str, &str)]) -> Result<(), String> {
    let mut seen_snake = std::collections::HashSet::new();
    let mut seen_camel = std::collections::HashSet::new();
    for &(snake, camel) in table {
        if snake_to_camel(snake) != camel || camel_to_snake(camel) != snake {
            return Err(format!("'{snake}' and '{camel}' do not map onto each other"));
        }
        if !seen_snake.insert(snake) || !seen_camel.insert(camel) {
            return Err(format!("duplicate field '{snake}'/'{camel}'"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_both_ways() {
        assert_eq!(snake_to_camel("project_manager_id"), "projectManagerId");
        assert_eq!(camel_to_snake("projectManagerId"), "project_manager_id");
        assert_eq!(snake_to_camel("id"), "id");
        assert_eq!(camel_to_snake("id"), "id");
    }

    #[test]
    fn recases_nested_objects() {
        let row = json!({
            "client_id": 4,
            "team_member_ids": [1, 2],
            "meta": { "last_contact_date": null },
            "items": [{ "actual_cost": 1 }]
        });
        let camel = recase_keys(row.clone(), Case::Camel);
        assert_eq!(camel["clientId"], 4);
        assert!(camel["meta"]["lastContactDate"].is_null());
        assert_eq!(camel["items"][0]["actualCost"], 1);
        assert_eq!(recase_keys(camel, Case::Snake), row);
    }

    #[test]
    fn field_table_checks() {
        assert!(check_field_table(&[("start_date", "startDate"), ("id", "id")]).is_ok());
        assert!(check_field_table(&[("start_date", "startdate")]).is_err());
        assert!(check_field_table(&[("id", "id"), ("id", "id")]).is_err());
    }
}
