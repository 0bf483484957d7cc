use std::collections::BTreeMap;

use atlasgate_application::AddSystemRoleInput;
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::error::{FieldErrors, FieldMessages};

const MISSING: &str = "Missing data for required field.";
const NULL: &str = "Field may not be null.";
const NOT_STRING: &str = "Not a valid string.";
const NOT_INTEGER: &str = "Not a valid integer.";
const NOT_LIST: &str = "Not a valid list.";
const UNKNOWN: &str = "Unknown field.";
const INVALID_INPUT: &str = "Invalid input type.";

const FIELDS: [&str; 4] = ["role", "database", "sqlalchemy_uri", "datasets"];

/// Incoming payload for system-role provisioning.
#[derive(Debug, Clone, PartialEq, Eq, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/add-system-role-request.ts"
)]
pub struct AddSystemRoleRequest {
    pub role: String,
    pub database: String,
    pub sqlalchemy_uri: String,
    pub datasets: Vec<i64>,
}

impl AddSystemRoleRequest {
    /// Validates a decoded JSON body field by field, collecting every
    /// violation instead of stopping at the first one. Bad list elements are
    /// reported under their index.
    pub fn from_json(value: &Value) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let Some(object) = value.as_object() else {
            errors.insert("_schema".to_owned(), FieldMessages::single(INVALID_INPUT));
            return Err(errors);
        };

        for key in object.keys() {
            if !FIELDS.contains(&key.as_str()) {
                errors.insert(key.clone(), FieldMessages::single(UNKNOWN));
            }
        }

        let role = string_field(object, "role", &mut errors);
        let database = string_field(object, "database", &mut errors);
        let sqlalchemy_uri = string_field(object, "sqlalchemy_uri", &mut errors);
        let datasets = integer_list_field(object, "datasets", &mut errors);

        match (role, database, sqlalchemy_uri, datasets) {
            (Some(role), Some(database), Some(sqlalchemy_uri), Some(datasets))
                if errors.is_empty() =>
            {
                Ok(Self {
                    role,
                    database,
                    sqlalchemy_uri,
                    datasets,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<AddSystemRoleRequest> for AddSystemRoleInput {
    fn from(value: AddSystemRoleRequest) -> Self {
        Self {
            role: value.role,
            database: value.database,
            sqlalchemy_uri: value.sqlalchemy_uri,
            datasets: value.datasets,
        }
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<&'a Value> {
    match object.get(field) {
        None => {
            errors.insert(field.to_owned(), FieldMessages::single(MISSING));
            None
        }
        Some(Value::Null) => {
            errors.insert(field.to_owned(), FieldMessages::single(NULL));
            None
        }
        Some(value) => Some(value),
    }
}

fn string_field(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = required(object, field, errors)?;
    match value.as_str() {
        Some(text) => Some(text.to_owned()),
        None => {
            errors.insert(field.to_owned(), FieldMessages::single(NOT_STRING));
            None
        }
    }
}

fn integer_list_field(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<Vec<i64>> {
    let value = required(object, field, errors)?;
    let Some(items) = value.as_array() else {
        errors.insert(field.to_owned(), FieldMessages::single(NOT_LIST));
        return None;
    };

    let mut parsed = Vec::with_capacity(items.len());
    let mut item_errors = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        match (item, as_integer(item)) {
            (_, Some(value)) => parsed.push(value),
            (Value::Null, None) => {
                item_errors.insert(index, vec![NULL.to_owned()]);
            }
            (_, None) => {
                item_errors.insert(index, vec![NOT_INTEGER.to_owned()]);
            }
        }
    }

    if !item_errors.is_empty() {
        errors.insert(field.to_owned(), FieldMessages::Items(item_errors));
        return None;
    }

    Some(parsed)
}

/// Accepts integers, integral floats and numeric strings; rejects booleans.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < 9.0e15)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::AddSystemRoleRequest;

    fn schema_errors(body: Value) -> Value {
        AddSystemRoleRequest::from_json(&body)
            .err()
            .and_then(|errors| serde_json::to_value(errors).ok())
            .unwrap_or(Value::Null)
    }

    #[test]
    fn valid_payload_is_accepted() {
        let request = AddSystemRoleRequest::from_json(&json!({
            "role": "system-0",
            "database": "warehouse",
            "sqlalchemy_uri": "postgresql://reader@db/warehouse",
            "datasets": [1, "2", 3.0]
        }));

        assert_eq!(
            request.map(|request| request.datasets).ok(),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn missing_sqlalchemy_uri_is_reported_by_field() {
        let errors = schema_errors(json!({
            "role": "system-0",
            "database": "warehouse",
            "datasets": []
        }));

        assert_eq!(
            errors,
            json!({"sqlalchemy_uri": ["Missing data for required field."]})
        );
    }

    #[test]
    fn every_violation_is_collected() {
        let errors = schema_errors(json!({
            "role": 7,
            "database": null,
            "sqlalchemy_uri": "postgresql://db",
            "datasets": [1, true],
            "extra": "value"
        }));

        assert_eq!(
            errors,
            json!({
                "role": ["Not a valid string."],
                "database": ["Field may not be null."],
                "datasets": {"1": ["Not a valid integer."]},
                "extra": ["Unknown field."]
            })
        );
    }

    #[test]
    fn each_bad_dataset_is_keyed_by_index() {
        let errors = schema_errors(json!({
            "role": "system-0",
            "database": "warehouse",
            "sqlalchemy_uri": "postgresql://db",
            "datasets": ["x", 2, null, 4.5]
        }));

        assert_eq!(
            errors,
            json!({
                "datasets": {
                    "0": ["Not a valid integer."],
                    "2": ["Field may not be null."],
                    "3": ["Not a valid integer."]
                }
            })
        );
    }

    #[test]
    fn scalar_datasets_is_not_a_list() {
        let errors = schema_errors(json!({
            "role": "system-0",
            "database": "warehouse",
            "sqlalchemy_uri": "postgresql://db",
            "datasets": 4
        }));

        assert_eq!(errors, json!({"datasets": ["Not a valid list."]}));
    }

    #[test]
    fn non_object_body_is_a_schema_error() {
        let errors = schema_errors(json!(["system-0"]));

        assert_eq!(errors, json!({"_schema": ["Invalid input type."]}));
    }
}
