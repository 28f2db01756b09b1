use log::error;

use parallax_shared::{Model, Value};

use crate::models::CONDITION_EQUALS;

/// Evaluates a condition node against an event payload. Unknown condition
/// types fail closed.
pub fn evaluate_condition(condition: &Model, payload: &Value) -> bool {
    if condition.is_a(CONDITION_EQUALS) {
        let Value::Record(check) = condition.get("check") else {
            return true;
        };
        let Some(payload) = payload.as_record() else {
            return check.is_empty();
        };
        return check
            .iter()
            .all(|(key, expected)| payload.get(key) == Some(expected));
    }

    error!(
        "Unknown condition type '{}' ({}), treating as not met",
        condition.model_type(),
        condition.gid()
    );
    false
}
