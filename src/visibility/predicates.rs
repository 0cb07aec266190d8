//! Condition predicates - one total function per operator

use serde_json::Value;

use crate::schema::ConditionOperator;

/// Evaluate `operator` with `source` as the live value (absent when the
/// field has no value) and `target` as the condition's value
pub fn evaluate(operator: ConditionOperator, source: Option<&Value>, target: &Value) -> bool {
    match operator {
        ConditionOperator::Equals => equals(source, target),
        ConditionOperator::NotEquals => not_equals(source, target),
        ConditionOperator::Contains => contains(source, target),
        ConditionOperator::NotContains => not_contains(source, target),
        ConditionOperator::GreaterThan => greater_than(source, target),
        ConditionOperator::LessThan => less_than(source, target),
        ConditionOperator::IsEmpty => is_empty(source),
        ConditionOperator::IsNotEmpty => is_not_empty(source),
    }
}

pub fn equals(source: Option<&Value>, target: &Value) -> bool {
    source.map_or(false, |s| strict_eq(s, target))
}

pub fn not_equals(source: Option<&Value>, target: &Value) -> bool {
    !equals(source, target)
}

/// Element membership for lists, substring containment otherwise
pub fn contains(source: Option<&Value>, target: &Value) -> bool {
    match source {
        Some(Value::Array(items)) => items.iter().any(|item| strict_eq(item, target)),
        _ => as_text(source).contains(&as_text(Some(target))),
    }
}

pub fn not_contains(source: Option<&Value>, target: &Value) -> bool {
    !contains(source, target)
}

pub fn greater_than(source: Option<&Value>, target: &Value) -> bool {
    // NaN on either side compares false
    as_number(source) > as_number(Some(target))
}

pub fn less_than(source: Option<&Value>, target: &Value) -> bool {
    as_number(source) < as_number(Some(target))
}

/// Absent, null, empty text, or an empty list
pub fn is_empty(source: Option<&Value>) -> bool {
    match source {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

pub fn is_not_empty(source: Option<&Value>) -> bool {
    !is_empty(source)
}

/// Same type and value; numbers compare by magnitude so `1` equals `1.0`
fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Empty text is NaN, not 0, so an untouched number field satisfies
/// neither greaterThan nor lessThan.
fn as_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                f64::NAN
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(true)) => 1.0,
        Some(Value::Bool(false)) => 0.0,
        _ => f64::NAN,
    }
}
