//! Condition DSL shared by the grade-classification and distribution rule
//! engines. A condition compares one declared field against a configured
//! value; a rule combines its conditions with AND/OR semantics.

use serde::{Deserialize, Serialize};

/// A resolved attribute value, typed so operators stay unambiguous.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    fn render(&self) -> String {
        match self {
            FieldValue::Number(value) => format_number(*value),
            FieldValue::Text(value) => value.clone(),
            FieldValue::Bool(value) => value.to_string(),
        }
    }
}

/// Field identifiers usable inside a [`Condition`].
pub trait RuleField: Copy {
    fn label(self) -> &'static str;
}

/// Comparison operators supported by rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    Contains,
    In,
}

impl Operator {
    pub const fn label(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Between => "between",
            Operator::Contains => "contains",
            Operator::In => "in",
        }
    }
}

/// How a rule combines its condition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    And,
    Or,
}

/// Configured comparison value. `between` and `in` carry a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ConditionValue>),
}

impl ConditionValue {
    fn is_blank(&self) -> bool {
        match self {
            ConditionValue::Bool(_) | ConditionValue::Number(_) => false,
            ConditionValue::Text(text) => text.trim().is_empty(),
            ConditionValue::List(items) => items.is_empty() || items.iter().all(Self::is_blank),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            ConditionValue::Number(value) => Some(*value),
            ConditionValue::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            ConditionValue::Bool(value) => value.to_string(),
            ConditionValue::Number(value) => format_number(*value),
            ConditionValue::Text(text) => text.clone(),
            ConditionValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(Self::render).collect();
                format!("[{}]", rendered.join(", "))
            }
        }
    }
}

/// One field/operator/value comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition<F> {
    pub field: F,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl<F: RuleField> Condition<F> {
    /// A condition whose configured value is empty carries no constraint and
    /// is dropped before evaluation.
    pub fn is_blank(&self) -> bool {
        self.value.is_blank()
    }

    /// Evaluate against the resolved field value, capturing an audit trace.
    pub fn evaluate(&self, actual: Option<&FieldValue>) -> ConditionTrace {
        let satisfied = actual
            .map(|value| satisfied(value, self.operator, &self.value))
            .unwrap_or(false);

        ConditionTrace {
            field: self.field.label(),
            operator: self.operator,
            expected: self.value.render(),
            actual: actual.map(FieldValue::render).unwrap_or_else(|| "(missing)".to_string()),
            satisfied,
        }
    }
}

/// Audit record of a single condition evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionTrace {
    pub field: &'static str,
    pub operator: Operator,
    pub expected: String,
    pub actual: String,
    pub satisfied: bool,
}

/// Validation errors raised when a rule is authored.
#[derive(Debug, thiserror::Error)]
pub enum RuleValidationError {
    #[error("rule has no valid conditions after filtering empty values")]
    NoValidConditions,
}

/// Drop blank conditions; reject rules that keep none.
pub fn active_conditions<F: RuleField>(
    conditions: &[Condition<F>],
) -> Result<Vec<&Condition<F>>, RuleValidationError> {
    let active: Vec<&Condition<F>> = conditions.iter().filter(|c| !c.is_blank()).collect();
    if active.is_empty() {
        return Err(RuleValidationError::NoValidConditions);
    }
    Ok(active)
}

/// Fold condition outcomes under the rule's logic operator. A rule without
/// conditions never matches.
pub fn combine(logic: LogicOperator, results: &[bool]) -> bool {
    match logic {
        LogicOperator::And => !results.is_empty() && results.iter().all(|matched| *matched),
        LogicOperator::Or => results.iter().any(|matched| *matched),
    }
}

fn satisfied(actual: &FieldValue, operator: Operator, expected: &ConditionValue) -> bool {
    match operator {
        Operator::Eq => equals(actual, expected),
        Operator::Neq => !equals(actual, expected),
        Operator::Gt => ordering(actual, expected, |a, e| a > e),
        Operator::Gte => ordering(actual, expected, |a, e| a >= e),
        Operator::Lt => ordering(actual, expected, |a, e| a < e),
        Operator::Lte => ordering(actual, expected, |a, e| a <= e),
        Operator::Between => between(actual, expected),
        Operator::Contains => contains(actual, expected),
        Operator::In => one_of(actual, expected),
    }
}

fn equals(actual: &FieldValue, expected: &ConditionValue) -> bool {
    match (actual, expected) {
        (FieldValue::Number(a), _) => expected
            .as_number()
            .map(|e| (a - e).abs() < f64::EPSILON)
            .unwrap_or(false),
        (FieldValue::Text(a), ConditionValue::Text(e)) => {
            a.trim().to_lowercase() == e.trim().to_lowercase()
        }
        (FieldValue::Bool(a), ConditionValue::Bool(e)) => a == e,
        _ => false,
    }
}

fn ordering(
    actual: &FieldValue,
    expected: &ConditionValue,
    compare: impl Fn(f64, f64) -> bool,
) -> bool {
    match (actual, expected.as_number()) {
        (FieldValue::Number(a), Some(e)) => compare(*a, e),
        _ => false,
    }
}

fn between(actual: &FieldValue, expected: &ConditionValue) -> bool {
    let FieldValue::Number(value) = actual else {
        return false;
    };
    let ConditionValue::List(bounds) = expected else {
        return false;
    };
    let (Some(low), Some(high)) = (
        bounds.first().and_then(ConditionValue::as_number),
        bounds.get(1).and_then(ConditionValue::as_number),
    ) else {
        return false;
    };
    // Inclusive on both ends.
    *value >= low && *value <= high
}

fn contains(actual: &FieldValue, expected: &ConditionValue) -> bool {
    match (actual, expected) {
        (FieldValue::Text(a), ConditionValue::Text(e)) => {
            a.to_lowercase().contains(&e.trim().to_lowercase())
        }
        _ => false,
    }
}

fn one_of(actual: &FieldValue, expected: &ConditionValue) -> bool {
    match expected {
        ConditionValue::List(items) => items.iter().any(|item| equals(actual, item)),
        single => equals(actual, single),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
