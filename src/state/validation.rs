use crate::core::FieldId;
use crate::core::value::Value;
use crate::state::step::{Rule, Step};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: IndexMap<FieldId, String>,
}

impl ValidationResult {
    pub fn error(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }
}

/// Runs every rule of `step` against `values`. Values missing from the map
/// count as undefined. All failures are collected; the first failing rule
/// for a field decides its message.
pub fn validate(step: &Step, values: &IndexMap<FieldId, Value>) -> ValidationResult {
    validate_where(step, values, |_| true)
}

/// Like [`validate`], but rules on fields for which `checked` returns false
/// are treated as satisfied. The wizard passes the conditional visibility
/// here so a hidden field can never block a step.
pub fn validate_where(
    step: &Step,
    values: &IndexMap<FieldId, Value>,
    checked: impl Fn(&FieldId) -> bool,
) -> ValidationResult {
    let mut errors = IndexMap::<FieldId, String>::new();

    for rule in &step.rules {
        if !checked(rule.field()) || errors.contains_key(rule.field().as_str()) {
            continue;
        }
        if !rule_holds(rule, values) {
            errors.insert(rule.field().clone(), rule.message());
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

fn rule_holds(rule: &Rule, values: &IndexMap<FieldId, Value>) -> bool {
    match rule {
        Rule::Required { field, .. } => !value_of(values, field).is_empty(),
        Rule::RequiredWhen {
            field,
            gate,
            equals,
            ..
        } => value_of(values, gate) != equals || !value_of(values, field).is_empty(),
    }
}

static UNDEFINED: Value = Value::None;

fn value_of<'a>(values: &'a IndexMap<FieldId, Value>, id: &FieldId) -> &'a Value {
    values.get(id.as_str()).unwrap_or(&UNDEFINED)
}

#[cfg(test)]
mod tests {
    use super::{validate, validate_where};
    use crate::core::FieldId;
    use crate::core::value::Value;
    use crate::state::step::Step;
    use indexmap::IndexMap;

    fn personal_step() -> Step {
        Step::builder("personal", "Step 1")
            .text("name", "Nome")
            .text("lastName", "Sobrenome")
            .checkbox("address", "Endereço")
            .text("street", "Rua")
            .require("name")
            .require("lastName")
            .require("address")
            .require_when("street", "address", true)
            .build()
    }

    fn values(pairs: &[(&str, Value)]) -> IndexMap<FieldId, Value> {
        pairs
            .iter()
            .map(|(id, value)| (FieldId::from(*id), value.clone()))
            .collect()
    }

    #[test]
    fn empty_name_fails_and_street_is_not_required_without_address() {
        let result = validate(
            &personal_step(),
            &values(&[
                ("name", Value::text("")),
                ("lastName", Value::text("Doe")),
                ("address", Value::Bool(false)),
            ]),
        );
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.error("name"), Some("name is a required field"));
        assert_eq!(result.error("street"), None);
    }

    #[test]
    fn street_is_required_once_address_is_checked() {
        let result = validate(
            &personal_step(),
            &values(&[
                ("name", Value::text("Ana")),
                ("lastName", Value::text("Lima")),
                ("address", Value::Bool(true)),
                ("street", Value::text("")),
            ]),
        );
        assert!(!result.valid);
        assert_eq!(
            result.errors.keys().map(FieldId::as_str).collect::<Vec<_>>(),
            vec!["street"]
        );
    }

    #[test]
    fn filled_street_passes() {
        let result = validate(
            &personal_step(),
            &values(&[
                ("name", Value::text("Ana")),
                ("lastName", Value::text("Lima")),
                ("address", Value::Bool(true)),
                ("street", Value::text("Main St")),
            ]),
        );
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn stale_dependent_value_is_ignored_when_gate_is_off() {
        let result = validate(
            &personal_step(),
            &values(&[
                ("name", Value::text("Ana")),
                ("lastName", Value::text("Lima")),
                ("address", Value::Bool(false)),
                ("street", Value::text("")),
            ]),
        );
        assert!(result.valid);
    }

    #[test]
    fn all_failures_are_reported_in_rule_order() {
        let result = validate(&personal_step(), &IndexMap::new());
        assert_eq!(
            result.errors.keys().map(FieldId::as_str).collect::<Vec<_>>(),
            vec!["name", "lastName", "address"]
        );
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let step = personal_step();
        let input = values(&[("name", Value::text("")), ("address", Value::Bool(true))]);
        let first = validate(&step, &input);
        let second = validate(&step, &input);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize")
        );
    }

    #[test]
    fn unchecked_fields_never_fail() {
        let step = Step::builder("personal", "Step 1")
            .text("name", "Nome")
            .text("street", "Rua")
            .require("name")
            .require("street")
            .build();
        let input = values(&[("name", Value::text("Ana"))]);

        assert!(!validate(&step, &input).valid);
        let result = validate_where(&step, &input, |id| id.as_str() != "street");
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn step_without_rules_is_always_valid() {
        let step = Step::builder("review", "Step 3").build();
        assert!(validate(&step, &IndexMap::new()).valid);
    }
}
