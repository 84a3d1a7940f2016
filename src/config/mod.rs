//! Wizard definitions as data.
//!
//! A definition lists the steps in order, each with its fields and rules,
//! plus the conditional groups that hide fields behind a gate:
//!
//! ```yaml
//! steps:
//!   - id: personal
//!     title: Step 1
//!     fields:
//!       - name: address
//!         kind: checkbox
//!       - name: street
//!     rules:
//!       - required: street
//!         when: { field: address, equals: true }
//! conditions:
//!   - gate: address
//!     dependents: [street]
//! ```
//!
//! Every reference is checked when the definition is built, so a typo in a
//! rule fails at load time instead of silently passing validation.

use crate::core::value::Value;
use crate::core::{FieldId, StepId};
use crate::error::DefinitionError;
use crate::state::conditional::ConditionalGroup;
use crate::state::step::{FieldKind, FieldSpec, Rule, Step};
use crate::state::wizard::Wizard;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The three-step sign-up wizard the demo binary runs by default.
pub const SIGNUP: &str = include_str!("../../demos/signup.yaml");

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WizardDefinition {
    #[serde(default)]
    pub title: Option<String>,
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub id: StepId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: FieldId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub required: FieldId,
    #[serde(default)]
    pub when: Option<WhenDefinition>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhenDefinition {
    pub field: FieldId,
    #[serde(default = "checked")]
    pub equals: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDefinition {
    pub gate: FieldId,
    #[serde(default = "checked")]
    pub equals: Value,
    pub dependents: Vec<FieldId>,
}

fn checked() -> Value {
    Value::Bool(true)
}

impl WizardDefinition {
    pub fn from_yaml_str(source: &str) -> Result<Self, DefinitionError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading wizard definition");
        let source = fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }

    pub fn signup() -> Result<Self, DefinitionError> {
        Self::from_yaml_str(SIGNUP)
    }

    pub fn into_parts(self) -> (Vec<Step>, Vec<ConditionalGroup>) {
        let steps = self.steps.into_iter().map(StepDefinition::into_step).collect();
        let groups = self
            .conditions
            .into_iter()
            .map(|condition| ConditionalGroup {
                gate: condition.gate,
                equals: condition.equals,
                dependents: condition.dependents,
            })
            .collect();
        (steps, groups)
    }

    pub fn build(self) -> Result<Wizard, DefinitionError> {
        let (steps, groups) = self.into_parts();
        Wizard::new(steps, groups)
    }
}

impl StepDefinition {
    fn into_step(self) -> Step {
        let fields = self.fields.into_iter().map(FieldDefinition::into_spec).collect();
        let mut step = Step::new(self.id, self.title, fields);
        step.description = self.description;
        step.rules = self.rules.into_iter().map(RuleDefinition::into_rule).collect();
        step
    }
}

impl FieldDefinition {
    fn into_spec(self) -> FieldSpec {
        let label = self
            .label
            .unwrap_or_else(|| self.name.as_str().to_string());
        let mut spec = match self.kind {
            FieldKind::Text => FieldSpec::text(self.name, label),
            FieldKind::Checkbox => FieldSpec::checkbox(self.name, label),
        };
        if let Some(default) = self.default {
            spec.default = Some(default);
        }
        spec
    }
}

impl RuleDefinition {
    fn into_rule(self) -> Rule {
        match self.when {
            None => Rule::Required {
                field: self.required,
                message: self.message,
            },
            Some(when) => Rule::RequiredWhen {
                field: self.required,
                gate: when.field,
                equals: when.equals,
                message: self.message,
            },
        }
    }
}
