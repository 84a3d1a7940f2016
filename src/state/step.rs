use crate::core::value::Value;
use crate::core::{FieldId, StepId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Checkbox,
}

impl FieldKind {
    /// `Value::None` fits every kind and means "clear".
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::None) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Checkbox, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text field"),
            Self::Checkbox => f.write_str("checkbox"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub id: FieldId,
    pub label: String,
    pub kind: FieldKind,
    /// Registered (not dirty) when the owning step is entered.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(id: impl Into<FieldId>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            default: None,
        }
    }

    pub fn text(id: impl Into<FieldId>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldKind::Text)
    }

    /// Checkboxes start unchecked.
    pub fn checkbox(id: impl Into<FieldId>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldKind::Checkbox).with_default(Value::Bool(false))
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required {
        field: FieldId,
        message: Option<String>,
    },
    /// `field` is required iff `gate` currently equals `equals`.
    RequiredWhen {
        field: FieldId,
        gate: FieldId,
        equals: Value,
        message: Option<String>,
    },
}

impl Rule {
    pub fn field(&self) -> &FieldId {
        match self {
            Self::Required { field, .. } | Self::RequiredWhen { field, .. } => field,
        }
    }

    pub fn message(&self) -> String {
        let custom = match self {
            Self::Required { message, .. } | Self::RequiredWhen { message, .. } => message,
        };
        custom
            .clone()
            .unwrap_or_else(|| format!("{} is a required field", self.field()))
    }

    /// Every field the rule reads.
    pub fn references(&self) -> impl Iterator<Item = &FieldId> {
        let gate = match self {
            Self::Required { .. } => None,
            Self::RequiredWhen { gate, .. } => Some(gate),
        };
        std::iter::once(self.field()).chain(gate)
    }
}

/// One page of the wizard: its fields and the rules that gate leaving it.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: StepId,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<Rule>,
}

impl Step {
    pub fn new(id: impl Into<StepId>, title: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields,
            rules: Vec::new(),
        }
    }

    pub fn builder(id: impl Into<StepId>, title: impl Into<String>) -> StepBuilder {
        StepBuilder::new(id, title)
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id.as_str() == id)
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &FieldId> {
        self.fields.iter().map(|field| &field.id)
    }
}

pub struct StepBuilder {
    id: StepId,
    title: String,
    description: Option<String>,
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl StepBuilder {
    pub fn new(id: impl Into<StepId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn text(self, id: impl Into<FieldId>, label: impl Into<String>) -> Self {
        self.field(FieldSpec::text(id, label))
    }

    pub fn checkbox(self, id: impl Into<FieldId>, label: impl Into<String>) -> Self {
        self.field(FieldSpec::checkbox(id, label))
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn require(self, field_id: impl Into<FieldId>) -> Self {
        self.rule(Rule::Required {
            field: field_id.into(),
            message: None,
        })
    }

    pub fn require_with_message(
        self,
        field_id: impl Into<FieldId>,
        message: impl Into<String>,
    ) -> Self {
        self.rule(Rule::Required {
            field: field_id.into(),
            message: Some(message.into()),
        })
    }

    pub fn require_when(
        self,
        field_id: impl Into<FieldId>,
        gate: impl Into<FieldId>,
        equals: impl Into<Value>,
    ) -> Self {
        self.rule(Rule::RequiredWhen {
            field: field_id.into(),
            gate: gate.into(),
            equals: equals.into(),
            message: None,
        })
    }

    pub fn build(self) -> Step {
        Step {
            id: self.id,
            title: self.title,
            description: self.description,
            fields: self.fields,
            rules: self.rules,
        }
    }
}
