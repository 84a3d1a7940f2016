use crate::core::{FieldId, StepId};
use crate::error::DefinitionError;
use crate::state::conditional::ConditionalGroup;
use crate::state::step::{FieldKind, FieldSpec, Step};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Steps keyed by id, in wizard order. Construction rejects every
/// configuration defect, so lookups by an id taken from the registry
/// cannot miss.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    steps: IndexMap<StepId, Step>,
}

impl SchemaRegistry {
    pub fn new(steps: Vec<Step>) -> Result<Self, DefinitionError> {
        if steps.is_empty() {
            return Err(DefinitionError::EmptyWizard);
        }

        let mut map = IndexMap::<StepId, Step>::new();
        let mut kinds = IndexMap::<FieldId, FieldKind>::new();

        for step in steps {
            if map.contains_key(step.id.as_str()) {
                return Err(DefinitionError::DuplicateStep(step.id.clone()));
            }
            check_step(&step)?;
            for field in &step.fields {
                let first = *kinds.entry(field.id.clone()).or_insert(field.kind);
                if first != field.kind {
                    return Err(DefinitionError::ConflictingFieldKind {
                        field: field.id.clone(),
                        first,
                        second: field.kind,
                    });
                }
            }
            map.insert(step.id.clone(), step);
        }

        Ok(Self { steps: map })
    }

    /// Every gate and dependent must be a field some step declares.
    pub fn check_groups(&self, groups: &[ConditionalGroup]) -> Result<(), DefinitionError> {
        for group in groups {
            for id in std::iter::once(&group.gate).chain(group.dependents.iter()) {
                if self.field(id.as_str()).is_none() {
                    return Err(DefinitionError::UnknownConditionalField(id.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &StepId> {
        self.steps.keys()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    /// Lookup for ids handed out by this registry; panics on a foreign id.
    pub(crate) fn step(&self, id: &StepId) -> &Step {
        &self.steps[id.as_str()]
    }

    /// First declaration of `id` across all steps.
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.steps.values().find_map(|step| step.field(id))
    }
}

fn check_step(step: &Step) -> Result<(), DefinitionError> {
    let mut seen = HashSet::<&str>::new();
    for field in &step.fields {
        if !seen.insert(field.id.as_str()) {
            return Err(DefinitionError::DuplicateField {
                step: step.id.clone(),
                field: field.id.clone(),
            });
        }
        if let Some(default) = &field.default
            && !field.kind.accepts(default)
        {
            return Err(DefinitionError::DefaultKindMismatch {
                field: field.id.clone(),
                kind: field.kind,
            });
        }
    }

    for rule in &step.rules {
        if let Some(unknown) = rule.references().find(|id| !seen.contains(id.as_str())) {
            return Err(DefinitionError::UnknownFieldReference {
                step: step.id.clone(),
                field: unknown.clone(),
            });
        }
    }

    Ok(())
}
