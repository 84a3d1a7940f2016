use crate::core::FieldId;
use crate::core::value::Value;
use crate::state::store::RecordStore;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Gate holds the expected value; dependents are shown and validated.
    Active,
    /// Gate holds anything else; dependents are absent from the record.
    Inactive,
}

/// Fields that only exist while `gate` equals `equals`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalGroup {
    pub gate: FieldId,
    pub equals: Value,
    pub dependents: Vec<FieldId>,
}

impl ConditionalGroup {
    pub fn new(gate: impl Into<FieldId>, equals: impl Into<Value>) -> Self {
        Self {
            gate: gate.into(),
            equals: equals.into(),
            dependents: Vec::new(),
        }
    }

    pub fn dependent(mut self, id: impl Into<FieldId>) -> Self {
        self.dependents.push(id.into());
        self
    }

    pub fn state(&self, store: &RecordStore) -> GroupState {
        if store.value(self.gate.as_str()) == self.equals {
            GroupState::Active
        } else {
            GroupState::Inactive
        }
    }

    fn governs(&self, id: &str) -> bool {
        self.dependents.iter().any(|dependent| dependent.as_str() == id)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConditionalController {
    groups: Vec<ConditionalGroup>,
}

impl ConditionalController {
    pub fn new(groups: Vec<ConditionalGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[ConditionalGroup] {
        self.groups.as_slice()
    }

    /// A field is active unless some group governing it is inactive.
    pub fn is_active(&self, id: &str, store: &RecordStore) -> bool {
        self.groups
            .iter()
            .filter(|group| group.governs(id))
            .all(|group| group.state(store) == GroupState::Active)
    }

    /// Reacts to a write or unset of `changed`: every dependent of a group
    /// that is now inactive is unset. Dependents that are gates themselves
    /// cascade. Returns the fields that were removed from the record.
    pub fn apply(&self, changed: &str, store: &mut RecordStore) -> Vec<FieldId> {
        let mut cleared = Vec::<FieldId>::new();
        let mut pending = vec![FieldId::from(changed)];

        while let Some(gate) = pending.pop() {
            for group in self.groups.iter().filter(|group| group.gate == gate) {
                if group.state(store) == GroupState::Active {
                    continue;
                }
                for dependent in &group.dependents {
                    if !store.contains(dependent.as_str()) {
                        continue;
                    }
                    debug!(
                        gate = %group.gate,
                        field = %dependent,
                        "gate closed, clearing dependent"
                    );
                    store.unset_field(dependent.as_str());
                    cleared.push(dependent.clone());
                    pending.push(dependent.clone());
                }
            }
        }

        cleared
    }
}
