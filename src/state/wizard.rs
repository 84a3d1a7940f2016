use crate::core::value::Value;
use crate::core::{FieldId, StepId};
use crate::error::{DefinitionError, WizardError};
use crate::state::conditional::{ConditionalController, ConditionalGroup};
use crate::state::flow::{Flow, StepStatus};
use crate::state::schema::SchemaRegistry;
use crate::state::step::{FieldSpec, Step};
use crate::state::store::RecordStore;
use crate::state::validation::{ValidationResult, validate_where};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

pub type SubmitHandler = Box<dyn FnMut(&Submission)>;

/// The final record. Built once, when the last step validates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Submission {
    values: IndexMap<FieldId, Value>,
}

impl Submission {
    pub fn values(&self) -> &IndexMap<FieldId, Value> {
        &self.values
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved { from: usize, to: usize },
    /// The current step did not validate; its errors are now on the fields.
    Blocked(ValidationResult),
    Submitted(Submission),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Moved { from: usize, to: usize },
    AtFirstStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    /// Written. `cleared` lists dependents removed because a gate closed.
    Applied { cleared: Vec<FieldId> },
    /// The field belongs to an inactive conditional group and is hidden.
    Ignored,
}

/// Form state dump for debugging, serializable as-is.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub step: StepId,
    pub step_index: usize,
    pub statuses: Vec<StepStatus>,
    pub values: IndexMap<FieldId, Value>,
    pub errors: IndexMap<FieldId, String>,
    pub dirty: Vec<FieldId>,
    pub submitted: bool,
}

pub struct Wizard {
    registry: SchemaRegistry,
    conditions: ConditionalController,
    flow: Flow,
    store: RecordStore,
    on_submit: SubmitHandler,
    submitted: bool,
}

impl Wizard {
    pub fn new(steps: Vec<Step>, groups: Vec<ConditionalGroup>) -> Result<Self, DefinitionError> {
        let registry = SchemaRegistry::new(steps)?;
        registry.check_groups(&groups)?;
        Ok(Self::from_parts(registry, ConditionalController::new(groups)))
    }

    pub fn from_parts(registry: SchemaRegistry, conditions: ConditionalController) -> Self {
        let flow = Flow::new(registry.ids().cloned().collect());
        let mut wizard = Self {
            registry,
            conditions,
            flow,
            store: RecordStore::new(),
            on_submit: Box::new(log_submission),
            submitted: false,
        };
        wizard.register_current_step();
        wizard
    }

    /// Replaces the default handler, which logs the record.
    pub fn with_submit_handler(mut self, handler: impl FnMut(&Submission) + 'static) -> Self {
        self.on_submit = Box::new(handler);
        self
    }

    pub fn on_field_change(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<FieldChange, WizardError> {
        self.ensure_open()?;
        let value = value.into();
        let Some(spec) = self.registry.field(name) else {
            return Err(WizardError::UnknownField(FieldId::from(name)));
        };
        if !spec.kind.accepts(&value) {
            return Err(WizardError::KindMismatch {
                field: spec.id.clone(),
                kind: spec.kind,
            });
        }
        if !self.conditions.is_active(name, &self.store) {
            warn!(field = name, "ignoring write to hidden field");
            return Ok(FieldChange::Ignored);
        }

        self.store.set_field(name, value);
        let cleared = self.conditions.apply(name, &mut self.store);
        Ok(FieldChange::Applied { cleared })
    }

    pub fn on_advance(&mut self) -> Result<Advance, WizardError> {
        self.ensure_open()?;
        let result = self.validate_current_step();
        if !result.valid {
            debug!(
                step = %self.flow.current_id(),
                errors = result.errors.len(),
                "advance blocked"
            );
            return Ok(Advance::Blocked(result));
        }

        if self.flow.is_last() {
            return Ok(Advance::Submitted(self.submit()));
        }

        let from = self.flow.current_index();
        self.flow.advance();
        let to = self.flow.current_index();
        self.register_current_step();
        info!(from, to, step = %self.flow.current_id(), "advanced");
        Ok(Advance::Moved { from, to })
    }

    /// Never validates: going back is always allowed.
    pub fn on_retreat(&mut self) -> Result<Retreat, WizardError> {
        self.ensure_open()?;
        let from = self.flow.current_index();
        if !self.flow.retreat() {
            return Ok(Retreat::AtFirstStep);
        }
        let to = self.flow.current_index();
        info!(from, to, step = %self.flow.current_id(), "retreated");
        Ok(Retreat::Moved { from, to })
    }

    /// Validates the current step against its own visible fields and writes
    /// the outcome to the field error state, without navigating. Rules on
    /// fields hidden by a closed gate are satisfied.
    pub fn validate_current_step(&mut self) -> ValidationResult {
        let step = self.registry.step(self.flow.current_id());
        let store = &self.store;
        let conditions = &self.conditions;
        let visible: Vec<&FieldId> = step
            .field_ids()
            .filter(|id| conditions.is_active(id.as_str(), store))
            .collect();
        let values = store.values(visible.iter().copied());
        let result = validate_where(step, &values, |id| visible.contains(&id));

        for id in visible {
            match result.error(id.as_str()) {
                Some(message) => self.store.set_error(id.clone(), message),
                None => self.store.clear_error(id.as_str()),
            }
        }
        result
    }

    pub fn current_step(&self) -> usize {
        self.flow.current_index()
    }

    pub fn current_step_schema(&self) -> &Step {
        self.registry.step(self.flow.current_id())
    }

    pub fn step_count(&self) -> usize {
        self.flow.len()
    }

    pub fn steps(&self) -> impl Iterator<Item = (&Step, StepStatus)> {
        self.registry
            .steps()
            .enumerate()
            .map(|(index, step)| (step, self.flow.status_at(index)))
    }

    /// Fields of the current step the rendering layer should draw.
    pub fn visible_fields(&self) -> Vec<&FieldSpec> {
        self.current_step_schema()
            .fields
            .iter()
            .filter(|field| self.conditions.is_active(field.id.as_str(), &self.store))
            .collect()
    }

    pub fn field_values(&self) -> IndexMap<FieldId, Value> {
        self.store.all_values()
    }

    pub fn field_value(&self, id: &str) -> Value {
        self.store.value(id)
    }

    /// Errors of fields shown on the current step. Errors of other steps stay
    /// attached to their fields but are not surfaced here.
    pub fn field_errors(&self) -> IndexMap<FieldId, String> {
        self.visible_fields()
            .into_iter()
            .filter_map(|field| {
                self.store
                    .error(field.id.as_str())
                    .map(|error| (field.id.clone(), error.to_string()))
            })
            .collect()
    }

    pub fn record(&self) -> &RecordStore {
        &self.store
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            step: self.flow.current_id().clone(),
            step_index: self.flow.current_index(),
            statuses: (0..self.flow.len())
                .map(|index| self.flow.status_at(index))
                .collect(),
            values: self.store.all_values(),
            errors: self.field_errors(),
            dirty: self
                .store
                .iter()
                .filter(|(_, field)| field.dirty)
                .map(|(id, _)| id.clone())
                .collect(),
            submitted: self.submitted,
        }
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.submitted {
            return Err(WizardError::Completed);
        }
        Ok(())
    }

    fn submit(&mut self) -> Submission {
        self.flow.complete_current();
        self.submitted = true;
        let submission = Submission {
            values: self.store.all_values(),
        };
        (self.on_submit)(&submission);
        submission
    }

    /// Defaults of the step being entered land in the record unless the
    /// field already holds something or is hidden.
    fn register_current_step(&mut self) {
        let step = self.registry.step(self.flow.current_id());
        for field in &step.fields {
            let Some(default) = &field.default else {
                continue;
            };
            if self.conditions.is_active(field.id.as_str(), &self.store) {
                self.store.register(field.id.clone(), default.clone());
            }
        }
    }
}

fn log_submission(submission: &Submission) {
    match submission.to_json() {
        Ok(record) => info!(%record, "wizard submitted"),
        Err(err) => warn!(error = %err, "could not render submitted record"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Advance, FieldChange, Retreat, Submission, Wizard};
    use crate::core::FieldId;
    use crate::core::value::Value;
    use crate::error::WizardError;
    use crate::state::conditional::ConditionalGroup;
    use crate::state::flow::StepStatus;
    use crate::state::step::Step;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn signup() -> Wizard {
        Wizard::new(
            vec![
                Step::builder("personal", "Step 1")
                    .text("name", "Nome")
                    .text("lastName", "Sobrenome")
                    .checkbox("address", "Endereço")
                    .text("street", "Rua")
                    .require("name")
                    .require("lastName")
                    .require("address")
                    .require_when("street", "address", true)
                    .build(),
                Step::builder("payment", "Step 2")
                    .text("cardNumber", "Cartão")
                    .text("cvv", "CVV")
                    .require("cardNumber")
                    .require("cvv")
                    .build(),
            ],
            vec![ConditionalGroup::new("address", true).dependent("street")],
        )
        .expect("wizard should build")
    }

    fn fill_personal(wizard: &mut Wizard) {
        wizard.on_field_change("name", "Ana").expect("name");
        wizard.on_field_change("lastName", "Lima").expect("lastName");
    }

    #[test]
    fn checkbox_default_is_registered_on_start() {
        let wizard = signup();
        assert_eq!(wizard.field_value("address"), Value::Bool(false));
        assert!(!wizard.record().is_dirty("address"));
        assert!(!wizard.record().contains("street"));
    }

    #[test]
    fn blocked_advance_surfaces_errors_and_keeps_index() {
        let mut wizard = signup();
        wizard.on_field_change("lastName", "Doe").expect("lastName");

        let Advance::Blocked(result) = wizard.on_advance().expect("advance") else {
            panic!("expected blocked advance");
        };
        assert_eq!(result.errors.len(), 1);
        assert_eq!(wizard.current_step(), 0);
        assert_eq!(
            wizard.field_errors().get("name").map(String::as_str),
            Some("name is a required field")
        );
    }

    #[test]
    fn writing_a_field_clears_its_error() {
        let mut wizard = signup();
        wizard.on_advance().expect("advance");
        assert!(wizard.field_errors().contains_key("name"));

        wizard.on_field_change("name", "Ana").expect("name");
        assert!(!wizard.field_errors().contains_key("name"));
        assert!(wizard.field_errors().contains_key("lastName"));
    }

    #[test]
    fn hidden_dependent_rejects_writes() {
        let mut wizard = signup();
        let change = wizard.on_field_change("street", "Main St").expect("street");
        assert_eq!(change, FieldChange::Ignored);
        assert!(!wizard.record().contains("street"));
    }

    #[test]
    fn unconditional_rule_on_hidden_field_does_not_block() {
        let mut wizard = Wizard::new(
            vec![
                Step::builder("personal", "Step 1")
                    .text("name", "Nome")
                    .checkbox("address", "Endereço")
                    .text("street", "Rua")
                    .require("name")
                    .require("street")
                    .build(),
                Step::builder("review", "Step 2").build(),
            ],
            vec![ConditionalGroup::new("address", true).dependent("street")],
        )
        .expect("wizard should build");

        wizard.on_field_change("name", "Ana").expect("name");
        assert_eq!(
            wizard.on_field_change("street", "Main St").expect("street"),
            FieldChange::Ignored
        );

        let result = wizard.validate_current_step();
        assert!(result.valid);
        assert!(!wizard.record().contains("street"));
        assert_eq!(
            wizard.on_advance().expect("advance"),
            Advance::Moved { from: 0, to: 1 }
        );
        assert!(!wizard.field_values().contains_key("street"));

        // once the gate opens the rule applies again
        wizard.on_retreat().expect("retreat");
        wizard.on_field_change("address", true).expect("address");
        let Advance::Blocked(result) = wizard.on_advance().expect("advance") else {
            panic!("visible empty street should block");
        };
        assert!(result.error("street").is_some());
    }

    #[test]
    fn unchecking_address_drops_street_and_its_error() {
        let mut wizard = signup();
        fill_personal(&mut wizard);
        wizard.on_field_change("address", true).expect("address");
        wizard.on_advance().expect("advance");
        assert!(wizard.field_errors().contains_key("street"));

        wizard.on_field_change("street", "Main St").expect("street");
        let change = wizard.on_field_change("address", false).expect("address");

        assert_eq!(
            change,
            FieldChange::Applied {
                cleared: vec![FieldId::from("street")]
            }
        );
        assert!(!wizard.field_values().contains_key("street"));
        assert!(wizard.field_errors().is_empty());
        assert!(wizard.visible_fields().iter().all(|f| f.id.as_str() != "street"));
    }

    #[test]
    fn unknown_field_and_wrong_kind_are_rejected() {
        let mut wizard = signup();
        assert_eq!(
            wizard.on_field_change("email", "a@b.c"),
            Err(WizardError::UnknownField(FieldId::from("email")))
        );
        assert!(matches!(
            wizard.on_field_change("address", "yes"),
            Err(WizardError::KindMismatch { .. })
        ));
        assert_eq!(wizard.field_value("address"), Value::Bool(false));
    }

    #[test]
    fn retreat_never_validates() {
        let mut wizard = signup();
        fill_personal(&mut wizard);
        wizard.on_advance().expect("advance");
        wizard.on_advance().expect("blocked advance on payment");
        assert!(wizard.field_errors().contains_key("cvv"));

        assert_eq!(
            wizard.on_retreat().expect("retreat"),
            Retreat::Moved { from: 1, to: 0 }
        );
        assert_eq!(wizard.on_retreat().expect("retreat"), Retreat::AtFirstStep);
        assert!(wizard.field_errors().is_empty());
    }

    #[test]
    fn values_survive_navigation() {
        let mut wizard = signup();
        fill_personal(&mut wizard);
        wizard.on_advance().expect("advance");
        wizard.on_retreat().expect("retreat");
        assert_eq!(wizard.field_value("name"), Value::text("Ana"));
        assert_eq!(wizard.field_value("lastName"), Value::text("Lima"));
    }

    #[test]
    fn submission_happens_once_and_is_terminal() {
        let received = Rc::new(RefCell::new(Vec::<Submission>::new()));
        let sink = Rc::clone(&received);
        let mut wizard = signup().with_submit_handler(move |submission| {
            sink.borrow_mut().push(submission.clone());
        });

        fill_personal(&mut wizard);
        wizard.on_advance().expect("advance");
        wizard.on_field_change("cardNumber", "4111").expect("card");
        wizard.on_field_change("cvv", "123").expect("cvv");

        let outcome = wizard.on_advance().expect("submit");
        assert!(matches!(outcome, Advance::Submitted(_)));
        assert!(wizard.is_submitted());
        assert_eq!(wizard.on_advance(), Err(WizardError::Completed));
        assert_eq!(wizard.on_retreat(), Err(WizardError::Completed));
        assert_eq!(
            wizard.on_field_change("cvv", "999"),
            Err(WizardError::Completed)
        );

        let received = received.borrow();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].get("name"), Some(&Value::text("Ana")));
        assert_eq!(received[0].get("cvv"), Some(&Value::text("123")));
        assert_eq!(received[0].get("address"), Some(&Value::Bool(false)));
    }

    #[test]
    fn statuses_follow_navigation() {
        let mut wizard = signup();
        fill_personal(&mut wizard);
        wizard.on_advance().expect("advance");
        let statuses: Vec<StepStatus> = wizard.steps().map(|(_, status)| status).collect();
        assert_eq!(statuses, vec![StepStatus::Done, StepStatus::Active]);
        assert_eq!(wizard.current_step_schema().id.as_str(), "payment");
    }

    #[test]
    fn snapshot_serializes_form_state() {
        let mut wizard = signup();
        wizard.on_field_change("name", "Ana").expect("name");
        let json = serde_json::to_value(wizard.snapshot()).expect("snapshot");
        assert_eq!(json["step"], "personal");
        assert_eq!(json["values"]["name"], "Ana");
        assert_eq!(json["values"]["address"], false);
        assert_eq!(json["dirty"], serde_json::json!(["name"]));
    }
}
