use std::io;

use thiserror::Error;

use crate::core::{FieldId, StepId};
use crate::state::step::FieldKind;

/// Configuration defects found while loading a wizard definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("a wizard needs at least one step")]
    EmptyWizard,

    #[error("step `{0}` is declared more than once")]
    DuplicateStep(StepId),

    #[error("step `{step}` declares field `{field}` more than once")]
    DuplicateField { step: StepId, field: FieldId },

    #[error("step `{step}` has a rule on `{field}`, which the step does not declare")]
    UnknownFieldReference { step: StepId, field: FieldId },

    #[error("conditional group references `{0}`, which no step declares")]
    UnknownConditionalField(FieldId),

    #[error("field `{field}` is a {kind} but its default does not fit that kind")]
    DefaultKindMismatch { field: FieldId, kind: FieldKind },

    #[error("field `{field}` is declared as {first} on one step and {second} on another")]
    ConflictingFieldKind {
        field: FieldId,
        first: FieldKind,
        second: FieldKind,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid definition: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Rejected runtime requests. None of these change wizard state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("no step declares field `{0}`")]
    UnknownField(FieldId),

    #[error("field `{field}` is a {kind} and cannot hold that value")]
    KindMismatch { field: FieldId, kind: FieldKind },

    #[error("the wizard has already been submitted")]
    Completed,
}
