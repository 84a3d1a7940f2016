pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod state;

pub use crate::core::value::Value;
pub use crate::core::{FieldId, StepId};

pub use config::WizardDefinition;
pub use error::{DefinitionError, WizardError};

pub use state::conditional::{ConditionalController, ConditionalGroup, GroupState};
pub use state::flow::{Flow, StepStatus};
pub use state::schema::SchemaRegistry;
pub use state::step::{FieldKind, FieldSpec, Rule, Step, StepBuilder};
pub use state::store::{Field, RecordStore};
pub use state::validation::{ValidationResult, validate, validate_where};
pub use state::wizard::{Advance, FieldChange, Retreat, Submission, Wizard, WizardSnapshot};
