use crate::core::StepId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Active,
    Done,
}

/// Step index management. The index moves only through `advance` and
/// `retreat`, one step at a time, and never leaves `0..len`.
#[derive(Debug, Clone)]
pub struct Flow {
    steps: Vec<StepId>,
    current: usize,
    statuses: Vec<StepStatus>,
}

impl Flow {
    pub fn new(steps: Vec<StepId>) -> Self {
        let mut statuses = vec![StepStatus::Pending; steps.len()];
        if let Some(first) = statuses.first_mut() {
            *first = StepStatus::Active;
        }
        Self {
            steps,
            current: 0,
            statuses,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The wizard never builds an empty flow.
    pub(crate) fn current_id(&self) -> &StepId {
        &self.steps[self.current]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn status_at(&self, index: usize) -> StepStatus {
        self.statuses
            .get(index)
            .copied()
            .unwrap_or(StepStatus::Pending)
    }

    pub fn current_status(&self) -> StepStatus {
        self.status_at(self.current)
    }

    pub fn complete_current(&mut self) {
        if let Some(status) = self.statuses.get_mut(self.current) {
            *status = StepStatus::Done;
        }
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.steps.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.complete_current();
        self.current += 1;
        if let Some(status) = self.statuses.get_mut(self.current) {
            *status = StepStatus::Active;
        }
        true
    }

    /// The step being left goes back to pending; the one re-entered becomes
    /// active again even though it was completed before.
    pub fn retreat(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        if let Some(status) = self.statuses.get_mut(self.current) {
            *status = StepStatus::Pending;
        }
        self.current -= 1;
        if let Some(status) = self.statuses.get_mut(self.current) {
            *status = StepStatus::Active;
        }
        true
    }
}
