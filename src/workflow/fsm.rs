use crate::{Error, Result};
use tracing::{debug, info, warn};

// Workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Collecting,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

// Workflow events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    InputReceived,
    SubmitRequested,
    ValidationPassed,
    ValidationFailed,
    ScoringSucceeded,
    ScoringFailed,
    Acknowledged,
    Abandoned,
}

pub struct WorkflowStateMachine {
    name: &'static str,
    state: WorkflowState,
}

impl WorkflowStateMachine {
    pub fn new(name: &'static str) -> Self {
        debug!("Creating {} workflow FSM", name);
        Self {
            name,
            state: WorkflowState::Idle,
        }
    }

    pub fn current_state(&self) -> WorkflowState {
        self.state
    }

    pub fn transition(&mut self, event: WorkflowEvent) -> Result<()> {
        use WorkflowEvent as E;
        use WorkflowState as S;

        let old_state = self.state;
        let new_state = match (old_state, event) {
            (S::Idle | S::Collecting, E::InputReceived) => S::Collecting,
            (S::Collecting, E::SubmitRequested) => S::Validating,
            (S::Validating, E::ValidationPassed) => S::Submitting,
            (S::Validating, E::ValidationFailed) => S::Failed,
            (S::Submitting, E::ScoringSucceeded) => S::Succeeded,
            (S::Submitting, E::ScoringFailed) => S::Failed,
            (S::Succeeded | S::Failed, E::Acknowledged) => S::Idle,
            (_, E::Abandoned) => S::Idle,
            _ => {
                warn!(
                    "Invalid {} workflow transition from {:?} with event {:?}",
                    self.name, old_state, event
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", old_state),
                    requested: format!("{:?}", event),
                });
            }
        };

        if old_state != new_state {
            info!(
                "{} workflow: {:?} -> {:?} (event: {:?})",
                self.name, old_state, new_state, event
            );
        }

        self.state = new_state;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, WorkflowState::Succeeded | WorkflowState::Failed)
    }

    /// Work is outstanding; a submit now is a no-op.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Validating | WorkflowState::Submitting
        )
    }
}
