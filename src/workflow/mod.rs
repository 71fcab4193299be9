mod executor;
pub mod fsm;

pub use executor::{BatchWorkflow, SingleWorkflow, Submission, WorkflowOutcome};
pub use fsm::{WorkflowEvent, WorkflowState, WorkflowStateMachine};
