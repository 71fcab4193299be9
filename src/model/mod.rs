mod form;
mod result;
mod types;

pub use form::TransactionForm;
pub use result::{PredictionResult, Verdict};
pub use types::*;
