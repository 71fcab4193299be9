pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod session;
pub mod workflow;

pub use error::{Error, FailureKind, Result};
