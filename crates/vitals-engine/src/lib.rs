pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod locator;
pub mod outcome;
pub mod verifier;

pub use backend::{Backend, BackendError, NavigationResult, WaitState};
pub use config::{ConfigLoader, VerifyConfig};
pub use error::{AssertionFailure, VerifyError};
pub use locator::Locator;
pub use outcome::{Outcome, OutcomeKind};
pub use verifier::Verifier;
