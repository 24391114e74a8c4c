pub mod error;
pub mod export;
pub mod models;
pub mod poll_state;
pub mod session;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ErrorResponse};
pub use export::{poll_results, to_csv, to_json};
pub use models::*;
pub use poll_state::{PollAction, PollState, ViewMode};
pub use session::{Identity, ViewerSession};
pub use validation::*;

#[cfg(test)]
mod tests;
