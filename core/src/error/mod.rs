#[allow(clippy::module_inception)]
pub mod error;
pub mod query;

pub use error::{CliError, StateError};
pub use query::QueryError;
