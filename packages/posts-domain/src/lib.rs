pub mod actor;
pub mod query;
pub mod time_serde;

mod error;

pub use error::ValidationError;
