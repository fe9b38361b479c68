mod error;
mod logger;
mod schema;

pub use error::ColumnError;
pub use logger::setup_logging;
pub use schema::Kind;
