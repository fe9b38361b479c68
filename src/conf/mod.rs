mod config;
mod table;

pub use self::config::Config;
pub use table::{ColumnConfig, TableConfig};
