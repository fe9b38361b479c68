use serde::{Deserialize, Serialize};

use crate::core::Kind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub name: String,
    pub kind: Kind,
    /// Cells reserved up front.
    #[serde(default = "ColumnConfig::default_reserve")]
    pub reserve: u32,
}

impl ColumnConfig {
    fn default_reserve() -> u32 {
        0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default = "TableConfig::default_columns")]
    pub columns: Vec<ColumnConfig>,
}

impl TableConfig {
    fn default_columns() -> Vec<ColumnConfig> {
        Vec::new()
    }
}
