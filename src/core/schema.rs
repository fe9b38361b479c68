use std::any::TypeId;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column-wide interpretation of cells. Fixed at column construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Int,
    Float,
    String,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
        }
    }

    /// Category tag given to columns that were not assigned one explicitly.
    pub fn default_category(&self) -> TypeId {
        match self {
            Kind::Int => TypeId::of::<i64>(),
            Kind::Float => TypeId::of::<f64>(),
            Kind::String => TypeId::of::<str>(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
