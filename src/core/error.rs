use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ColumnError {
    #[error("Position {pos} out of range (size {size})")]
    OutOfRange { pos: u32, size: u32 },
    #[error("Allocation of {bytes} bytes (align {align}) failed")]
    AllocationFailed { bytes: usize, align: usize },
    #[error("Capacity overflow: cannot lay out {0} cells")]
    CapacityOverflow(u32),
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("Table error: {0}")]
    TableError(String),
}
