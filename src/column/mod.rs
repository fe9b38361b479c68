mod arena;
mod cell;
#[allow(clippy::module_inception)]
mod column;
mod resource;
mod value;

pub use arena::{ArenaStr, StringArena};
pub use cell::{Cell, FLOAT_NULL, INT_NULL, SSO_CAPACITY, SSO_MASK, STRING_ALIGN};
pub use column::Column;
pub use resource::{BumpResource, GlobalResource, MemoryResource};
pub use value::Value;
