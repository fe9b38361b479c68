//! In-memory columnar value store.
//!
//! A [`Column`](column::Column) is a growable array of 8-byte
//! [`Cell`](column::Cell)s holding 64-bit integers, 64-bit floats, or UTF-8
//! strings, with nulls encoded in-band and short strings stored inline. Long
//! strings live in a caller-owned [`StringArena`](column::StringArena).
pub mod column;
pub mod conf;
pub mod core;
pub mod table;
