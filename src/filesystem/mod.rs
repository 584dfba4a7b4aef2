//! Filesystem access for the file content reconciler.
//!
//! Supports:
//! - Local filesystem with atomic replace (default)
//! - In-memory store for tests and dry runs

mod store;
mod local;
mod memory;

pub use store::{FileStore, WriteReport};
pub use local::LocalFileStore;
pub use memory::MemoryFileStore;
