//! External storage module
//!
//! This module contains the durable storage the engine snapshots are written to.

pub mod storage;

// Re-export main types
pub use storage::SnapshotStore;
