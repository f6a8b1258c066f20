//! Disks, their extent tables, and the operations on them.

pub mod alloc_ops;
pub mod gpt;
pub mod manager;
pub mod partition;
pub mod table;
