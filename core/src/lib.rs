//! diskmgmt core library
//!
//! In-memory model of a disk management console: disks hold ordered extent
//! tables, a pure allocation engine computes the next table for each
//! partition operation, and the registry turns every call into a new
//! immutable snapshot.
//!
//! # Architecture
//!
//! ```text
//! caller ──op──▶ DiskRegistry ──table──▶ alloc_ops ──Transition──┐
//!                    ▲                                          │
//!                    └──────────── new snapshot ◀───────────────┘
//! ```
//!
//! Rejected operations never fail loudly: the registry hands back the
//! unchanged snapshot, and [`DiskRegistry::try_dispatch`] reports why.

#![allow(clippy::new_without_default)]

pub mod config;
pub mod disk;
pub mod error;
pub mod logger;
pub mod session;

pub use config::{DiskTemplate, Preset, RegistryConfig};
pub use disk::manager::{Disk, DiskId, DiskKind, DiskRegistry, Operation};
pub use disk::partition::{DriveLetter, Extent, ExtentId, ExtentKind, FileSystem};
pub use disk::table::ExtentTable;
pub use error::{AllocError, ErrorCategory, Result};
pub use session::Session;
