//! Error types for partition operations
//!
//! The engine reports every rejected operation with one of these. The
//! registry turns them into no-ops, so callers only see them through
//! `try_dispatch` or the session.

use thiserror::Error;

/// Result type for partition operations
pub type Result<T> = core::result::Result<T, AllocError>;

/// Reasons an operation was rejected.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AllocError {
    #[error("No disk with that id exists.")]
    DiskNotFound,
    #[error("No extent with that id exists on this disk.")]
    ExtentNotFound,
    #[error("The extent is not unallocated space.")]
    NotFree,
    #[error("The extent is unallocated space, not a volume.")]
    NotAllocated,
    #[error("The disk is offline.")]
    DiskOffline,
    #[error("Size must be a positive number of MB, and a shrink must leave at least 1 MB.")]
    InvalidSize,
    #[error("That drive letter is already assigned to another volume.")]
    LetterInUse,
    #[error("Not enough unallocated space.")]
    InsufficientSpace,
    #[error("No unallocated space immediately after this volume.")]
    NoAdjacentFreeSpace,
    #[error("System volumes cannot be deleted.")]
    ProtectedExtent,
}

/// Coarse grouping of [`AllocError`] for callers that only care about the
/// kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    InvalidState,
    InsufficientSpace,
    ProtectedResource,
}

impl AllocError {
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::DiskNotFound | Self::ExtentNotFound => ErrorCategory::NotFound,
            Self::NotFree
            | Self::NotAllocated
            | Self::DiskOffline
            | Self::InvalidSize
            | Self::LetterInUse => ErrorCategory::InvalidState,
            Self::InsufficientSpace | Self::NoAdjacentFreeSpace => {
                ErrorCategory::InsufficientSpace
            }
            Self::ProtectedExtent => ErrorCategory::ProtectedResource,
        }
    }
}

/// A broken table invariant. Only produced by
/// [`ExtentTable::check_invariants`](crate::disk::table::ExtentTable::check_invariants);
/// seeing one means the engine has a bug.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Extent sizes add up to {actual} MB but the disk holds {expected} MB.")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("Extent at index {index} has zero size.")]
    ZeroSize { index: usize },
    #[error("Extents at index {index} and {} are both unallocated.", .index + 1)]
    AdjacentFree { index: usize },
    #[error("Unallocated extent at index {index} carries volume metadata.")]
    DirtyFreeExtent { index: usize },
    #[error("Extent id {id} appears more than once.")]
    DuplicateId { id: u64 },
}
