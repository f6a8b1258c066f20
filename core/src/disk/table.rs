// Extent table: the ordered layout of one disk

use std::collections::HashSet;

use super::partition::{Extent, ExtentId, ExtentIds};
use crate::error::InvariantViolation;

/// Represents a free space region on disk, in MB from the start of the disk
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FreeRegion {
    pub extent: ExtentId,
    pub start_mb: u64,
    pub size_mb: u64,
}

impl FreeRegion {
    /// End offset (exclusive)
    pub fn end_mb(&self) -> u64 {
        self.start_mb + self.size_mb
    }
}

/// Ordered, gap-free list of extents covering a disk end to end.
///
/// Tables are only built by the allocation engine and the registry, and
/// are never changed once a snapshot holds them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtentTable {
    extents: Vec<Extent>,
}

impl ExtentTable {
    /// A blank disk: one free extent spanning everything.
    pub(crate) fn blank(ids: &ExtentIds, total_mb: u64) -> Self {
        Self {
            extents: vec![Extent::free(ids.next(), total_mb)],
        }
    }

    pub(crate) fn from_extents(extents: Vec<Extent>) -> Self {
        Self { extents }
    }

    pub(crate) fn to_vec(&self) -> Vec<Extent> {
        self.extents.clone()
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Extent> {
        self.extents.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extent> {
        self.extents.iter()
    }

    pub fn as_slice(&self) -> &[Extent] {
        &self.extents
    }

    pub fn position(&self, id: ExtentId) -> Option<usize> {
        self.extents.iter().position(|e| e.id == id)
    }

    pub fn find(&self, id: ExtentId) -> Option<&Extent> {
        self.extents.iter().find(|e| e.id == id)
    }

    pub fn total_mb(&self) -> u64 {
        self.extents.iter().map(|e| e.size_mb).sum()
    }

    pub fn allocated_mb(&self) -> u64 {
        self.extents
            .iter()
            .filter(|e| e.is_allocated())
            .map(|e| e.size_mb)
            .sum()
    }

    pub fn free_mb(&self) -> u64 {
        self.total_mb() - self.allocated_mb()
    }

    /// Extents paired with their starting offset in MB.
    pub fn layout(&self) -> impl Iterator<Item = (u64, &Extent)> {
        self.extents.iter().scan(0u64, |offset, extent| {
            let start = *offset;
            *offset += extent.size_mb;
            Some((start, extent))
        })
    }

    pub fn free_regions(&self) -> impl Iterator<Item = FreeRegion> + '_ {
        self.layout()
            .filter(|(_, e)| e.is_free())
            .map(|(start_mb, e)| FreeRegion {
                extent: e.id,
                start_mb,
                size_mb: e.size_mb,
            })
    }

    pub fn largest_free(&self) -> Option<FreeRegion> {
        // First one wins on ties
        self.free_regions()
            .fold(None, |best: Option<FreeRegion>, region| match best {
                Some(b) if b.size_mb >= region.size_mb => Some(b),
                _ => Some(region),
            })
    }

    /// Verify every structural invariant against the disk's fixed size.
    pub fn check_invariants(&self, total_mb: u64) -> Result<(), InvariantViolation> {
        let actual = self.total_mb();
        if actual != total_mb {
            return Err(InvariantViolation::SizeMismatch {
                expected: total_mb,
                actual,
            });
        }

        let mut seen = HashSet::with_capacity(self.extents.len());
        for (index, extent) in self.extents.iter().enumerate() {
            if extent.size_mb == 0 {
                return Err(InvariantViolation::ZeroSize { index });
            }
            if !seen.insert(extent.id) {
                return Err(InvariantViolation::DuplicateId {
                    id: extent.id.get(),
                });
            }
            if extent.is_free() && *extent != extent.released() {
                return Err(InvariantViolation::DirtyFreeExtent { index });
            }
        }

        if let Some(index) = self
            .extents
            .windows(2)
            .position(|pair| pair[0].is_free() && pair[1].is_free())
        {
            return Err(InvariantViolation::AdjacentFree { index });
        }

        Ok(())
    }
}

/// Merge every run of consecutive free extents into one.
///
/// A single left-to-right pass: the surviving extent of a run keeps the id
/// of the run's first member and takes the summed size.
pub(crate) fn coalesce(extents: Vec<Extent>) -> Vec<Extent> {
    let mut merged: Vec<Extent> = Vec::with_capacity(extents.len());

    for extent in extents {
        match merged.last_mut() {
            Some(prev) if prev.is_free() && extent.is_free() => {
                prev.size_mb += extent.size_mb;
            }
            _ => merged.push(extent),
        }
    }

    merged
}
