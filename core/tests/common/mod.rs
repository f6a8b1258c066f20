//! Common test utilities for registry tests

#![allow(dead_code)]

use diskmgmt_core::{DiskId, DiskRegistry, Extent, ExtentId};

pub const DISK_MB: u64 = 1_048_576;

pub fn disk0() -> DiskId {
    DiskId::from("disk-0")
}

pub fn disk1() -> DiskId {
    DiskId::from("disk-1")
}

pub fn extents<'a>(reg: &'a DiskRegistry, disk: &DiskId) -> &'a [Extent] {
    reg.disk(disk.as_str())
        .expect("disk should exist")
        .extents
        .as_slice()
}

pub fn extent_id(reg: &DiskRegistry, disk: &DiskId, index: usize) -> ExtentId {
    extents(reg, disk)[index].id
}

/// `(is_free, size_mb)` for every extent, for compact layout asserts.
pub fn shape(reg: &DiskRegistry, disk: &DiskId) -> Vec<(bool, u64)> {
    extents(reg, disk)
        .iter()
        .map(|e| (e.is_free(), e.size_mb))
        .collect()
}

/// Every invariant, on every disk.
pub fn assert_invariants(reg: &DiskRegistry) {
    for disk in reg.disks() {
        if let Err(violation) = disk.extents.check_invariants(disk.total_mb) {
            panic!("{}: {}", disk.id, violation);
        }
        for extent in disk.extents.iter() {
            if extent.is_free() {
                assert!(extent.drive_letter.is_none());
            }
        }
    }
}
