//! Registry configuration.
//!
//! Describes which disks exist, how the system disk starts out, and which
//! optional checks the registry applies on top of the engine.

use crate::disk::manager::DiskKind;

/// Size of the system disk: 1 TB.
pub const DEFAULT_DISK_SIZE_MB: u64 = 1_048_576;

/// Size of the removable disk: 16 GB.
pub const REMOVABLE_DISK_SIZE_MB: u64 = 16_384;

/// Label every unallocated extent carries.
pub const UNALLOCATED_LABEL: &str = "Unallocated";

/// Size of the "System Reserved" volume in the preinstalled layout.
pub const SYSTEM_RESERVED_MB: u64 = 500;

/// Size of the Windows (C:) volume in the preinstalled layout: 200 GB.
pub const WINDOWS_VOLUME_MB: u64 = 204_800;

/// Initial layout of the system disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// One unallocated extent spanning the whole disk.
    #[default]
    Blank,
    /// System Reserved + Windows (C:) + unallocated remainder.
    Preinstalled,
}

/// Shape of one simulated disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskTemplate {
    pub id: String,
    pub name: String,
    pub kind: DiskKind,
    pub total_mb: u64,
    pub online: bool,
}

impl DiskTemplate {
    pub fn system() -> Self {
        Self {
            id: "disk-0".to_string(),
            name: "Disk 0".to_string(),
            kind: DiskKind::Hdd,
            total_mb: DEFAULT_DISK_SIZE_MB,
            online: true,
        }
    }

    pub fn removable() -> Self {
        Self {
            id: "disk-1".to_string(),
            name: "Disk 1 (Removable)".to_string(),
            kind: DiskKind::Ssd,
            total_mb: REMOVABLE_DISK_SIZE_MB,
            online: true,
        }
    }

    /// Override the size.
    pub fn with_size(mut self, total_mb: u64) -> Self {
        self.total_mb = total_mb;
        self
    }
}

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Disk created by `initialize`.
    pub system_disk: DiskTemplate,
    /// Disk created by `add_removable_disk`.
    pub removable_disk: DiskTemplate,
    /// Initial layout of the system disk.
    pub preset: Preset,
    /// Reject a drive letter that another volume already holds.
    /// Off by default.
    pub enforce_unique_letters: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            system_disk: DiskTemplate::system(),
            removable_disk: DiskTemplate::removable(),
            preset: Preset::Blank,
            enforce_unique_letters: false,
        }
    }
}

impl RegistryConfig {
    /// Config whose system disk comes with Windows already installed.
    pub fn preinstalled() -> Self {
        Self {
            preset: Preset::Preinstalled,
            ..Default::default()
        }
    }

    /// Set the initial layout.
    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = preset;
        self
    }

    /// Turn drive-letter uniqueness checks on or off.
    pub fn unique_letters(mut self, enforce: bool) -> Self {
        self.enforce_unique_letters = enforce;
        self
    }

    /// Replace the system disk template.
    pub fn system_disk(mut self, template: DiskTemplate) -> Self {
        self.system_disk = template;
        self
    }
}
