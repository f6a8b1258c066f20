// Disk registry - owns the disks, the selection, and dispatches operations

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use super::alloc_ops::{self, NewVolume, Transition};
use super::partition::{DriveLetter, Extent, ExtentId, ExtentIds, FileSystem};
use super::table::ExtentTable;
use crate::config::{DiskTemplate, Preset, RegistryConfig, SYSTEM_RESERVED_MB, WINDOWS_VOLUME_MB};
use crate::error::{AllocError, Result};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiskId(String);

impl DiskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DiskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DiskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DiskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiskKind {
    Hdd,
    Ssd,
}

impl DiskKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Hdd => "HDD",
            Self::Ssd => "SSD",
        }
    }
}

/// Represents one simulated disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disk {
    pub id: DiskId,
    pub name: String,
    pub kind: DiskKind,
    pub total_mb: u64,
    pub online: bool,
    pub extents: ExtentTable,
}

impl Disk {
    fn from_template(template: &DiskTemplate, extents: ExtentTable) -> Self {
        Self {
            id: DiskId::new(template.id.as_str()),
            name: template.name.clone(),
            kind: template.kind,
            total_mb: template.total_mb,
            online: template.online,
            extents,
        }
    }

    /// Same disk with a new table.
    fn with_extents(&self, extents: ExtentTable) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            total_mb: self.total_mb,
            online: self.online,
            extents,
        }
    }

    pub fn allocated_mb(&self) -> u64 {
        self.extents.allocated_mb()
    }

    pub fn free_mb(&self) -> u64 {
        self.extents.free_mb()
    }
}

/// One request against the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    AddRemovableDisk,
    Select(Option<ExtentId>),
    SetOnline {
        disk: DiskId,
        online: bool,
    },
    CreatePartition {
        disk: DiskId,
        extent: ExtentId,
        size_mb: u64,
        letter: Option<DriveLetter>,
        label: String,
        filesystem: FileSystem,
    },
    DeletePartition {
        disk: DiskId,
        extent: ExtentId,
    },
    FormatPartition {
        disk: DiskId,
        extent: ExtentId,
        label: String,
        filesystem: FileSystem,
    },
    ShrinkPartition {
        disk: DiskId,
        extent: ExtentId,
        amount_mb: u64,
    },
    ExtendPartition {
        disk: DiskId,
        extent: ExtentId,
        amount_mb: u64,
    },
    ChangeLetter {
        disk: DiskId,
        extent: ExtentId,
        letter: Option<DriveLetter>,
    },
}

/// Immutable snapshot of every disk plus the current selection.
///
/// Every operation returns a new snapshot. Disks untouched by an operation
/// are shared between the old and new snapshot; a touched disk is rebuilt,
/// never edited in place.
#[derive(Clone, Debug)]
pub struct DiskRegistry {
    config: Arc<RegistryConfig>,
    ids: ExtentIds,
    disks: BTreeMap<DiskId, Arc<Disk>>,
    selected: Option<ExtentId>,
}

impl PartialEq for DiskRegistry {
    /// Snapshots are equal when they show the same disks and selection.
    fn eq(&self, other: &Self) -> bool {
        self.disks == other.disks && self.selected == other.selected
    }
}

impl Eq for DiskRegistry {}

impl DiskRegistry {
    /// A freshly initialized registry.
    pub fn new(config: RegistryConfig) -> Self {
        let ids = ExtentIds::new();
        let disks = Self::initial_disks(&config, &ids);
        Self {
            config: Arc::new(config),
            ids,
            disks,
            selected: None,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn disks(&self) -> impl Iterator<Item = &Disk> {
        self.disks.values().map(|d| d.as_ref())
    }

    pub fn disk_count(&self) -> usize {
        self.disks.len()
    }

    pub fn disk(&self, id: &str) -> Option<&Disk> {
        self.disks.get(id).map(|d| d.as_ref())
    }

    pub fn selected(&self) -> Option<ExtentId> {
        self.selected
    }

    /// Locate an extent on any disk.
    pub fn find_extent(&self, id: ExtentId) -> Option<(&Disk, &Extent)> {
        self.disks()
            .find_map(|disk| disk.extents.find(id).map(|extent| (disk, extent)))
    }

    pub fn selected_extent(&self) -> Option<(&Disk, &Extent)> {
        self.selected.and_then(|id| self.find_extent(id))
    }

    /// Apply an operation, returning the unchanged snapshot on rejection.
    pub fn dispatch(&self, op: Operation) -> Self {
        self.try_dispatch(op).unwrap_or_else(|err| {
            debug!("operation rejected: {}", err);
            self.clone()
        })
    }

    /// Apply an operation, reporting why it was rejected.
    pub fn try_dispatch(&self, op: Operation) -> Result<Self> {
        match op {
            Operation::Initialize => Ok(self.reset()),
            Operation::AddRemovableDisk => Ok(self.with_removable_disk()),
            Operation::Select(id) => self.with_selection(id),
            Operation::SetOnline { disk, online } => self.with_online(&disk, online),
            Operation::CreatePartition {
                disk,
                extent,
                size_mb,
                letter,
                label,
                filesystem,
            } => {
                if let Some(letter) = letter {
                    self.check_letter_free(letter, None)?;
                }
                let volume = NewVolume {
                    size_mb,
                    drive_letter: letter,
                    label: &label,
                    filesystem,
                };
                self.apply(&disk, |table| {
                    alloc_ops::create_partition(table, extent, &volume, &self.ids)
                })
            }
            Operation::DeletePartition { disk, extent } => {
                self.apply(&disk, |table| alloc_ops::delete_partition(table, extent))
            }
            Operation::FormatPartition {
                disk,
                extent,
                label,
                filesystem,
            } => self.apply(&disk, |table| {
                alloc_ops::format_partition(table, extent, &label, filesystem)
            }),
            Operation::ShrinkPartition {
                disk,
                extent,
                amount_mb,
            } => self.apply(&disk, |table| {
                alloc_ops::shrink_partition(table, extent, amount_mb, &self.ids)
            }),
            Operation::ExtendPartition {
                disk,
                extent,
                amount_mb,
            } => self.apply(&disk, |table| {
                alloc_ops::extend_partition(table, extent, amount_mb)
            }),
            Operation::ChangeLetter {
                disk,
                extent,
                letter,
            } => {
                if let Some(letter) = letter {
                    self.check_letter_free(letter, Some(extent))?;
                }
                self.apply(&disk, |table| {
                    alloc_ops::change_letter(table, extent, letter)
                })
            }
        }
    }

    pub fn initialize(&self) -> Self {
        self.dispatch(Operation::Initialize)
    }

    pub fn add_removable_disk(&self) -> Self {
        self.dispatch(Operation::AddRemovableDisk)
    }

    pub fn select(&self, id: Option<ExtentId>) -> Self {
        self.dispatch(Operation::Select(id))
    }

    pub fn set_online(&self, disk: &DiskId, online: bool) -> Self {
        self.dispatch(Operation::SetOnline {
            disk: disk.clone(),
            online,
        })
    }

    pub fn create_partition(
        &self,
        disk: &DiskId,
        extent: ExtentId,
        size_mb: u64,
        letter: Option<DriveLetter>,
        label: &str,
        filesystem: FileSystem,
    ) -> Self {
        self.dispatch(Operation::CreatePartition {
            disk: disk.clone(),
            extent,
            size_mb,
            letter,
            label: label.to_string(),
            filesystem,
        })
    }

    pub fn delete_partition(&self, disk: &DiskId, extent: ExtentId) -> Self {
        self.dispatch(Operation::DeletePartition {
            disk: disk.clone(),
            extent,
        })
    }

    pub fn format_partition(
        &self,
        disk: &DiskId,
        extent: ExtentId,
        label: &str,
        filesystem: FileSystem,
    ) -> Self {
        self.dispatch(Operation::FormatPartition {
            disk: disk.clone(),
            extent,
            label: label.to_string(),
            filesystem,
        })
    }

    pub fn shrink_partition(&self, disk: &DiskId, extent: ExtentId, amount_mb: u64) -> Self {
        self.dispatch(Operation::ShrinkPartition {
            disk: disk.clone(),
            extent,
            amount_mb,
        })
    }

    pub fn extend_partition(&self, disk: &DiskId, extent: ExtentId, amount_mb: u64) -> Self {
        self.dispatch(Operation::ExtendPartition {
            disk: disk.clone(),
            extent,
            amount_mb,
        })
    }

    pub fn change_letter(
        &self,
        disk: &DiskId,
        extent: ExtentId,
        letter: Option<DriveLetter>,
    ) -> Self {
        self.dispatch(Operation::ChangeLetter {
            disk: disk.clone(),
            extent,
            letter,
        })
    }

    fn initial_disks(config: &RegistryConfig, ids: &ExtentIds) -> BTreeMap<DiskId, Arc<Disk>> {
        let template = &config.system_disk;
        let extents = match config.preset {
            Preset::Blank => ExtentTable::blank(ids, template.total_mb),
            Preset::Preinstalled => Self::preinstalled_table(ids, template.total_mb)
                .unwrap_or_else(|| {
                    warn!(
                        "system disk of {} MB is too small for the preinstalled layout, starting blank",
                        template.total_mb
                    );
                    ExtentTable::blank(ids, template.total_mb)
                }),
        };
        let disk = Disk::from_template(template, extents);

        let mut disks = BTreeMap::new();
        disks.insert(disk.id.clone(), Arc::new(disk));
        disks
    }

    /// System Reserved, Windows (C:), then whatever is left.
    fn preinstalled_table(ids: &ExtentIds, total_mb: u64) -> Option<ExtentTable> {
        let remaining = total_mb.checked_sub(SYSTEM_RESERVED_MB + WINDOWS_VOLUME_MB)?;
        if remaining == 0 {
            return None;
        }
        Some(ExtentTable::from_extents(vec![
            Extent::allocated(
                ids.next(),
                SYSTEM_RESERVED_MB,
                None,
                "System Reserved",
                FileSystem::Ntfs,
            )
            .system(true),
            Extent::allocated(
                ids.next(),
                WINDOWS_VOLUME_MB,
                DriveLetter::new('C'),
                "Windows",
                FileSystem::Ntfs,
            )
            .system(false),
            Extent::free(ids.next(), remaining),
        ]))
    }

    fn reset(&self) -> Self {
        info!("initialize: resetting to a fresh system disk");
        Self {
            config: Arc::clone(&self.config),
            ids: self.ids.clone(),
            disks: Self::initial_disks(&self.config, &self.ids),
            selected: None,
        }
    }

    fn with_removable_disk(&self) -> Self {
        let template = &self.config.removable_disk;
        if self.disks.contains_key(template.id.as_str()) {
            debug!("add_removable_disk: {} already attached", template.id);
            return self.clone();
        }

        info!("add_removable_disk: attaching {} ({} MB)", template.id, template.total_mb);
        let disk = Disk::from_template(template, ExtentTable::blank(&self.ids, template.total_mb));
        let mut next = self.clone();
        next.disks.insert(disk.id.clone(), Arc::new(disk));
        next
    }

    fn with_selection(&self, id: Option<ExtentId>) -> Result<Self> {
        if let Some(id) = id {
            self.find_extent(id).ok_or(AllocError::ExtentNotFound)?;
        }
        let mut next = self.clone();
        next.selected = id;
        Ok(next)
    }

    fn with_online(&self, disk_id: &DiskId, online: bool) -> Result<Self> {
        let disk = self.disks.get(disk_id).ok_or(AllocError::DiskNotFound)?;
        info!("set_online: {} -> {}", disk_id, online);

        let mut updated = disk.with_extents(disk.extents.clone());
        updated.online = online;
        let mut next = self.clone();
        next.disks.insert(disk_id.clone(), Arc::new(updated));
        Ok(next)
    }

    fn check_letter_free(&self, letter: DriveLetter, owner: Option<ExtentId>) -> Result<()> {
        if !self.config.enforce_unique_letters {
            return Ok(());
        }
        let taken = self
            .disks()
            .flat_map(|disk| disk.extents.iter())
            .any(|e| e.drive_letter == Some(letter) && Some(e.id) != owner);
        if taken {
            return Err(AllocError::LetterInUse);
        }
        Ok(())
    }

    /// Run one engine call against a disk and swap in its result.
    fn apply<F>(&self, disk_id: &DiskId, op: F) -> Result<Self>
    where
        F: FnOnce(&ExtentTable) -> Result<Transition>,
    {
        let disk = self.disks.get(disk_id).ok_or(AllocError::DiskNotFound)?;
        if !disk.online {
            return Err(AllocError::DiskOffline);
        }

        let Transition { table, focus } = op(&disk.extents)?;
        debug_assert_eq!(table.check_invariants(disk.total_mb), Ok(()));

        let mut next = self.clone();
        next.disks
            .insert(disk_id.clone(), Arc::new(disk.with_extents(table)));
        if let Some(focus) = focus {
            next.selected = Some(focus);
        }
        Ok(next)
    }
}
