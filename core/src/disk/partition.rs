// Extent (partition) information

use core::fmt;
use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gpt_disk_types::GptPartitionType;

use crate::config::UNALLOCATED_LABEL;

/// Identity of one extent. Never reused within a registry lineage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtentId(u64);

impl ExtentId {
    /// Wrap a raw id, e.g. one typed back in by a user.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExtentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic extent id source.
///
/// Clones share the counter, so every snapshot derived from one registry
/// draws from the same sequence.
#[derive(Clone, Debug)]
pub struct ExtentIds(Arc<AtomicU64>);

impl ExtentIds {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }

    pub fn next(&self) -> ExtentId {
        ExtentId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtentKind {
    Allocated,
    Free,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileSystem {
    Unformatted,
    Ntfs,
    Fat32,
    ExFat,
}

impl FileSystem {
    pub const ALL: [FileSystem; 4] = [Self::Unformatted, Self::Ntfs, Self::Fat32, Self::ExFat];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unformatted => "RAW",
            Self::Ntfs => "NTFS",
            Self::Fat32 => "FAT32",
            Self::ExFat => "exFAT",
        }
    }

    /// GPT partition type a volume with this filesystem would carry.
    /// All Windows data filesystems share the basic data type.
    pub fn gpt_type(&self) -> GptPartitionType {
        GptPartitionType::BASIC_DATA
    }
}

impl fmt::Display for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FileSystem {
    type Err = UnknownFileSystem;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ntfs" => Ok(Self::Ntfs),
            "fat32" => Ok(Self::Fat32),
            "exfat" => Ok(Self::ExFat),
            "raw" | "unformatted" => Ok(Self::Unformatted),
            _ => Err(UnknownFileSystem),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown filesystem (expected NTFS, FAT32, exFAT or RAW).")]
pub struct UnknownFileSystem;

/// A single drive letter, always stored uppercase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriveLetter(char);

impl DriveLetter {
    pub fn new(letter: char) -> Option<Self> {
        letter
            .is_ascii_alphabetic()
            .then(|| Self(letter.to_ascii_uppercase()))
    }

    pub const fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for DriveLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.0)
    }
}

impl FromStr for DriveLetter {
    type Err = InvalidDriveLetter;

    /// Accepts `E` or `E:`.
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let s = s.strip_suffix(':').unwrap_or(s);
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c).ok_or(InvalidDriveLetter),
            _ => Err(InvalidDriveLetter),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("A drive letter is a single letter A-Z.")]
pub struct InvalidDriveLetter;

/// One contiguous range of a disk's address space.
///
/// Free extents always look the same: unformatted, labelled
/// "Unallocated", no letter, no flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extent {
    pub id: ExtentId,
    pub kind: ExtentKind,
    pub filesystem: FileSystem,
    pub label: String,
    pub drive_letter: Option<DriveLetter>,
    pub size_mb: u64,
    pub is_system: bool,
    pub is_boot: bool,
}

impl Extent {
    pub fn free(id: ExtentId, size_mb: u64) -> Self {
        Self {
            id,
            kind: ExtentKind::Free,
            filesystem: FileSystem::Unformatted,
            label: UNALLOCATED_LABEL.to_string(),
            drive_letter: None,
            size_mb,
            is_system: false,
            is_boot: false,
        }
    }

    pub fn allocated(
        id: ExtentId,
        size_mb: u64,
        drive_letter: Option<DriveLetter>,
        label: &str,
        filesystem: FileSystem,
    ) -> Self {
        Self {
            id,
            kind: ExtentKind::Allocated,
            filesystem,
            label: label.to_string(),
            drive_letter,
            size_mb,
            is_system: false,
            is_boot: false,
        }
    }

    /// Mark as a protected system volume.
    pub fn system(mut self, is_boot: bool) -> Self {
        self.is_system = true;
        self.is_boot = is_boot;
        self
    }

    pub fn is_free(&self) -> bool {
        self.kind == ExtentKind::Free
    }

    pub fn is_allocated(&self) -> bool {
        self.kind == ExtentKind::Allocated
    }

    /// The same extent released back to unallocated space, keeping its id
    /// and size.
    pub(crate) fn released(&self) -> Self {
        Self::free(self.id, self.size_mb)
    }

    pub fn type_name(&self) -> &'static str {
        match (self.kind, self.is_system) {
            (ExtentKind::Free, _) => "Unallocated",
            (ExtentKind::Allocated, true) => "System",
            (ExtentKind::Allocated, false) => "Primary",
        }
    }
}
