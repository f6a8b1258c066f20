// Create, delete and in-place volume edits

use log::debug;

use super::utils::{locate, locate_allocated};
use super::Transition;
use crate::disk::partition::{DriveLetter, Extent, ExtentId, ExtentIds, FileSystem};
use crate::disk::table::{coalesce, ExtentTable};
use crate::error::{AllocError, Result};

/// Parameters of a new volume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVolume<'a> {
    pub size_mb: u64,
    pub drive_letter: Option<DriveLetter>,
    pub label: &'a str,
    pub filesystem: FileSystem,
}

/// Carve a volume out of the front of a free extent.
///
/// The free extent is replaced by the volume; whatever is left over
/// becomes a new free extent right after it. An exact fit leaves no
/// remainder.
pub fn create_partition(
    table: &ExtentTable,
    target: ExtentId,
    volume: &NewVolume<'_>,
    ids: &ExtentIds,
) -> Result<Transition> {
    let (index, free) = locate(table, target)?;

    if !free.is_free() {
        return Err(AllocError::NotFree);
    }
    if volume.size_mb == 0 {
        return Err(AllocError::InvalidSize);
    }
    if volume.size_mb > free.size_mb {
        return Err(AllocError::InsufficientSpace);
    }

    let remainder = free.size_mb - volume.size_mb;
    let created = Extent::allocated(
        ids.next(),
        volume.size_mb,
        volume.drive_letter,
        volume.label,
        volume.filesystem,
    );
    let created_id = created.id;

    let mut extents = table.to_vec();
    extents[index] = created;
    if remainder > 0 {
        extents.insert(index + 1, Extent::free(ids.next(), remainder));
    }

    debug!(
        "create_partition: extent {} -> volume {} ({} MB, {} MB left)",
        target, created_id, volume.size_mb, remainder
    );
    Ok(Transition::new(
        ExtentTable::from_extents(extents),
        Some(created_id),
    ))
}

/// Release a volume back to unallocated space and merge it with any free
/// neighbours. System volumes are refused.
pub fn delete_partition(table: &ExtentTable, target: ExtentId) -> Result<Transition> {
    let (index, volume) = locate_allocated(table, target)?;

    if volume.is_system {
        return Err(AllocError::ProtectedExtent);
    }

    let mut extents = table.to_vec();
    extents[index] = volume.released();
    let extents = coalesce(extents);

    // Whatever now sits where the volume was, clamped to the new end
    let focus = extents
        .get(index.min(extents.len().saturating_sub(1)))
        .map(|e| e.id);

    debug!(
        "delete_partition: volume {} released, table now {} extents",
        target,
        extents.len()
    );
    Ok(Transition::new(ExtentTable::from_extents(extents), focus))
}

/// Change a volume's label and filesystem.
pub fn format_partition(
    table: &ExtentTable,
    target: ExtentId,
    label: &str,
    filesystem: FileSystem,
) -> Result<Transition> {
    let (index, _) = locate_allocated(table, target)?;

    let mut extents = table.to_vec();
    extents[index].label = label.to_string();
    extents[index].filesystem = filesystem;

    debug!("format_partition: volume {} as {} '{}'", target, filesystem, label);
    Ok(Transition::new(ExtentTable::from_extents(extents), None))
}

/// Assign, replace or (with `None`) remove a volume's drive letter.
pub fn change_letter(
    table: &ExtentTable,
    target: ExtentId,
    letter: Option<DriveLetter>,
) -> Result<Transition> {
    let (index, _) = locate_allocated(table, target)?;

    let mut extents = table.to_vec();
    extents[index].drive_letter = letter;

    debug!("change_letter: volume {} -> {:?}", target, letter);
    Ok(Transition::new(ExtentTable::from_extents(extents), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::partition::ExtentKind;
    use test_log::test;

    const DISK_MB: u64 = 1_048_576;

    fn volume(size_mb: u64, letter: char) -> NewVolume<'static> {
        NewVolume {
            size_mb,
            drive_letter: DriveLetter::new(letter),
            label: "New Volume",
            filesystem: FileSystem::Ntfs,
        }
    }

    fn blank(ids: &ExtentIds) -> ExtentTable {
        ExtentTable::blank(ids, DISK_MB)
    }

    #[test]
    fn test_create_splits_free_extent() {
        let ids = ExtentIds::new();
        let table = blank(&ids);
        let free_id = table.get(0).unwrap().id;

        let t = create_partition(&table, free_id, &volume(500_000, 'C'), &ids).unwrap();

        assert_eq!(t.table.len(), 2);
        let vol = t.table.get(0).unwrap();
        assert_eq!(vol.kind, ExtentKind::Allocated);
        assert_eq!(vol.size_mb, 500_000);
        assert_eq!(vol.drive_letter, DriveLetter::new('C'));
        assert_eq!(vol.filesystem, FileSystem::Ntfs);
        assert!(!vol.is_system && !vol.is_boot);
        assert_ne!(vol.id, free_id);

        let rest = t.table.get(1).unwrap();
        assert!(rest.is_free());
        assert_eq!(rest.size_mb, 548_576);

        assert_eq!(t.focus, Some(vol.id));
        assert_eq!(t.table.check_invariants(DISK_MB), Ok(()));
    }

    #[test]
    fn test_create_exact_fit_has_no_remainder() {
        let ids = ExtentIds::new();
        let table = blank(&ids);
        let free_id = table.get(0).unwrap().id;

        let t = create_partition(&table, free_id, &volume(DISK_MB, 'D'), &ids).unwrap();
        assert_eq!(t.table.len(), 1);
        assert!(t.table.get(0).unwrap().is_allocated());
        assert_eq!(t.table.check_invariants(DISK_MB), Ok(()));
    }

    #[test]
    fn test_create_rejections() {
        let ids = ExtentIds::new();
        let table = blank(&ids);
        let free_id = table.get(0).unwrap().id;

        assert_eq!(
            create_partition(&table, free_id, &volume(0, 'E'), &ids).unwrap_err(),
            AllocError::InvalidSize
        );
        assert_eq!(
            create_partition(&table, free_id, &volume(DISK_MB + 1, 'E'), &ids).unwrap_err(),
            AllocError::InsufficientSpace
        );
        assert_eq!(
            create_partition(&table, ExtentId::from_raw(9999), &volume(1, 'E'), &ids)
                .unwrap_err(),
            AllocError::ExtentNotFound
        );

        let t = create_partition(&table, free_id, &volume(10, 'E'), &ids).unwrap();
        let vol_id = t.table.get(0).unwrap().id;
        assert_eq!(
            create_partition(&t.table, vol_id, &volume(1, 'F'), &ids).unwrap_err(),
            AllocError::NotFree
        );
    }

    #[test]
    fn test_create_then_delete_restores_single_free_extent() {
        let ids = ExtentIds::new();
        let table = blank(&ids);
        let free_id = table.get(0).unwrap().id;

        let created = create_partition(&table, free_id, &volume(1234, 'E'), &ids).unwrap();
        let vol_id = created.focus.unwrap();
        let deleted = delete_partition(&created.table, vol_id).unwrap();

        assert_eq!(deleted.table.len(), 1);
        let only = deleted.table.get(0).unwrap();
        assert!(only.is_free());
        assert_eq!(only.size_mb, DISK_MB);
        assert_eq!(deleted.focus, Some(only.id));
    }

    #[test]
    fn test_delete_merges_both_neighbours() {
        let ids = ExtentIds::new();
        let table = ExtentTable::from_extents(vec![
            Extent::allocated(ids.next(), 100, DriveLetter::new('C'), "A", FileSystem::Ntfs),
            Extent::free(ids.next(), 50),
            Extent::allocated(ids.next(), 200, DriveLetter::new('D'), "B", FileSystem::Ntfs),
            Extent::free(ids.next(), 25),
            Extent::allocated(ids.next(), 300, DriveLetter::new('E'), "C", FileSystem::Ntfs),
        ]);
        let middle = table.get(2).unwrap().id;

        let t = delete_partition(&table, middle).unwrap();
        let sizes: Vec<u64> = t.table.iter().map(|e| e.size_mb).collect();
        assert_eq!(sizes, vec![100, 275, 300]);
        assert!(t.table.get(1).unwrap().is_free());
        assert_eq!(t.focus, Some(t.table.get(1).unwrap().id));
        assert_eq!(t.table.check_invariants(675), Ok(()));
    }

    #[test]
    fn test_delete_last_extent_clamps_focus() {
        let ids = ExtentIds::new();
        let table = ExtentTable::from_extents(vec![
            Extent::allocated(ids.next(), 100, None, "A", FileSystem::Ntfs),
            Extent::free(ids.next(), 50),
            Extent::allocated(ids.next(), 200, None, "B", FileSystem::Ntfs),
        ]);
        let last = table.get(2).unwrap().id;

        let t = delete_partition(&table, last).unwrap();
        assert_eq!(t.table.len(), 2);
        assert_eq!(t.focus, Some(t.table.get(1).unwrap().id));
        assert_eq!(t.table.get(1).unwrap().size_mb, 250);
    }

    #[test]
    fn test_delete_rejections() {
        let ids = ExtentIds::new();
        let table = ExtentTable::from_extents(vec![
            Extent::allocated(ids.next(), 100, DriveLetter::new('C'), "Windows", FileSystem::Ntfs)
                .system(false),
            Extent::free(ids.next(), 50),
        ]);
        let system = table.get(0).unwrap().id;
        let free = table.get(1).unwrap().id;

        assert_eq!(
            delete_partition(&table, system).unwrap_err(),
            AllocError::ProtectedExtent
        );
        assert_eq!(
            delete_partition(&table, free).unwrap_err(),
            AllocError::NotAllocated
        );
    }

    #[test]
    fn test_format_and_letter_edit_in_place() {
        let ids = ExtentIds::new();
        let table = ExtentTable::from_extents(vec![
            Extent::allocated(ids.next(), 100, DriveLetter::new('E'), "Old", FileSystem::Fat32),
            Extent::free(ids.next(), 50),
        ]);
        let vol = table.get(0).unwrap().id;
        let free = table.get(1).unwrap().id;

        let t = format_partition(&table, vol, "Backup", FileSystem::ExFat).unwrap();
        let edited = t.table.get(0).unwrap();
        assert_eq!(edited.label, "Backup");
        assert_eq!(edited.filesystem, FileSystem::ExFat);
        assert_eq!(edited.size_mb, 100);
        assert_eq!(t.focus, None);

        let t = change_letter(&t.table, vol, DriveLetter::new('X')).unwrap();
        assert_eq!(t.table.get(0).unwrap().drive_letter, DriveLetter::new('X'));
        let t = change_letter(&t.table, vol, None).unwrap();
        assert_eq!(t.table.get(0).unwrap().drive_letter, None);

        assert_eq!(
            format_partition(&table, free, "x", FileSystem::Ntfs).unwrap_err(),
            AllocError::NotAllocated
        );
        assert_eq!(
            change_letter(&table, free, DriveLetter::new('Q')).unwrap_err(),
            AllocError::NotAllocated
        );
        assert_eq!(
            change_letter(&table, ExtentId::from_raw(404), None).unwrap_err(),
            AllocError::ExtentNotFound
        );
    }
}
