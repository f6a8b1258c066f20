// GPT (GUID Partition Table) view of an extent table
//
// Nothing is written anywhere: this only shows which partition entries a
// real disk with this layout would carry.

use gpt_disk_types::{BlockSize, GptPartitionEntry, GptPartitionName, GptPartitionType, Guid, LbaLe};

use super::alloc_ops::mb_to_lba;
use super::partition::{Extent, ExtentId};
use super::table::ExtentTable;

/// Partition type for a volume. Boot volumes become EFI system partitions,
/// everything else follows its filesystem.
pub fn partition_type(extent: &Extent) -> GptPartitionType {
    if extent.is_boot {
        GptPartitionType::EFI_SYSTEM
    } else {
        extent.filesystem.gpt_type()
    }
}

/// Stable per-extent GUID derived from the extent id.
pub fn unique_guid(id: ExtentId) -> Guid {
    let mut bytes = [0u8; 16];
    bytes[8..].copy_from_slice(&id.get().to_be_bytes());
    // Keep it recognisable as a variant-1 GUID
    bytes[7] = 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Guid::from_bytes(bytes)
}

/// One GPT entry per volume, in disk order.
///
/// LBA ranges are relative to the start of the simulated address space.
/// Unallocated extents produce no entry.
pub fn partition_entries(table: &ExtentTable, block_size: BlockSize) -> Vec<GptPartitionEntry> {
    let block = block_size.to_u64();

    table
        .layout()
        .filter(|(_, extent)| extent.is_allocated())
        .map(|(start_mb, extent)| {
            let first = mb_to_lba(start_mb, block);
            let last = first + mb_to_lba(extent.size_mb, block) - 1;

            let mut entry = GptPartitionEntry::default();
            entry.partition_type_guid = partition_type(extent);
            entry.unique_partition_guid = unique_guid(extent.id);
            entry.starting_lba = LbaLe::from_u64(first);
            entry.ending_lba = LbaLe::from_u64(last);
            // Labels longer than the GPT name field keep the default (empty) name
            if let Ok(name) = extent.label.parse::<GptPartitionName>() {
                entry.name = name;
            }
            entry
        })
        .collect()
}
