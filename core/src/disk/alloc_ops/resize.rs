// Shrink and extend volumes

use log::debug;

use super::utils::locate_allocated;
use super::Transition;
use crate::disk::partition::{Extent, ExtentId, ExtentIds};
use crate::disk::table::{coalesce, ExtentTable};
use crate::error::{AllocError, Result};

/// Give `amount_mb` from the end of a volume back as unallocated space.
///
/// The volume must keep at least 1 MB; shrinking to zero is refused rather
/// than turned into a delete.
pub fn shrink_partition(
    table: &ExtentTable,
    target: ExtentId,
    amount_mb: u64,
    ids: &ExtentIds,
) -> Result<Transition> {
    let (index, volume) = locate_allocated(table, target)?;

    if amount_mb == 0 || amount_mb >= volume.size_mb {
        return Err(AllocError::InvalidSize);
    }

    let mut extents = table.to_vec();
    extents[index].size_mb -= amount_mb;
    extents.insert(index + 1, Extent::free(ids.next(), amount_mb));
    // The freed tail may now touch existing unallocated space
    let extents = coalesce(extents);

    debug!(
        "shrink_partition: volume {} by {} MB to {} MB",
        target,
        amount_mb,
        extents[index].size_mb
    );
    Ok(Transition::new(
        ExtentTable::from_extents(extents),
        Some(target),
    ))
}

/// Grow a volume into the unallocated extent directly after it.
///
/// Only the immediate neighbour is considered. If it is fully consumed it
/// disappears from the table.
pub fn extend_partition(
    table: &ExtentTable,
    target: ExtentId,
    amount_mb: u64,
) -> Result<Transition> {
    let (index, _) = locate_allocated(table, target)?;

    if amount_mb == 0 {
        return Err(AllocError::InvalidSize);
    }

    let next = table
        .get(index + 1)
        .filter(|e| e.is_free())
        .ok_or(AllocError::NoAdjacentFreeSpace)?;
    if next.size_mb < amount_mb {
        return Err(AllocError::InsufficientSpace);
    }
    let remaining = next.size_mb - amount_mb;

    let mut extents = table.to_vec();
    extents[index].size_mb += amount_mb;
    if remaining < 1 {
        extents.remove(index + 1);
    } else {
        extents[index + 1].size_mb = remaining;
    }

    debug!(
        "extend_partition: volume {} by {} MB, {} MB unallocated left after it",
        target, amount_mb, remaining
    );
    Ok(Transition::new(
        ExtentTable::from_extents(extents),
        Some(target),
    ))
}
