// Lookup and size helpers shared by the allocation operations

use crate::disk::partition::{Extent, ExtentId};
use crate::disk::table::ExtentTable;
use crate::error::{AllocError, Result};

const MB_PER_GB: u64 = 1024;
const MB_PER_TB: u64 = 1024 * 1024;

/// Find an extent and its index.
pub(crate) fn locate(table: &ExtentTable, id: ExtentId) -> Result<(usize, &Extent)> {
    let index = table.position(id).ok_or(AllocError::ExtentNotFound)?;
    let extent = table.get(index).ok_or(AllocError::ExtentNotFound)?;
    Ok((index, extent))
}

/// Find an extent that must be a volume.
pub(crate) fn locate_allocated(table: &ExtentTable, id: ExtentId) -> Result<(usize, &Extent)> {
    let (index, extent) = locate(table, id)?;
    if !extent.is_allocated() {
        return Err(AllocError::NotAllocated);
    }
    Ok((index, extent))
}

/// Calculate size in LBA from MB
pub fn mb_to_lba(size_mb: u64, block_size_bytes: u64) -> u64 {
    (size_mb * 1024 * 1024) / block_size_bytes
}

/// Human-readable size: `N MB`, `X.XX GB` or `X.XX TB`.
pub fn format_size(mb: u64) -> String {
    if mb >= MB_PER_TB {
        format!("{:.2} TB", mb as f64 / MB_PER_TB as f64)
    } else if mb >= MB_PER_GB {
        format!("{:.2} GB", mb as f64 / MB_PER_GB as f64)
    } else {
        format!("{} MB", mb)
    }
}

/// Parse user input such as `500`, `1.5 GB` or `2tb` into whole MB.
///
/// Fractions of a MB are truncated. Returns `None` for empty, negative or
/// non-numeric input.
pub fn parse_size_mb(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);

    let scale = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "m" | "mb" => 1,
        "g" | "gb" => MB_PER_GB,
        "t" | "tb" => MB_PER_TB,
        _ => return None,
    };

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value * scale as f64).trunc() as u64)
}
