// Common types for allocation operations

use crate::disk::partition::ExtentId;
use crate::disk::table::ExtentTable;

/// Result of an accepted operation.
#[derive(Clone, Debug)]
pub struct Transition {
    /// The next table for the disk.
    pub table: ExtentTable,
    /// Extent the selection should move to. `None` leaves it alone.
    pub focus: Option<ExtentId>,
}

impl Transition {
    pub(crate) fn new(table: ExtentTable, focus: Option<ExtentId>) -> Self {
        Self { table, focus }
    }
}
