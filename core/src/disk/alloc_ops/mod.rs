//! Allocation engine.
//!
//! Pure functions from `(&ExtentTable, args)` to a [`Transition`]. Nothing
//! here touches registry state; a rejected call returns an error and the
//! input table stays as it was.

mod create_modify;
mod resize;
mod types;
mod utils;

pub use create_modify::*;
pub use resize::*;
pub use types::*;
pub use utils::*;
