//! The GDS array storage engine.
//!
//! Re-exports the array types at the root, with the supporting crates available as modules.

pub use gds_array::*;
pub use {gds_array as array, gds_dtype as dtype, gds_error as error, gds_io as io};
