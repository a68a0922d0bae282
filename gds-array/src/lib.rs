//! N-dimensional arrays of fixed-width numbers stored in a byte stream.
//!
//! [`AbstractArray`] is the object-safe interface every array offers: shape introspection,
//! rectangular and selected region I/O in any memory type, appends along the first axis, and
//! element cursors. [`Array`] implements it for one storage type over an [`AllocArray`], and
//! [`ArrayRead`] streams an array slice by slice along one axis.

pub use abstract_array::*;
pub use alloc_array::*;
pub use array::*;
pub use dim::*;
pub use iterator::*;
pub use margin::*;
pub use metadata::*;
pub use options::*;
pub use selection::*;

mod abstract_array;
mod alloc_array;
pub mod alloc_func;
mod array;
mod dim;
mod iterator;
mod margin;
mod metadata;
mod options;
pub mod rect;
mod selection;
