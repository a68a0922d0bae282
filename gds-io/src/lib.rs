//! Positioned byte streams and the [`Allocator`] cursor that arrays store their elements through.
//!
//! Streams range from plain memory and files to adapters that window, buffer, or gate another
//! stream. The allocator binds one stream and exposes little-endian value I/O over it.

pub use allocator::*;
pub use lock::*;
pub use stream::*;

mod allocator;
mod lock;
mod stream;
