#![cfg(target_endian = "little")]
#![deny(missing_docs)]

//! Value types for the GDS array storage engine.
//!
//! This crate names every value representation an array can store or a caller can request
//! ([`SVType`]), provides the Rust types behind the memory representations ([`Element`],
//! [`NativeType`]), and implements the conversion matrix between all of them ([`CastFrom`]).

pub use buffer::*;
pub use convert::*;
pub use element::*;
pub use string::*;
pub use sv_type::*;

mod buffer;
pub mod convert;
mod element;
mod string;
mod sv_type;
