//! File format handlers
//!
//! `bwx` decodes the ShiningLore BWX container (`.BNX` / `.PNX`) into raw
//! records; see [`crate::scene`] for the linked model built from them.

pub mod bwx;

pub use bwx::{Dialect, RawContainer, decode, decode_with_options, read_bwx};
