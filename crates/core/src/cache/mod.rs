//! Cache-state reconstruction from a Memory Timestamp Record, and the
//! binary/pretty serializers that match an RTL test harness's load format.

/// Cache geometry, the reconstructed image, and coherency states.
pub mod params;
/// The Memory Timestamp Record and LRU reconstruction.
pub mod mtr;
/// Tag-array/data-array binary and pretty dumps, and their inverse parsers.
pub mod serialize;

pub use mtr::{Mtr, MtrEntry};
pub use params::{CacheBlock, CacheImage, CacheParams, CohStatus};
