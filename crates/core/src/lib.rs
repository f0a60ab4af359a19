//! TidalSim sampled-simulation core.
//!
//! This crate implements the deterministic, single-threaded analysis pipeline
//! that sits between a functional RISC-V instruction trace and a cycle-accurate
//! RTL simulation run:
//! 1. **Trace parsing:** decode a functional simulator's textual instruction
//!    (and optional commit) log into a lazy stream of [`trace::TraceEntry`].
//! 2. **Basic-block extraction:** build a [`bb::BasicBlockMap`] mapping PCs to
//!    stable basic-block ids from a single pass over the trace.
//! 3. **Interval embedding:** chunk the trace into fixed-length intervals and
//!    embed each as an L2-normalized basic-block-frequency vector.
//! 4. **Memory Timestamp Record (MTR):** track per-cache-block last-access
//!    recency and reconstruct an approximate LRU cache image from it.
//! 5. **Cache-state serialization:** emit tag/data array dumps in the bit
//!    layout an external RTL harness expects.
//! 6. **Checkpoint scheduling:** describe the debug commands that make a
//!    functional simulator dump architectural state at chosen instruction
//!    commit points, and split its combined output log per checkpoint.
//!
//! Everything outside this pipeline — the functional and RTL simulators
//! themselves, clustering, ELF scraping, and process spawning — is an
//! external collaborator; this crate only defines the data and the command
//! descriptors.

/// Error types and shared RV64 instruction classification tables.
pub mod common;
/// Trace parsing: functional-simulator log lines to [`trace::TraceEntry`].
pub mod trace;
/// Basic-block extraction and the PC-to-block-id marker map.
pub mod bb;
/// Fixed-length interval embedding into basic-block-frequency vectors.
pub mod embed;
/// Memory Timestamp Record, cache-image reconstruction, and serialization.
pub mod cache;
/// Checkpoint command scheduling and combined-log splitting.
pub mod checkpoint;

pub use common::error::TidalSimError;
pub use trace::TraceEntry;
pub use bb::BasicBlockMap;
pub use embed::Interval;
pub use cache::mtr::Mtr;
pub use cache::params::{CacheBlock, CacheImage, CacheParams, CohStatus};
pub use checkpoint::CmdBlock;
