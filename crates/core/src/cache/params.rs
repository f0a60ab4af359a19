//! Cache geometry and the reconstructed cache image.

use serde::{Deserialize, Serialize};

use crate::common::error::TidalSimError;
use crate::common::util::clog2;

/// Coherency state of a cache block, matching `ClientMetadata`/`ClientStates`
/// in rocket-chip-style directory protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CohStatus {
    /// Block is invalid / not present.
    Nothing = 0,
    /// Block is held read-only, shared with other agents.
    Branch = 1,
    /// Block is held read-only, exclusively.
    Trunk = 2,
    /// Block is held read-write and modified.
    Dirty = 3,
}

impl CohStatus {
    /// Numeric encoding used in the tag-array bit layout.
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Display name used in the pretty-printed dumps.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CohStatus::Nothing => "Nothing",
            CohStatus::Branch => "Branch",
            CohStatus::Trunk => "Trunk",
            CohStatus::Dirty => "Dirty",
        }
    }
}

/// A single way/set entry in a [`CacheImage`].
///
/// `data` is `block_size_bytes` long and little-endian (`data[0]` is the
/// least-significant byte), which keeps block sizes unbounded by a native
/// integer width — a 64-byte line does not fit in a `u128`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBlock {
    /// The block's raw bytes, little-endian, `block_size_bytes` long.
    pub data: Vec<u8>,
    /// The tag bits for this block.
    pub tag: u64,
    /// The block's coherency state.
    pub coherency: CohStatus,
}

impl CacheBlock {
    /// A zeroed, `Nothing`-coherency block of `block_size_bytes` bytes.
    #[must_use]
    pub fn zero(block_size_bytes: u64) -> Self {
        Self {
            data: vec![0u8; block_size_bytes as usize],
            tag: 0,
            coherency: CohStatus::Nothing,
        }
    }
}

/// Derived cache geometry from a physical address width, block size, set
/// count, way count, and data bus width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheParams {
    /// Physical address width in bits.
    pub phys_addr_bits: u32,
    /// Cache block (line) size in bytes; must be a power of two.
    pub block_size_bytes: u64,
    /// Number of sets; must be a power of two.
    pub n_sets: u64,
    /// Associativity (ways per set).
    pub n_ways: usize,
    /// Width of the data bus feeding each way's data array, in bytes; must
    /// divide `block_size_bytes`.
    pub data_bus_bytes: u64,
    /// `log2(block_size_bytes)`.
    pub offset_bits: u32,
    /// `log2(n_sets)`.
    pub set_bits: u32,
    /// `phys_addr_bits - set_bits - offset_bits`.
    pub tag_bits: u32,
    /// Always 2: enough to encode [`CohStatus`].
    pub coherency_bits: u32,
    /// `block_size_bytes / data_bus_bytes`.
    pub rows_per_set: u64,
    /// `(1 << tag_bits) - 1`.
    pub tag_mask: u64,
}

impl CacheParams {
    /// Builds a [`CacheParams`] from the geometry, deriving the remaining
    /// fields.
    ///
    /// `data_bus_bytes` defaults to 8 (the common Rocket-chip configuration)
    /// when constructed via [`CacheParams::new`]; use the struct literal
    /// directly to override it.
    ///
    /// # Errors
    ///
    /// Returns [`TidalSimError::InvariantViolation`] if `block_size_bytes`
    /// or `n_sets` is zero.
    pub fn new(phys_addr_bits: u32, block_size_bytes: u64, n_sets: u64, n_ways: usize) -> Result<Self, TidalSimError> {
        Self::with_data_bus(phys_addr_bits, block_size_bytes, n_sets, n_ways, 8)
    }

    /// Builds a [`CacheParams`] with an explicit data bus width.
    ///
    /// # Errors
    ///
    /// Returns [`TidalSimError::InvariantViolation`] if `block_size_bytes`
    /// or `n_sets` is zero.
    pub fn with_data_bus(
        phys_addr_bits: u32,
        block_size_bytes: u64,
        n_sets: u64,
        n_ways: usize,
        data_bus_bytes: u64,
    ) -> Result<Self, TidalSimError> {
        let offset_bits = clog2(block_size_bytes)?;
        let set_bits = clog2(n_sets)?;
        let tag_bits = phys_addr_bits - set_bits - offset_bits;
        Ok(Self {
            phys_addr_bits,
            block_size_bytes,
            n_sets,
            n_ways,
            data_bus_bytes,
            offset_bits,
            set_bits,
            tag_bits,
            coherency_bits: 2,
            rows_per_set: block_size_bytes / data_bus_bytes,
            tag_mask: (1u64 << tag_bits) - 1,
        })
    }

    /// The set index a block address maps to.
    #[must_use]
    pub fn set_index(&self, block_addr: u64) -> usize {
        (block_addr & ((1 << self.set_bits) - 1)) as usize
    }

    /// The tag bits for a block address.
    #[must_use]
    pub fn tag_of(&self, block_addr: u64) -> u64 {
        (block_addr >> self.set_bits) & self.tag_mask
    }
}

/// A reconstructed cache state: `array[way][set]`, initialized to
/// `{data: 0, tag: 0, coherency: Nothing}`.
#[derive(Debug, Clone)]
pub struct CacheImage {
    /// The cache geometry this image was built for.
    pub params: CacheParams,
    /// `array[way][set]`.
    pub array: Vec<Vec<CacheBlock>>,
}

impl CacheImage {
    /// Allocates an all-zero cache image for `params`.
    #[must_use]
    pub fn new(params: CacheParams) -> Self {
        let row: Vec<CacheBlock> = (0..params.n_sets)
            .map(|_| CacheBlock::zero(params.block_size_bytes))
            .collect();
        let array = vec![row; params.n_ways];
        Self { params, array }
    }

    /// The block at `(way, set)`.
    #[must_use]
    pub fn block(&self, way: usize, set: usize) -> &CacheBlock {
        &self.array[way][set]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_geometry_fields() {
        // 32-bit phys addr, 64B blocks, 4 sets, 2 ways, 8B bus.
        let p = CacheParams::new(32, 64, 4, 2).expect("valid geometry");
        assert_eq!(p.offset_bits, 6);
        assert_eq!(p.set_bits, 2);
        assert_eq!(p.tag_bits, 24);
        assert_eq!(p.rows_per_set, 8);
        assert_eq!(p.coherency_bits, 2);
        assert_eq!(p.tag_mask, (1 << 24) - 1);
    }

    #[test]
    fn new_image_is_all_zero() {
        let params = CacheParams::new(32, 64, 4, 2).expect("valid geometry");
        let image = CacheImage::new(params);
        assert_eq!(image.array.len(), 2);
        assert_eq!(image.array[0].len(), 4);
        assert_eq!(image.block(0, 0), &CacheBlock::zero(64));
    }

    #[test]
    fn new_rejects_zero_block_size() {
        assert!(matches!(
            CacheParams::new(32, 0, 4, 2),
            Err(TidalSimError::InvariantViolation { .. })
        ));
    }
}
