//! Memory Timestamp Record (MTR): per-block last-access recency, and LRU
//! cache-image reconstruction from it.
//!
//! See: <http://scale.eecs.berkeley.edu/papers/mtr-ispass05-slides.pdf>

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use serde::{Deserialize, Serialize};

use crate::cache::params::{CacheBlock, CacheImage, CacheParams, CohStatus};
use crate::common::error::TidalSimError;
use crate::common::util::{clog2, inst_points_to_inst_steps};
use crate::trace::{CommitInfo, Op, TraceEntry};

/// Last-read/last-write timestamps for one cache block.
///
/// At least one of the two is `Some` for every entry the table holds: an
/// entry is only created by [`Mtr::update`], which always sets one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtrEntry {
    /// Instruction count at the most recent load touching this block.
    pub last_read_ts: Option<u64>,
    /// Instruction count at the most recent store touching this block.
    pub last_write_ts: Option<u64>,
}

impl MtrEntry {
    fn last_touched(&self) -> u64 {
        self.last_read_ts
            .unwrap_or(0)
            .max(self.last_write_ts.unwrap_or(0))
    }
}

/// Memory Timestamp Record: tracks the last access time of every cache
/// block touched by a trace, keyed by `byte_addr >> log2(block_size_bytes)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mtr {
    /// Cache block size this MTR was built for.
    pub block_size_bytes: u64,
    /// `block_addr -> MtrEntry`.
    pub table: HashMap<u64, MtrEntry>,
}

impl Mtr {
    /// Creates an empty MTR for the given block size.
    #[must_use]
    pub fn new(block_size_bytes: u64) -> Self {
        Self {
            block_size_bytes,
            table: HashMap::new(),
        }
    }

    fn block_addr(&self, byte_addr: u64) -> Result<u64, TidalSimError> {
        Ok(byte_addr >> clog2(self.block_size_bytes)?)
    }

    /// Records a memory commit at `timestamp` (the instruction count at
    /// which it committed).
    ///
    /// # Errors
    ///
    /// Returns [`TidalSimError::InvariantViolation`] if this MTR's block
    /// size is zero.
    pub fn update(&mut self, commit: CommitInfo, timestamp: u64) -> Result<(), TidalSimError> {
        let block = self.block_addr(commit.address)?;
        let entry = self.table.entry(block).or_insert(MtrEntry {
            last_read_ts: None,
            last_write_ts: None,
        });
        match commit.op {
            Op::Load => entry.last_read_ts = Some(timestamp),
            Op::Store => entry.last_write_ts = Some(timestamp),
        }
        Ok(())
    }

    /// Reconstructs the approximate LRU cache state for `params` (whose
    /// block size must match this MTR's), optionally populating data bytes
    /// from a DRAM image.
    ///
    /// Within each set, the `params.n_ways` most-recently-touched blocks
    /// (by `max(last_read_ts, last_write_ts)`, ties broken by ascending
    /// block address) are resident, each marked [`CohStatus::Dirty`]. Every
    /// other position in the image is left `{data: 0, tag: 0, Nothing}`.
    ///
    /// # Errors
    ///
    /// Returns [`TidalSimError::Io`] if reading from `dram` fails.
    pub fn as_cache<R: Read + Seek>(
        &self,
        params: &CacheParams,
        dram: Option<&mut R>,
        dram_base: u64,
    ) -> Result<CacheImage, TidalSimError> {
        assert_eq!(
            params.block_size_bytes, self.block_size_bytes,
            "CacheParams block size must match this MTR's block size"
        );

        let mut cache = CacheImage::new(*params);

        let mut by_set: HashMap<usize, Vec<(u64, MtrEntry)>> = HashMap::new();
        for (&block_addr, &entry) in &self.table {
            by_set
                .entry(params.set_index(block_addr))
                .or_default()
                .push((block_addr, entry));
        }

        let mut dram = dram;
        for (set_idx, mut entries) in by_set {
            entries.sort_by(|(addr_a, entry_a), (addr_b, entry_b)| {
                entry_b
                    .last_touched()
                    .cmp(&entry_a.last_touched())
                    .then(addr_a.cmp(addr_b))
            });

            for (way_idx, (block_addr, _)) in entries.into_iter().take(params.n_ways).enumerate() {
                let tag = params.tag_of(block_addr);
                let byte_addr = block_addr << params.offset_bits;
                let data = match dram.as_deref_mut() {
                    Some(r) => read_block(r, byte_addr, dram_base, params.block_size_bytes)?,
                    None => vec![0u8; params.block_size_bytes as usize],
                };
                cache.array[way_idx][set_idx] = CacheBlock {
                    data,
                    tag,
                    coherency: CohStatus::Dirty,
                };
            }
        }

        Ok(cache)
    }
}

fn read_block<R: Read + Seek>(
    dram: &mut R,
    byte_addr: u64,
    dram_base: u64,
    block_size_bytes: u64,
) -> Result<Vec<u8>, TidalSimError> {
    let offset = byte_addr - dram_base;
    let _ = dram.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; block_size_bytes as usize];
    dram.read_exact(&mut buf)?;
    Ok(buf)
}

/// Deep-copies `initial`, then consumes `insts_to_consume` entries from
/// `trace`, applying every commit it carries at that entry's `inst_count`.
/// The returned MTR does not alias `initial`: later snapshots built this
/// way never mutate earlier ones.
///
/// # Errors
///
/// Propagates any parse error from `trace`.
pub fn mtr_ckpts_from_spike_log<I>(
    trace: &mut I,
    initial: &Mtr,
    insts_to_consume: u64,
) -> Result<Mtr, TidalSimError>
where
    I: Iterator<Item = Result<TraceEntry, TidalSimError>>,
{
    let mut next = initial.clone();
    for _ in 0..insts_to_consume {
        let Some(entry) = trace.next() else {
            break;
        };
        let entry = entry?;
        if let Some(commit) = entry.commit {
            next.update(commit, entry.inst_count)?;
        }
    }
    Ok(next)
}

/// Builds one MTR snapshot per instruction point in `inst_points`, starting
/// from an empty MTR and advancing by the step sequence between points.
/// Snapshots are independent: mutating one does not affect another.
///
/// # Errors
///
/// Propagates any parse error from `trace`.
pub fn mtr_ckpts_from_inst_points<I>(
    trace: &mut I,
    block_size_bytes: u64,
    inst_points: &[u64],
) -> Result<Vec<Mtr>, TidalSimError>
where
    I: Iterator<Item = Result<TraceEntry, TidalSimError>>,
{
    let steps = inst_points_to_inst_steps(inst_points)?;
    let mut snapshots = Vec::with_capacity(inst_points.len());
    let mut current = Mtr::new(block_size_bytes);
    for step in steps {
        current = mtr_ckpts_from_spike_log(trace, &current, step)?;
        snapshots.push(current.clone());
    }
    Ok(snapshots)
}
