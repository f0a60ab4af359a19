//! Chunking and embedding a trace against a [`BasicBlockMap`].

use crate::bb::BasicBlockMap;
use crate::common::error::TidalSimError;
use crate::embed::Interval;
use crate::trace::TraceEntry;

/// Lazily chunks `trace` into groups of `interval_length` and embeds each as
/// an [`Interval`]. Lookahead into `trace` is bounded by `interval_length`:
/// at most one chunk's worth of entries is buffered at a time.
pub struct IntervalEmbedder<'a, I> {
    trace: I,
    bb_map: &'a BasicBlockMap,
    interval_length: usize,
    inst_start: u64,
    failed: bool,
}

impl<'a, I> Iterator for IntervalEmbedder<'a, I>
where
    I: Iterator<Item = Result<TraceEntry, TidalSimError>>,
{
    type Item = Result<Interval, TidalSimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut counts = vec![0.0_f64; self.bb_map.len()];
        let mut instret: u64 = 0;
        let mut saw_any = false;

        for _ in 0..self.interval_length {
            match self.trace.next() {
                None => break,
                Some(Err(e)) => {
                    self.failed = true;
                    return Some(Err(e));
                }
                Some(Ok(entry)) => {
                    saw_any = true;
                    match self.bb_map.lookup(entry.pc) {
                        Some(id) => {
                            counts[id as usize] += 1.0;
                            instret += 1;
                        }
                        None => {
                            self.failed = true;
                            return Some(Err(TidalSimError::UnmappedPc { pc: entry.pc }));
                        }
                    }
                }
            }
        }

        if !saw_any {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let instret_f = instret as f64;
        for c in &mut counts {
            *c /= instret_f;
        }
        let norm = counts.iter().map(|c| c * c).sum::<f64>().sqrt();
        if norm > 0.0 {
            for c in &mut counts {
                *c /= norm;
            }
        }

        let inst_start = self.inst_start;
        let inst_count = inst_start + instret;
        self.inst_start = inst_count;

        Some(Ok(Interval {
            instret,
            inst_start,
            inst_count,
            embedding: counts,
        }))
    }
}

/// Builds an [`IntervalEmbedder`] over `trace` against `bb_map`.
///
/// # Errors
///
/// Returns [`TidalSimError::InvariantViolation`] if `interval_length < 2`.
pub fn embed<'a, I>(
    trace: I,
    bb_map: &'a BasicBlockMap,
    interval_length: usize,
) -> Result<IntervalEmbedder<'a, I::IntoIter>, TidalSimError>
where
    I: IntoIterator<Item = Result<TraceEntry, TidalSimError>>,
{
    if interval_length < 2 {
        return Err(TidalSimError::InvariantViolation {
            context: "interval_length must be >= 2".to_string(),
            expected: 2,
            actual: interval_length,
        });
    }
    Ok(IntervalEmbedder {
        trace: trace.into_iter(),
        bb_map,
        interval_length,
        inst_start: 0,
        failed: false,
    })
}
