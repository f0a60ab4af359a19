//! Single-pass basic-block extraction.
//!
//! Walks a trace once, recording the start of a basic block and closing it
//! when a control-transfer instruction is seen (inclusive of that
//! instruction), then hands the raw intervals to [`crate::bb::markers`] for
//! the sweep that produces a [`crate::bb::BasicBlockMap`].

use crate::bb::markers::{intervals_to_markers, BasicBlockMap, RawInterval};
use crate::common::error::TidalSimError;
use crate::trace::TraceEntry;

/// Extracts a [`BasicBlockMap`] from a trace.
///
/// Fails with [`TidalSimError::UnexpectedControlTransfer`] if a PC break of
/// more than 4 bytes is observed without the preceding instruction being a
/// control-transfer instruction — a sign of a corrupted log or an
/// unsupported ISA. Propagates any parse error from the underlying trace
/// iterator.
pub fn extract<I>(trace: I) -> Result<BasicBlockMap, TidalSimError>
where
    I: IntoIterator<Item = Result<TraceEntry, TidalSimError>>,
{
    let mut start: Option<u64> = None;
    let mut prev: Option<TraceEntry> = None;
    let mut intervals: Vec<RawInterval> = Vec::new();

    for entry in trace {
        let entry = entry?;

        if start.is_none() {
            start = Some(entry.pc);
        }

        if entry.is_control_inst() {
            let lo = start.expect("start was just set above if unset");
            intervals.push((lo, entry.pc + 1));
            start = None;
        }

        if let Some(ref p) = prev {
            if entry.pc.abs_diff(p.pc) > 4 && !p.is_control_inst() {
                return Err(TidalSimError::UnexpectedControlTransfer {
                    from: p.pc,
                    from_mnemonic: p.mnemonic.clone(),
                    to: entry.pc,
                });
            }
        }

        prev = Some(entry);
    }

    if let (Some(lo), Some(p)) = (start, &prev) {
        intervals.push((lo, p.pc + 1));
    }

    let markers = intervals_to_markers(&intervals);
    Ok(BasicBlockMap::from_markers(markers))
}
