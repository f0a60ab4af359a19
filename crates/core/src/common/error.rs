//! Error kinds for the TidalSim pipeline.
//!
//! Every fallible operation in this crate returns [`TidalSimError`]. There is
//! no local recovery: a failure here always means the trace, cache
//! configuration, or checkpoint plan violates one of the invariants the
//! pipeline depends on, and the caller (the top-level driver) is expected to
//! report and exit rather than retry.

use thiserror::Error;

/// The error kinds produced by the TidalSim pipeline.
#[derive(Debug, Error)]
pub enum TidalSimError {
    /// The trace parser could not extract a PC/mnemonic pair (or, in
    /// full-commit mode, a matching commit line) from an instruction line.
    #[error("malformed trace log at line {line_no}: {text:?}")]
    MalformedLog {
        /// 1-based line number in the input stream.
        line_no: usize,
        /// The raw line text that failed to parse.
        text: String,
    },

    /// A PC break of more than 4 bytes was observed without the preceding
    /// instruction being a control-transfer instruction.
    #[error(
        "control diverged from pc {from:#x} ({from_mnemonic}) to pc {to:#x} without a control instruction"
    )]
    UnexpectedControlTransfer {
        /// PC of the instruction immediately before the break.
        from: u64,
        /// Mnemonic of the instruction immediately before the break.
        from_mnemonic: String,
        /// PC of the instruction immediately after the break.
        to: u64,
    },

    /// A PC encountered while embedding a trace has no basic-block id in the
    /// [`crate::bb::BasicBlockMap`] being used, meaning the map was not built
    /// from this exact trace.
    #[error("pc {pc:#x} has no basic-block id in this BasicBlockMap")]
    UnmappedPc {
        /// The PC that failed to resolve to a basic-block id.
        pc: u64,
    },

    /// A structural invariant of the cache serializer or checkpoint splitter
    /// was violated (e.g. a line-count mismatch between a predicted and an
    /// observed log).
    #[error("invariant violation: {context}: expected {expected}, got {actual}")]
    InvariantViolation {
        /// Human-readable description of which invariant failed.
        context: String,
        /// The expected count.
        expected: usize,
        /// The count actually observed.
        actual: usize,
    },

    /// An external tool (functional simulator, binary utility) invoked by a
    /// caller of this crate exited with a non-zero status. This crate never
    /// spawns processes itself; this variant exists so hosts that do can
    /// surface the failure through the same error type.
    #[error("external tool failed (status {status:?}): {command}")]
    ExternalToolFailure {
        /// The command line that was run.
        command: String,
        /// The process exit status, if one was observed.
        status: Option<i32>,
        /// Captured stderr output.
        stderr: String,
    },

    /// An I/O error while reading a trace, DRAM image, or writing checkpoint
    /// artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A checkpoint or cache-image (de)serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
