//! Line-oriented trace grammar.
//!
//! Each retained instruction line has the form
//! `"core <H>: <PC-hex> (<INST-hex>) <mnemonic> <operands...>"`. In
//! full-commit-log mode every retained instruction line is immediately
//! followed by one companion line carrying its register/memory writeback;
//! see [`TraceParser`] for how that companion line is classified.

use crate::common::error::TidalSimError;
use crate::trace::{CommitInfo, Op, TraceEntry, DRAM_BASE};

/// Consumes a line iterator and yields [`TraceEntry`] lazily.
///
/// `full_commit_log` must match how the trace was collected: `true` when
/// every instruction line is followed by a commit line (`spike -l
/// --log-commits`), `false` for a plain instruction log (`spike -l`).
///
/// Once an item yields `Err`, the next call to `next()` returns `None`: a
/// malformed line ends the stream, and callers may not partially consume
/// past a failure.
pub struct TraceParser<I> {
    lines: I,
    full_commit_log: bool,
    inst_count: u64,
    line_no: usize,
    failed: bool,
}

impl<I> TraceParser<I>
where
    I: Iterator<Item = String>,
{
    /// Wraps a line iterator. `full_commit_log` selects the grammar: plain
    /// instruction log vs. instruction+commit pairs.
    pub fn new(lines: I, full_commit_log: bool) -> Self {
        Self {
            lines,
            full_commit_log,
            inst_count: 0,
            line_no: 0,
            failed: false,
        }
    }

    fn malformed(&mut self, text: &str) -> TidalSimError {
        self.failed = true;
        TidalSimError::MalformedLog {
            line_no: self.line_no,
            text: text.to_string(),
        }
    }

    fn next_line(&mut self) -> Option<String> {
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(line)
    }
}

impl<I> Iterator for TraceParser<I>
where
    I: Iterator<Item = String>,
{
    type Item = Result<TraceEntry, TidalSimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let line = self.next_line()?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 3 {
                return Some(Err(self.malformed(&line)));
            }
            if tokens[2].starts_with('>') {
                // Decorative spike-decoded label line; skip.
                continue;
            }
            let Some(pc) = parse_hex_token(tokens[2]) else {
                return Some(Err(self.malformed(&line)));
            };
            if tokens.len() < 5 {
                return Some(Err(self.malformed(&line)));
            }
            let mnemonic = tokens[4].to_string();

            if pc < DRAM_BASE {
                if self.full_commit_log && self.next_line().is_none() {
                    return Some(Err(self.malformed(&line)));
                }
                continue;
            }

            let commit = if self.full_commit_log {
                let Some(commit_line) = self.next_line() else {
                    return Some(Err(self.malformed(&line)));
                };
                parse_commit_line(&commit_line)
            } else {
                None
            };

            let entry = TraceEntry {
                pc,
                mnemonic,
                inst_count: self.inst_count,
                commit,
            };
            self.inst_count += 1;
            return Some(Ok(entry));
        }
    }
}

fn parse_hex_token(token: &str) -> Option<u64> {
    let digits = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

/// Classifies a companion commit line per the grammar in the component
/// design: an 8-token line with `"mem"` at position 5 is a store, a 9-token
/// line with `"mem"` at position 7 is a load, anything else carries no
/// commit info.
fn parse_commit_line(line: &str) -> Option<CommitInfo> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.len() {
        8 if tokens[5] == "mem" => {
            let address = parse_hex_token(tokens[6])?;
            let data = parse_hex_token(tokens[7])?;
            Some(CommitInfo {
                address,
                data,
                op: Op::Store,
            })
        }
        9 if tokens[7] == "mem" => {
            let address = parse_hex_token(tokens[8])?;
            let data = parse_hex_token(tokens[6])?;
            Some(CommitInfo {
                address,
                data,
                op: Op::Load,
            })
        }
        _ => None,
    }
}
