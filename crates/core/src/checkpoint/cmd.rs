//! Command descriptors for driving a functional simulator's debug mode to
//! dump architectural state at chosen instruction commit points.

use std::path::{Path, PathBuf};

use crate::common::error::TidalSimError;
use crate::common::util::inst_points_to_inst_steps;

/// An ordered list of simulator-debug commands plus the number of stdout
/// lines executing them is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CmdBlock {
    /// The commands to issue, in order.
    pub lines: Vec<String>,
    /// The number of stdout lines these commands will print.
    pub expected_lines: usize,
}

impl CmdBlock {
    /// Concatenates `self` and `other`: lines in order, expected line
    /// counts summed.
    #[must_use]
    pub fn then(mut self, other: CmdBlock) -> CmdBlock {
        self.lines.extend(other.lines);
        self.expected_lines += other.expected_lines;
        self
    }
}

/// Concatenates a sequence of [`CmdBlock`]s in order.
#[must_use]
pub fn combine_cmd_blocks(blocks: impl IntoIterator<Item = CmdBlock>) -> CmdBlock {
    blocks.into_iter().fold(CmdBlock::default(), CmdBlock::then)
}

const SPECIAL_REGS: &[&str] = &[
    "fcsr", "vstart", "vxsat", "vxrm", "vcsr", "vtype", "stvec", "sscratch", "sepc", "scause",
    "stval", "satp", "mstatus", "medeleg", "mideleg", "mie", "mtvec", "mscratch", "mepc", "mcause",
    "mtval", "mip", "mcycle", "minstret",
];

/// All register-dump commands for hart `h`: pc/priv/special CSRs, then 32
/// floating-point registers, 32 integer registers, and one vector register
/// dump. Exactly `(24 + 2 + 2) + 32 + 32 + 33` stdout lines are expected:
/// `pc`, `priv`, the 24 special CSRs above, `mtime`, `mtimecmp` (28 lines),
/// then 32 + 32 + 33.
#[must_use]
pub fn reg_dump(h: u32) -> CmdBlock {
    let mut lines = vec![format!("pc {h}"), format!("priv {h}")];
    lines.extend(SPECIAL_REGS.iter().map(|r| format!("reg {h} {r}")));
    lines.push("mtime".to_string());
    lines.push(format!("mtimecmp {h}"));
    let special_count = lines.len();

    lines.extend((0..32).map(|fr| format!("freg {h} {fr}")));
    lines.extend((0..32).map(|xr| format!("reg {h} {xr}")));
    lines.push(format!("vreg {h}"));

    CmdBlock {
        lines,
        expected_lines: special_count + 32 + 32 + 33,
    }
}

/// A whole architectural-state dump for `n_harts` harts: one memory-dump
/// command (0 expected lines) followed by a register dump for each hart.
/// `mem_dump_dir`, when given, is passed as the dump command's path
/// argument; otherwise the simulator dumps into its own working directory.
#[must_use]
pub fn arch_state_dump(n_harts: u32, mem_dump_dir: Option<&Path>) -> CmdBlock {
    let dump_cmd = match mem_dump_dir {
        Some(dir) => format!("dump {}", dir.display()),
        None => "dump".to_string(),
    };
    let mem_dump = CmdBlock {
        lines: vec![dump_cmd],
        expected_lines: 0,
    };
    combine_cmd_blocks(std::iter::once(mem_dump).chain((0..n_harts).map(reg_dump)))
}

/// The per-checkpoint directory `base_dir/"0x<start_pc>.<inst_point>"`.
#[must_use]
pub fn checkpoint_dir(base_dir: &Path, start_pc: u64, inst_point: u64) -> PathBuf {
    base_dir.join(format!("{start_pc:#x}.{inst_point}"))
}

/// The full multi-checkpoint command plan for `inst_points` (absolute,
/// strictly increasing instruction commit points), starting from
/// `start_pc`: wait for `start_pc`, then for each point advance by its
/// step and dump arch state into its checkpoint directory, then quit.
///
/// # Errors
///
/// Returns [`TidalSimError::InvariantViolation`] if `inst_points` is not
/// strictly increasing.
pub fn inst_points_dump(
    start_pc: u64,
    inst_points: &[u64],
    n_harts: u32,
    base_dir: &Path,
) -> Result<CmdBlock, TidalSimError> {
    let steps = inst_points_to_inst_steps(inst_points)?;
    let wait_for_pc = CmdBlock {
        lines: vec![format!("until pc 0 {start_pc:#x}")],
        expected_lines: 0,
    };

    let per_interval = inst_points.iter().zip(steps).map(|(&inst_num, step)| {
        let run_n_insts = CmdBlock {
            lines: vec![format!("rs {step}")],
            expected_lines: 1,
        };
        let dump = arch_state_dump(n_harts, Some(&checkpoint_dir(base_dir, start_pc, inst_num)));
        run_n_insts.then(dump)
    });

    let quit = CmdBlock {
        lines: vec!["quit".to_string()],
        expected_lines: 0,
    };

    Ok(combine_cmd_blocks(
        std::iter::once(wait_for_pc).chain(per_interval).chain(std::iter::once(quit)),
    ))
}

/// The ordered list of checkpoint directories for `inst_points`.
#[must_use]
pub fn checkpoint_dirs(base_dir: &Path, start_pc: u64, inst_points: &[u64]) -> Vec<PathBuf> {
    inst_points
        .iter()
        .map(|&p| checkpoint_dir(base_dir, start_pc, p))
        .collect()
}
