//! RV64 control-transfer instruction classification.
//!
//! The basic-block extractor needs to know which mnemonics end a basic
//! block. This table covers RV64I/RV64C branches and jumps, the standard
//! privileged/system instructions, and the pseudo-instructions spike's
//! disassembler emits for them (`j`, `ret`, `call`, `beqz`, ...).
//!
//! See: <https://github.com/riscv-non-isa/riscv-asm-manual/blob/master/riscv-asm.md#pseudoinstructions>

use std::collections::HashSet;
use std::sync::LazyLock;

const BRANCHES: &[&str] = &[
    // RV64I branches
    "beq", "bge", "bgeu", "blt", "bltu", "bne",
    // RV64C branches
    "c.beqz", "c.bnez",
    // Pseudo-instructions
    "beqz", "bnez", "blez", "bgez", "bltz", "bgtz", "bgt", "ble", "bgtu", "bleu",
];

const JUMPS: &[&str] = &[
    "j", "jal", "jr", "jalr", "ret", "call", "c.j", "c.jal", "c.jr", "c.jalr", "tail",
];

const SYSCALLS: &[&str] = &["ecall", "ebreak", "mret", "sret", "uret"];

static CONTROL_INSTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    BRANCHES
        .iter()
        .chain(JUMPS)
        .chain(SYSCALLS)
        .copied()
        .collect()
});

/// True if `mnemonic` ends a basic block: a branch, jump, or system call per
/// RV64I/RV64C plus their pseudo-op forms.
#[must_use]
pub fn is_control_inst(mnemonic: &str) -> bool {
    CONTROL_INSTS.contains(mnemonic)
}

#[cfg(test)]
mod tests {
    use super::is_control_inst;

    #[test]
    fn recognizes_branches_jumps_and_syscalls() {
        assert!(is_control_inst("beq"));
        assert!(is_control_inst("c.bnez"));
        assert!(is_control_inst("jal"));
        assert!(is_control_inst("ret"));
        assert!(is_control_inst("ecall"));
    }

    #[test]
    fn rejects_non_control_mnemonics() {
        assert!(!is_control_inst("add"));
        assert!(!is_control_inst("c.addi"));
        assert!(!is_control_inst("lw"));
    }
}
