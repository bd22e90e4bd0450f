//! SSA-form instructions.
//!
//! An [`SsaInstruction`] wraps a decomposed [`SsaOp`] together with the
//! source position it was lowered from, if any. Code motion relocates whole
//! instructions, so the position travels with the operation and diagnostics
//! keep pointing at the original source.

use std::fmt;

use crate::analysis::ssa::{OpTraits, SsaOp, SsaVarId};

/// An instruction in SSA form.
///
/// # Examples
///
/// ```rust
/// use gcmotion::analysis::{SsaInstruction, SsaOp, SsaVarId};
///
/// // v2 = v0 + v1
/// let instr = SsaInstruction::synthetic(SsaOp::Add {
///     dest: SsaVarId::new(2),
///     left: SsaVarId::new(0),
///     right: SsaVarId::new(1),
/// });
/// assert_eq!(instr.def(), Some(SsaVarId::new(2)));
/// assert_eq!(instr.to_string(), "v2 = add v0, v1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SsaInstruction {
    /// The decomposed SSA operation.
    op: SsaOp,
    /// Source offset the instruction was lowered from.
    offset: Option<u32>,
}

impl SsaInstruction {
    /// Creates an instruction lowered from the given source offset.
    #[must_use]
    pub fn new(op: SsaOp, offset: u32) -> Self {
        Self {
            op,
            offset: Some(offset),
        }
    }

    /// Creates an instruction with no source position.
    #[must_use]
    pub fn synthetic(op: SsaOp) -> Self {
        Self { op, offset: None }
    }

    /// Returns the decomposed operation.
    #[must_use]
    pub fn op(&self) -> &SsaOp {
        &self.op
    }

    /// Returns the source offset, if the instruction has one.
    #[must_use]
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// Returns the value defined by this instruction, if any.
    #[must_use]
    pub fn def(&self) -> Option<SsaVarId> {
        self.op.dest()
    }

    /// Returns the values read by this instruction.
    #[must_use]
    pub fn uses(&self) -> Vec<SsaVarId> {
        self.op.uses()
    }

    /// Returns `true` if this instruction ends its block.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.op.is_terminator()
    }

    /// Returns the scheduling-relevant properties of the operation.
    #[must_use]
    pub fn traits(&self) -> OpTraits {
        self.op.traits()
    }
}

impl fmt::Display for SsaInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        if let Some(offset) = self.offset {
            write!(f, "  ; @{offset:04X}")?;
        }
        Ok(())
    }
}
