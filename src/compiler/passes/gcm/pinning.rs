//! Classification of operations that must not move.
//!
//! Pinned operations keep their block and their order within it. They are
//! also the roots both scheduling phases start from.

use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

use crate::analysis::SsaOp;

/// Why an operation is pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum PinReason {
    /// Control-flow merge: its operands are tied to predecessor edges.
    Phi,
    /// Ends a block (jump, branch, switch, return, throw, unreachable,
    /// catch-switch dispatch).
    Terminator,
    /// Calls have unknown side effects.
    Call,
    /// Landing, catch and cleanup pads.
    ExceptionHandling,
    /// Loads and stores; moving them could reorder memory effects.
    MemoryAccess,
    /// Division and remainder trap on a zero divisor.
    MayTrap,
}

/// Returns why `op` is pinned, or `None` if it may move.
///
/// Phis are not [`SsaOp`]s and are always [`PinReason::Phi`].
///
/// The classic pinned set is phis, terminators, calls and exception-handling
/// pads. Loads, stores, division and remainder are pinned on top of that on
/// purpose: without alias or divisor analysis, moving them could reorder
/// memory effects or introduce a trap on a path that never had one.
#[must_use]
pub fn pin_reason(op: &SsaOp) -> Option<PinReason> {
    if op.is_terminator() {
        return Some(PinReason::Terminator);
    }

    match op {
        SsaOp::Call { .. } => Some(PinReason::Call),
        SsaOp::LandingPad { .. } | SsaOp::CatchPad { .. } | SsaOp::CleanupPad { .. } => {
            Some(PinReason::ExceptionHandling)
        }
        SsaOp::Load { .. } | SsaOp::Store { .. } => Some(PinReason::MemoryAccess),
        SsaOp::Div { .. } | SsaOp::Rem { .. } => Some(PinReason::MayTrap),
        _ => None,
    }
}

/// Returns `true` if `op` must stay where it is.
#[must_use]
pub fn is_pinned(op: &SsaOp) -> bool {
    pin_reason(op).is_some()
}

#[cfg(test)]
mod tests {
    use strum::{EnumCount, IntoEnumIterator};

    use super::*;
    use crate::analysis::{ConstValue, SsaVarId};

    fn v(n: usize) -> SsaVarId {
        SsaVarId::new(n)
    }

    #[test]
    fn test_pure_ops_are_movable() {
        let movable = [
            SsaOp::Const {
                dest: v(0),
                value: ConstValue::I32(1),
            },
            SsaOp::Add {
                dest: v(2),
                left: v(0),
                right: v(1),
            },
            SsaOp::Mul {
                dest: v(2),
                left: v(0),
                right: v(1),
            },
            SsaOp::Not {
                dest: v(1),
                operand: v(0),
            },
            SsaOp::Ceq {
                dest: v(2),
                left: v(0),
                right: v(1),
            },
            SsaOp::Copy {
                dest: v(1),
                src: v(0),
            },
            SsaOp::Nop,
        ];
        for op in &movable {
            assert!(!is_pinned(op), "{op} should be movable");
        }
    }

    #[test]
    fn test_pinned_classes() {
        let cases = [
            (SsaOp::Jump { target: 1 }, PinReason::Terminator),
            (SsaOp::Return { value: None }, PinReason::Terminator),
            (SsaOp::Unreachable, PinReason::Terminator),
            (
                SsaOp::CatchSwitch {
                    handlers: vec![2],
                    unwind: None,
                },
                PinReason::Terminator,
            ),
            (
                SsaOp::Call {
                    dest: Some(v(1)),
                    callee: 7,
                    args: vec![v(0)],
                },
                PinReason::Call,
            ),
            (SsaOp::LandingPad { dest: v(0) }, PinReason::ExceptionHandling),
            (SsaOp::CleanupPad { dest: v(0) }, PinReason::ExceptionHandling),
            (
                SsaOp::Load {
                    dest: v(1),
                    addr: v(0),
                },
                PinReason::MemoryAccess,
            ),
            (
                SsaOp::Div {
                    dest: v(2),
                    left: v(0),
                    right: v(1),
                    unsigned: false,
                },
                PinReason::MayTrap,
            ),
        ];
        for (op, reason) in &cases {
            assert_eq!(pin_reason(op), Some(*reason), "{op}");
            assert!(is_pinned(op));
        }
    }

    #[test]
    fn test_reason_names() {
        assert_eq!(PinReason::ExceptionHandling.to_string(), "exception-handling");
        assert_eq!(PinReason::COUNT, PinReason::iter().count());
        let name: &'static str = PinReason::MayTrap.into();
        assert_eq!(name, "may-trap");
    }
}
