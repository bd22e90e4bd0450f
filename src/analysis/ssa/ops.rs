//! Decomposed SSA operations.
//!
//! `SsaOp` is the `result = op(operands)` form every instruction is expressed
//! in. Each operation produces at most one result and names all of its data
//! dependencies as explicit SSA values, so def-use edges can be read straight
//! off the enum.
//!
//! # Operation Categories
//!
//! - **Constants**: Load constant values
//! - **Arithmetic**: Binary and unary integer math
//! - **Bitwise**: And, or, xor, not, shifts
//! - **Comparison**: Equality and relational comparisons
//! - **Memory**: Loads and stores through an address
//! - **Calls**: Function invocations
//! - **Control flow**: Jumps, branches, switches, returns, throws
//! - **Exception handling**: Landing, catch and cleanup pads, catch dispatch
//!
//! # Field Documentation
//!
//! - `dest`: The destination SSA value for the operation result
//! - `left`, `right`: Binary operands
//! - `operand`: Unary operand
//! - `addr`, `value`: Address and stored value for memory operations
//! - `target`, `true_target`, `false_target`, `targets`, `default`: Branch targets (block indices)
//! - `unsigned`: Whether the operation treats values as unsigned

#![allow(missing_docs)]

use std::fmt;

use bitflags::bitflags;

use crate::analysis::ssa::{value::ConstValue, SsaVarId};

bitflags! {
    /// Scheduling-relevant properties of an operation.
    ///
    /// Anything carrying one of these flags has an effect beyond producing its
    /// result value, or is tied to its position in the control-flow graph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpTraits: u8 {
        /// Ends a basic block
        const TERMINATOR = 0x01;
        /// Transfers control to another function
        const CALL = 0x02;
        /// Exception-handling entry or dispatch construct
        const EH_PAD = 0x04;
        /// Reads memory through an address
        const READS_MEMORY = 0x08;
        /// Writes memory through an address
        const WRITES_MEMORY = 0x10;
        /// May raise an exception on some inputs
        const MAY_THROW = 0x20;
    }
}

/// A decomposed SSA operation.
///
/// # Conventions
///
/// - For operations that produce a result, the result is `dest`
/// - Operands appear in evaluation order
/// - Optional results use `Option<SsaVarId>` (calls that return nothing)
#[derive(Debug, Clone, PartialEq)]
pub enum SsaOp {
    /// Load a constant value.
    ///
    /// `dest = const value`
    Const { dest: SsaVarId, value: ConstValue },

    /// Addition: `dest = left + right`
    Add {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
    },

    /// Subtraction: `dest = left - right`
    Sub {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
    },

    /// Multiplication: `dest = left * right`
    Mul {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
    },

    /// Division: `dest = left / right` (traps on zero divisor)
    Div {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
        unsigned: bool,
    },

    /// Remainder: `dest = left % right` (traps on zero divisor)
    Rem {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
        unsigned: bool,
    },

    /// Negation: `dest = -operand`
    Neg { dest: SsaVarId, operand: SsaVarId },

    /// Bitwise AND: `dest = left & right`
    And {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
    },

    /// Bitwise OR: `dest = left | right`
    Or {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
    },

    /// Bitwise XOR: `dest = left ^ right`
    Xor {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
    },

    /// Bitwise NOT: `dest = ~operand`
    Not { dest: SsaVarId, operand: SsaVarId },

    /// Shift left: `dest = value << amount`
    Shl {
        dest: SsaVarId,
        value: SsaVarId,
        amount: SsaVarId,
    },

    /// Shift right: `dest = value >> amount`
    Shr {
        dest: SsaVarId,
        value: SsaVarId,
        amount: SsaVarId,
        unsigned: bool,
    },

    /// Compare equal: `dest = (left == right) ? 1 : 0`
    Ceq {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
    },

    /// Compare less than: `dest = (left < right) ? 1 : 0`
    Clt {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
        unsigned: bool,
    },

    /// Compare greater than: `dest = (left > right) ? 1 : 0`
    Cgt {
        dest: SsaVarId,
        left: SsaVarId,
        right: SsaVarId,
        unsigned: bool,
    },

    /// Copy: `dest = src`
    Copy { dest: SsaVarId, src: SsaVarId },

    /// Load through an address: `dest = *addr`
    Load { dest: SsaVarId, addr: SsaVarId },

    /// Store through an address: `*addr = value`
    Store { addr: SsaVarId, value: SsaVarId },

    /// Call a function: `dest = call callee(args)`
    Call {
        dest: Option<SsaVarId>,
        callee: usize,
        args: Vec<SsaVarId>,
    },

    /// Unconditional jump: `goto target`
    Jump { target: usize },

    /// Conditional branch: `if condition goto true_target else goto false_target`
    Branch {
        condition: SsaVarId,
        true_target: usize,
        false_target: usize,
    },

    /// Multi-way branch: `switch value [targets...] default`
    Switch {
        value: SsaVarId,
        targets: Vec<usize>,
        default: usize,
    },

    /// Return from the function: `return value?`
    Return { value: Option<SsaVarId> },

    /// Raise an exception: `throw exception`
    Throw { exception: SsaVarId },

    /// Marks a block end that is never reached at runtime.
    Unreachable,

    /// Landing pad: `dest = landingpad`, the exception object on handler entry.
    LandingPad { dest: SsaVarId },

    /// Catch pad: `dest = catchpad`, entry of a single catch handler.
    CatchPad { dest: SsaVarId },

    /// Cleanup pad: `dest = cleanuppad`, entry of a cleanup (finally) handler.
    CleanupPad { dest: SsaVarId },

    /// Catch dispatch: transfers an in-flight exception to one of `handlers`,
    /// or to `unwind` (if any) when none matches.
    CatchSwitch {
        handlers: Vec<usize>,
        unwind: Option<usize>,
    },

    /// No operation.
    Nop,
}

impl SsaOp {
    /// Returns the value defined by this operation, if any.
    #[must_use]
    pub fn dest(&self) -> Option<SsaVarId> {
        match self {
            Self::Const { dest, .. }
            | Self::Add { dest, .. }
            | Self::Sub { dest, .. }
            | Self::Mul { dest, .. }
            | Self::Div { dest, .. }
            | Self::Rem { dest, .. }
            | Self::Neg { dest, .. }
            | Self::And { dest, .. }
            | Self::Or { dest, .. }
            | Self::Xor { dest, .. }
            | Self::Not { dest, .. }
            | Self::Shl { dest, .. }
            | Self::Shr { dest, .. }
            | Self::Ceq { dest, .. }
            | Self::Clt { dest, .. }
            | Self::Cgt { dest, .. }
            | Self::Copy { dest, .. }
            | Self::Load { dest, .. }
            | Self::LandingPad { dest }
            | Self::CatchPad { dest }
            | Self::CleanupPad { dest } => Some(*dest),
            Self::Call { dest, .. } => *dest,
            Self::Store { .. }
            | Self::Jump { .. }
            | Self::Branch { .. }
            | Self::Switch { .. }
            | Self::Return { .. }
            | Self::Throw { .. }
            | Self::Unreachable
            | Self::CatchSwitch { .. }
            | Self::Nop => None,
        }
    }

    /// Returns the values read by this operation, in operand order.
    #[must_use]
    pub fn uses(&self) -> Vec<SsaVarId> {
        match self {
            Self::Add { left, right, .. }
            | Self::Sub { left, right, .. }
            | Self::Mul { left, right, .. }
            | Self::Div { left, right, .. }
            | Self::Rem { left, right, .. }
            | Self::And { left, right, .. }
            | Self::Or { left, right, .. }
            | Self::Xor { left, right, .. }
            | Self::Ceq { left, right, .. }
            | Self::Clt { left, right, .. }
            | Self::Cgt { left, right, .. } => vec![*left, *right],
            Self::Shl { value, amount, .. } | Self::Shr { value, amount, .. } => {
                vec![*value, *amount]
            }
            Self::Neg { operand, .. } | Self::Not { operand, .. } => vec![*operand],
            Self::Copy { src, .. } => vec![*src],
            Self::Load { addr, .. } => vec![*addr],
            Self::Store { addr, value } => vec![*addr, *value],
            Self::Call { args, .. } => args.clone(),
            Self::Branch { condition, .. } => vec![*condition],
            Self::Switch { value, .. } => vec![*value],
            Self::Return { value } => value.iter().copied().collect(),
            Self::Throw { exception } => vec![*exception],
            Self::Const { .. }
            | Self::Jump { .. }
            | Self::Unreachable
            | Self::LandingPad { .. }
            | Self::CatchPad { .. }
            | Self::CleanupPad { .. }
            | Self::CatchSwitch { .. }
            | Self::Nop => Vec::new(),
        }
    }

    /// Returns the successor blocks of a terminator, in target order.
    ///
    /// Non-terminators have no successors.
    #[must_use]
    pub fn successors(&self) -> Vec<usize> {
        match self {
            Self::Jump { target } => vec![*target],
            Self::Branch {
                true_target,
                false_target,
                ..
            } => vec![*true_target, *false_target],
            Self::Switch {
                targets, default, ..
            } => {
                let mut succs = targets.clone();
                succs.push(*default);
                succs
            }
            Self::CatchSwitch { handlers, unwind } => {
                let mut succs = handlers.clone();
                succs.extend(unwind.iter().copied());
                succs
            }
            _ => Vec::new(),
        }
    }

    /// Returns `true` if this operation ends a basic block.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Jump { .. }
                | Self::Branch { .. }
                | Self::Switch { .. }
                | Self::Return { .. }
                | Self::Throw { .. }
                | Self::Unreachable
                | Self::CatchSwitch { .. }
        )
    }

    /// Returns `true` if this operation is an exception-handling construct.
    #[must_use]
    pub const fn is_eh_pad(&self) -> bool {
        matches!(
            self,
            Self::LandingPad { .. }
                | Self::CatchPad { .. }
                | Self::CleanupPad { .. }
                | Self::CatchSwitch { .. }
        )
    }

    /// Returns `true` if this operation may raise an exception.
    #[must_use]
    pub const fn may_throw(&self) -> bool {
        matches!(
            self,
            Self::Div { .. }
                | Self::Rem { .. }
                | Self::Load { .. }
                | Self::Store { .. }
                | Self::Call { .. }
                | Self::Throw { .. }
        )
    }

    /// Returns `true` if this operation computes its result from its operands
    /// alone, with no other observable effect.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.traits().is_empty() && !matches!(self, Self::Nop)
    }

    /// Returns the scheduling-relevant properties of this operation.
    #[must_use]
    pub fn traits(&self) -> OpTraits {
        let mut traits = OpTraits::empty();
        if self.is_terminator() {
            traits |= OpTraits::TERMINATOR;
        }
        if matches!(self, Self::Call { .. }) {
            traits |= OpTraits::CALL;
        }
        if self.is_eh_pad() {
            traits |= OpTraits::EH_PAD;
        }
        if matches!(self, Self::Load { .. }) {
            traits |= OpTraits::READS_MEMORY;
        }
        if matches!(self, Self::Store { .. }) {
            traits |= OpTraits::WRITES_MEMORY;
        }
        if self.may_throw() {
            traits |= OpTraits::MAY_THROW;
        }
        traits
    }
}

impl fmt::Display for SsaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let un = |unsigned: &bool| if *unsigned { ".un" } else { "" };
        match self {
            Self::Const { dest, value } => write!(f, "{dest} = {value}"),
            Self::Add { dest, left, right } => write!(f, "{dest} = add {left}, {right}"),
            Self::Sub { dest, left, right } => write!(f, "{dest} = sub {left}, {right}"),
            Self::Mul { dest, left, right } => write!(f, "{dest} = mul {left}, {right}"),
            Self::Div {
                dest,
                left,
                right,
                unsigned,
            } => write!(f, "{dest} = div{} {left}, {right}", un(unsigned)),
            Self::Rem {
                dest,
                left,
                right,
                unsigned,
            } => write!(f, "{dest} = rem{} {left}, {right}", un(unsigned)),
            Self::Neg { dest, operand } => write!(f, "{dest} = neg {operand}"),
            Self::And { dest, left, right } => write!(f, "{dest} = and {left}, {right}"),
            Self::Or { dest, left, right } => write!(f, "{dest} = or {left}, {right}"),
            Self::Xor { dest, left, right } => write!(f, "{dest} = xor {left}, {right}"),
            Self::Not { dest, operand } => write!(f, "{dest} = not {operand}"),
            Self::Shl {
                dest,
                value,
                amount,
            } => write!(f, "{dest} = shl {value}, {amount}"),
            Self::Shr {
                dest,
                value,
                amount,
                unsigned,
            } => write!(f, "{dest} = shr{} {value}, {amount}", un(unsigned)),
            Self::Ceq { dest, left, right } => write!(f, "{dest} = ceq {left}, {right}"),
            Self::Clt {
                dest,
                left,
                right,
                unsigned,
            } => write!(f, "{dest} = clt{} {left}, {right}", un(unsigned)),
            Self::Cgt {
                dest,
                left,
                right,
                unsigned,
            } => write!(f, "{dest} = cgt{} {left}, {right}", un(unsigned)),
            Self::Copy { dest, src } => write!(f, "{dest} = {src}"),
            Self::Load { dest, addr } => write!(f, "{dest} = load [{addr}]"),
            Self::Store { addr, value } => write!(f, "store [{addr}], {value}"),
            Self::Call { dest, callee, args } => {
                if let Some(dest) = dest {
                    write!(f, "{dest} = ")?;
                }
                write!(f, "call f{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Jump { target } => write!(f, "jump B{target}"),
            Self::Branch {
                condition,
                true_target,
                false_target,
            } => write!(f, "branch {condition}, B{true_target}, B{false_target}"),
            Self::Switch {
                value,
                targets,
                default,
            } => {
                write!(f, "switch {value}, [")?;
                for (i, target) in targets.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "B{target}")?;
                }
                write!(f, "], B{default}")
            }
            Self::Return { value: Some(value) } => write!(f, "ret {value}"),
            Self::Return { value: None } => write!(f, "ret"),
            Self::Throw { exception } => write!(f, "throw {exception}"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::LandingPad { dest } => write!(f, "{dest} = landingpad"),
            Self::CatchPad { dest } => write!(f, "{dest} = catchpad"),
            Self::CleanupPad { dest } => write!(f, "{dest} = cleanuppad"),
            Self::CatchSwitch { handlers, unwind } => {
                write!(f, "catchswitch [")?;
                for (i, handler) in handlers.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "B{handler}")?;
                }
                write!(f, "]")?;
                match unwind {
                    Some(unwind) => write!(f, " unwind B{unwind}"),
                    None => write!(f, " unwind caller"),
                }
            }
            Self::Nop => write!(f, "nop"),
        }
    }
}
