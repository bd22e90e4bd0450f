//! Builder pattern for programmatic SSA construction.
//!
//! The builder uses a closure-based API where all blocks are defined within
//! a single expression, making the CFG structure visually clear:
//!
//! ```rust
//! use gcmotion::analysis::SsaFunctionBuilder;
//!
//! let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
//!     let cond = f.arg(0);
//!
//!     f.block(0, |b| b.branch(cond, 1, 2));
//!     f.block(1, |b| b.jump(3));
//!     f.block(2, |b| b.jump(3));
//!     f.block(3, |b| b.ret());
//! });
//! assert_eq!(ssa.block_count(), 4);
//! ```
//!
//! # Value Management
//!
//! Values are allocated when operations are added: value-producing methods
//! (`const_i32`, `add`, ...) return the new [`SsaVarId`]. Loops need a value
//! before its definition is emitted (a phi operand coming round the back
//! edge); reserve it with [`SsaFunctionContext::var`] and define it later
//! with [`SsaBlockBuilder::op`] or [`SsaBlockBuilder::phi_into`].

use std::collections::BTreeMap;

use crate::analysis::ssa::{
    value::ConstValue, PhiNode, PhiOperand, SsaBlock, SsaFunction, SsaInstruction, SsaOp,
    SsaVarId,
};

/// Builder for constructing SSA functions programmatically.
///
/// # Examples
///
/// ```rust
/// use gcmotion::analysis::SsaFunctionBuilder;
///
/// // return arg0 + arg1
/// let ssa = SsaFunctionBuilder::new(2).build_with(|f| {
///     let (a, b) = (f.arg(0), f.arg(1));
///     f.block(0, |blk| {
///         let sum = blk.add(a, b);
///         blk.ret_val(sum);
///     });
/// });
/// assert_eq!(ssa.total_instruction_count(), 2);
/// ```
#[derive(Debug)]
pub struct SsaFunctionBuilder {
    name: String,
    num_args: usize,
    /// Next value index to hand out
    next_value: usize,
    /// Blocks by ID; gaps are filled with empty blocks on build
    blocks: BTreeMap<usize, SsaBlock>,
}

impl SsaFunctionBuilder {
    /// Creates a new builder for a function with `num_args` arguments.
    ///
    /// Arguments become values `v0 .. v{num_args-1}`.
    #[must_use]
    pub fn new(num_args: usize) -> Self {
        Self {
            name: String::new(),
            num_args,
            next_value: num_args,
            blocks: BTreeMap::new(),
        }
    }

    /// Sets the name of the function being built.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn alloc_value(&mut self) -> SsaVarId {
        let id = SsaVarId::new(self.next_value);
        self.next_value += 1;
        id
    }

    /// Builds the SSA function using a closure that defines all blocks.
    pub fn build_with<F>(mut self, f: F) -> SsaFunction
    where
        F: FnOnce(&mut SsaFunctionContext<'_>),
    {
        let mut ctx = SsaFunctionContext { builder: &mut self };
        f(&mut ctx);
        self.build()
    }

    fn build(mut self) -> SsaFunction {
        let mut func = SsaFunction::new(self.num_args).with_name(self.name);
        while func.value_count() < self.next_value {
            let _ = func.new_value();
        }

        let block_count = self.blocks.keys().next_back().map_or(0, |max| max + 1);
        for id in 0..block_count {
            let block = self.blocks.remove(&id).unwrap_or_else(|| SsaBlock::new(id));
            func.add_block(block);
        }

        func
    }
}

/// Context passed to the build closure for defining blocks.
pub struct SsaFunctionContext<'a> {
    builder: &'a mut SsaFunctionBuilder,
}

impl SsaFunctionContext<'_> {
    /// Gets the value bound to argument `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_args`.
    #[must_use]
    pub fn arg(&self, index: usize) -> SsaVarId {
        assert!(index < self.builder.num_args, "argument index out of range");
        SsaVarId::new(index)
    }

    /// Reserves a fresh value to be defined later.
    #[must_use]
    pub fn var(&mut self) -> SsaVarId {
        self.builder.alloc_value()
    }

    /// Defines the block with the given ID.
    ///
    /// Defining the same ID twice replaces the earlier block.
    pub fn block<F>(&mut self, id: usize, f: F)
    where
        F: FnOnce(&mut SsaBlockBuilder<'_>),
    {
        let mut block = SsaBlock::new(id);
        let mut block_builder = SsaBlockBuilder {
            builder: self.builder,
            block: &mut block,
        };

        f(&mut block_builder);

        self.builder.blocks.insert(id, block);
    }
}

/// Builder for constructing individual SSA blocks.
///
/// Operations that produce values return the allocated `SsaVarId`.
pub struct SsaBlockBuilder<'a> {
    builder: &'a mut SsaFunctionBuilder,
    block: &'a mut SsaBlock,
}

impl SsaBlockBuilder<'_> {
    fn emit(&mut self, make: impl FnOnce(SsaVarId) -> SsaOp) -> SsaVarId {
        let dest = self.builder.alloc_value();
        self.block.add_instruction(SsaInstruction::synthetic(make(dest)));
        dest
    }

    /// Reserves a fresh value to be defined later.
    #[must_use]
    pub fn var(&mut self) -> SsaVarId {
        self.builder.alloc_value()
    }

    /// Adds: dest = const value
    #[must_use]
    pub fn const_val(&mut self, value: ConstValue) -> SsaVarId {
        self.emit(|dest| SsaOp::Const { dest, value })
    }

    /// Adds: dest = const i32
    #[must_use]
    pub fn const_i32(&mut self, value: i32) -> SsaVarId {
        self.const_val(ConstValue::I32(value))
    }

    /// Adds: dest = left + right
    #[must_use]
    pub fn add(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Add { dest, left, right })
    }

    /// Adds: dest = left - right
    #[must_use]
    pub fn sub(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Sub { dest, left, right })
    }

    /// Adds: dest = left * right
    #[must_use]
    pub fn mul(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Mul { dest, left, right })
    }

    /// Adds: dest = left / right (signed)
    #[must_use]
    pub fn div(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Div {
            dest,
            left,
            right,
            unsigned: false,
        })
    }

    /// Adds: dest = left % right (signed)
    #[must_use]
    pub fn rem(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Rem {
            dest,
            left,
            right,
            unsigned: false,
        })
    }

    /// Adds: dest = -operand
    #[must_use]
    pub fn neg(&mut self, operand: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Neg { dest, operand })
    }

    /// Adds: dest = left & right
    #[must_use]
    pub fn and(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::And { dest, left, right })
    }

    /// Adds: dest = left | right
    #[must_use]
    pub fn or(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Or { dest, left, right })
    }

    /// Adds: dest = left ^ right
    #[must_use]
    pub fn xor(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Xor { dest, left, right })
    }

    /// Adds: dest = ~operand
    #[must_use]
    pub fn not(&mut self, operand: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Not { dest, operand })
    }

    /// Adds: dest = value << amount
    #[must_use]
    pub fn shl(&mut self, value: SsaVarId, amount: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Shl {
            dest,
            value,
            amount,
        })
    }

    /// Adds: dest = value >> amount (arithmetic)
    #[must_use]
    pub fn shr(&mut self, value: SsaVarId, amount: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Shr {
            dest,
            value,
            amount,
            unsigned: false,
        })
    }

    /// Adds: dest = (left == right)
    #[must_use]
    pub fn ceq(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Ceq { dest, left, right })
    }

    /// Adds: dest = (left < right), signed
    #[must_use]
    pub fn clt(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Clt {
            dest,
            left,
            right,
            unsigned: false,
        })
    }

    /// Adds: dest = (left > right), signed
    #[must_use]
    pub fn cgt(&mut self, left: SsaVarId, right: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Cgt {
            dest,
            left,
            right,
            unsigned: false,
        })
    }

    /// Adds: dest = src
    #[must_use]
    pub fn copy(&mut self, src: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Copy { dest, src })
    }

    /// Adds: dest = load [addr]
    #[must_use]
    pub fn load(&mut self, addr: SsaVarId) -> SsaVarId {
        self.emit(|dest| SsaOp::Load { dest, addr })
    }

    /// Adds: store [addr], value
    pub fn store(&mut self, addr: SsaVarId, value: SsaVarId) {
        self.op(SsaOp::Store { addr, value });
    }

    /// Adds: dest = call callee(args)
    #[must_use]
    pub fn call(&mut self, callee: usize, args: &[SsaVarId]) -> SsaVarId {
        self.emit(|dest| SsaOp::Call {
            dest: Some(dest),
            callee,
            args: args.to_vec(),
        })
    }

    /// Adds: call callee(args), discarding any result
    pub fn call_void(&mut self, callee: usize, args: &[SsaVarId]) {
        self.op(SsaOp::Call {
            dest: None,
            callee,
            args: args.to_vec(),
        });
    }

    /// Adds: dest = landingpad
    #[must_use]
    pub fn landing_pad(&mut self) -> SsaVarId {
        self.emit(|dest| SsaOp::LandingPad { dest })
    }

    /// Adds: dest = catchpad
    #[must_use]
    pub fn catch_pad(&mut self) -> SsaVarId {
        self.emit(|dest| SsaOp::CatchPad { dest })
    }

    /// Adds: catchswitch [handlers] unwind
    pub fn catch_switch(&mut self, handlers: Vec<usize>, unwind: Option<usize>) {
        self.op(SsaOp::CatchSwitch { handlers, unwind });
    }

    /// Adds: jump target
    pub fn jump(&mut self, target: usize) {
        self.op(SsaOp::Jump { target });
    }

    /// Adds: branch condition, true_target, false_target
    pub fn branch(&mut self, condition: SsaVarId, true_target: usize, false_target: usize) {
        self.op(SsaOp::Branch {
            condition,
            true_target,
            false_target,
        });
    }

    /// Adds: switch value, targets, default
    pub fn switch(&mut self, value: SsaVarId, targets: Vec<usize>, default: usize) {
        self.op(SsaOp::Switch {
            value,
            targets,
            default,
        });
    }

    /// Adds: return
    pub fn ret(&mut self) {
        self.op(SsaOp::Return { value: None });
    }

    /// Adds: return value
    pub fn ret_val(&mut self, value: SsaVarId) {
        self.op(SsaOp::Return { value: Some(value) });
    }

    /// Adds: throw exception
    pub fn throw(&mut self, exception: SsaVarId) {
        self.op(SsaOp::Throw { exception });
    }

    /// Adds: unreachable
    pub fn unreachable(&mut self) {
        self.op(SsaOp::Unreachable);
    }

    /// Adds a phi node with operands given as `(predecessor, value)` pairs.
    ///
    /// Returns the variable defined by the phi.
    #[must_use]
    pub fn phi(&mut self, operands: &[(usize, SsaVarId)]) -> SsaVarId {
        let result = self.builder.alloc_value();
        self.phi_into(result, operands);
        result
    }

    /// Adds a phi node defining a previously reserved value.
    pub fn phi_into(&mut self, result: SsaVarId, operands: &[(usize, SsaVarId)]) {
        let mut phi = PhiNode::new(result);
        for &(pred, value) in operands {
            phi.add_operand(PhiOperand::new(value, pred));
        }
        self.block.add_phi(phi);
    }

    /// Adds an arbitrary operation as-is.
    ///
    /// Use this to define a reserved value (`dest` already allocated) or for
    /// operations without a dedicated shorthand.
    pub fn op(&mut self, op: SsaOp) {
        self.block.add_instruction(SsaInstruction::synthetic(op));
    }

    /// Adds a nop instruction.
    pub fn nop(&mut self) {
        self.op(SsaOp::Nop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fills_block_gaps() {
        let ssa = SsaFunctionBuilder::new(0).build_with(|f| {
            f.block(0, |b| b.jump(2));
            f.block(2, |b| b.ret());
        });
        assert_eq!(ssa.block_count(), 3);
        assert!(ssa.block(1).is_some_and(SsaBlock::is_empty));
    }

    #[test]
    fn test_builder_reserved_values() {
        let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
            let next = f.var();
            f.block(0, |b| b.jump(1));
            f.block(1, |b| {
                let i = b.phi(&[(0, SsaVarId::new(0)), (1, next)]);
                let one = b.const_i32(1);
                b.op(SsaOp::Add {
                    dest: next,
                    left: i,
                    right: one,
                });
                b.jump(1);
            });
        });

        assert_eq!(ssa.value_count(), 4);
        let header = ssa.block(1).unwrap();
        assert_eq!(header.phi_count(), 1);
        assert_eq!(header.phi_nodes()[0].operands()[1].value(), SsaVarId::new(1));
        assert_eq!(ssa.find_instruction_def(SsaVarId::new(1)), Some((1, 1)));
    }

    #[test]
    fn test_builder_name() {
        let ssa = SsaFunctionBuilder::new(0)
            .name("loop_sum")
            .build_with(|f| f.block(0, |b| b.ret()));
        assert_eq!(ssa.name(), "loop_sum");
    }
}
