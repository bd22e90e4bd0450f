//! SSA basic blocks.
//!
//! A block holds its phi nodes followed by an ordered instruction list whose
//! last element is the terminator. Phi nodes are kept apart from instructions
//! because they execute on block entry and never move.

use std::fmt;

use crate::analysis::ssa::{PhiNode, SsaInstruction, SsaOp, SsaVarId};

/// A basic block in SSA form.
#[derive(Debug, Clone, PartialEq)]
pub struct SsaBlock {
    /// Block index within the function.
    id: usize,
    /// Phi nodes, evaluated on entry.
    phi_nodes: Vec<PhiNode>,
    /// Instructions, terminator last.
    instructions: Vec<SsaInstruction>,
}

impl SsaBlock {
    /// Creates an empty block.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            phi_nodes: Vec::new(),
            instructions: Vec::new(),
        }
    }

    /// Returns the block index.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Returns the phi nodes of this block.
    #[must_use]
    pub fn phi_nodes(&self) -> &[PhiNode] {
        &self.phi_nodes
    }

    /// Returns the instructions of this block.
    #[must_use]
    pub fn instructions(&self) -> &[SsaInstruction] {
        &self.instructions
    }

    /// Returns a mutable reference to the instruction list.
    pub fn instructions_mut(&mut self) -> &mut Vec<SsaInstruction> {
        &mut self.instructions
    }

    /// Returns the instruction at `index`.
    #[must_use]
    pub fn instruction(&self, index: usize) -> Option<&SsaInstruction> {
        self.instructions.get(index)
    }

    /// Returns the number of phi nodes.
    #[must_use]
    pub fn phi_count(&self) -> usize {
        self.phi_nodes.len()
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the block has neither phi nodes nor instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phi_nodes.is_empty() && self.instructions.is_empty()
    }

    /// Appends a phi node.
    pub fn add_phi(&mut self, phi: PhiNode) {
        self.phi_nodes.push(phi);
    }

    /// Appends an instruction.
    pub fn add_instruction(&mut self, instr: SsaInstruction) {
        self.instructions.push(instr);
    }

    /// Returns the terminator instruction, if the block has one.
    #[must_use]
    pub fn terminator(&self) -> Option<&SsaInstruction> {
        self.instructions.last().filter(|instr| instr.is_terminator())
    }

    /// Returns the terminator operation, if the block has one.
    #[must_use]
    pub fn terminator_op(&self) -> Option<&SsaOp> {
        self.terminator().map(SsaInstruction::op)
    }

    /// Returns the position new code is inserted at to run last before the
    /// block exits: the terminator's index, or the end of a block without one.
    #[must_use]
    pub fn terminator_index(&self) -> usize {
        match self.terminator() {
            Some(_) => self.instructions.len() - 1,
            None => self.instructions.len(),
        }
    }

    /// Returns the successor block indices, taken from the terminator.
    #[must_use]
    pub fn successors(&self) -> Vec<usize> {
        self.terminator_op()
            .map(SsaOp::successors)
            .unwrap_or_default()
    }

    /// Returns the values defined in this block: phi results, then
    /// instruction results in order.
    pub fn defined_variables(&self) -> impl Iterator<Item = SsaVarId> + '_ {
        self.phi_nodes
            .iter()
            .map(PhiNode::result)
            .chain(self.instructions.iter().filter_map(SsaInstruction::def))
    }
}

impl fmt::Display for SsaBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "B{}:", self.id)?;

        for phi in &self.phi_nodes {
            writeln!(f, "  {phi}")?;
        }

        for instr in &self.instructions {
            writeln!(f, "  {instr}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ssa::value::ConstValue;

    #[test]
    fn test_terminator_index() {
        let mut block = SsaBlock::new(0);
        assert_eq!(block.terminator_index(), 0);

        block.add_instruction(SsaInstruction::synthetic(SsaOp::Const {
            dest: SsaVarId::new(0),
            value: ConstValue::I32(1),
        }));
        assert_eq!(block.terminator_index(), 1);
        assert!(block.terminator().is_none());

        block.add_instruction(SsaInstruction::synthetic(SsaOp::Jump { target: 1 }));
        assert_eq!(block.terminator_index(), 1);
        assert_eq!(block.successors(), vec![1]);
    }

    #[test]
    fn test_defined_variables_order() {
        let mut block = SsaBlock::new(2);
        block.add_phi(PhiNode::new(SsaVarId::new(5)));
        block.add_instruction(SsaInstruction::synthetic(SsaOp::Copy {
            dest: SsaVarId::new(6),
            src: SsaVarId::new(5),
        }));
        block.add_instruction(SsaInstruction::synthetic(SsaOp::Return { value: None }));

        let defs: Vec<SsaVarId> = block.defined_variables().collect();
        assert_eq!(defs, vec![SsaVarId::new(5), SsaVarId::new(6)]);
        assert_eq!(block.to_string(), "B2:\n  v5 = phi()\n  v6 = v5\n  ret\n");
    }
}
