//! Operation arena used while scheduling.
//!
//! Scheduling needs stable identities for operations whose positions keep
//! changing. [`Placement`] snapshots a function into one node per phi and
//! instruction, indexed by [`OpId`] in program order, and tracks per block
//! the ordered sequence of instruction ids. Relocation is a remove followed
//! by an insert into the target sequence, so an operation is always in
//! exactly one block. [`Placement::materialize`] writes the final order
//! back into the function.
//!
//! Phis are part of the arena (they are operands and users like anything
//! else) but are pinned and never appear in a relocation.

use std::fmt;

use crate::{
    analysis::{PhiNode, SsaFunction, SsaInstruction, SsaVarId},
    compiler::passes::gcm::pinning::{pin_reason, PinReason},
    utils::graph::NodeId,
    Result,
};

/// Identity of one operation for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(usize);

impl OpId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// Where to put an operation inside its target block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    /// Immediately before the block's terminator, or at the end if the block
    /// has none.
    BeforeTerminator,
    /// Immediately before another instruction of the target block.
    Before(OpId),
}

#[derive(Debug)]
enum OpBody {
    Phi(PhiNode),
    Instruction(SsaInstruction),
}

#[derive(Debug)]
struct OpNode {
    body: OpBody,
    block: usize,
    origin: usize,
    pin: Option<PinReason>,
    operands: Vec<OpId>,
    uses: Vec<OpId>,
}

/// Arena of all operations of one function.
#[derive(Debug)]
pub struct Placement {
    nodes: Vec<OpNode>,
    order: Vec<Vec<OpId>>,
}

impl Placement {
    /// Snapshots `ssa`.
    ///
    /// Operand edges point at the operation defining each used value;
    /// arguments and values without a definition contribute no edge. Use
    /// lists are sorted by the user's result value, users without a result
    /// last, so the traversal order does not depend on the current layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`](crate::Error::Malformed) if a value is
    /// defined more than once.
    pub fn build(ssa: &SsaFunction) -> Result<Self> {
        let mut nodes = Vec::with_capacity(ssa.total_phi_count() + ssa.total_instruction_count());
        let mut order = Vec::with_capacity(ssa.block_count());
        let mut defs: Vec<Option<OpId>> = vec![None; ssa.value_count()];

        let mut define = |var: SsaVarId, id: OpId| -> Result<()> {
            if var.index() >= defs.len() {
                defs.resize(var.index() + 1, None);
            }
            if defs[var.index()].replace(id).is_some() {
                return Err(malformed_error!("{} is defined more than once", var));
            }
            Ok(())
        };

        for (block_idx, block) in ssa.blocks().iter().enumerate() {
            for phi in block.phi_nodes() {
                let id = OpId(nodes.len());
                define(phi.result(), id)?;
                nodes.push(OpNode {
                    body: OpBody::Phi(phi.clone()),
                    block: block_idx,
                    origin: block_idx,
                    pin: Some(PinReason::Phi),
                    operands: Vec::new(),
                    uses: Vec::new(),
                });
            }

            let mut sequence = Vec::with_capacity(block.instruction_count());
            for instr in block.instructions() {
                let id = OpId(nodes.len());
                if let Some(dest) = instr.def() {
                    define(dest, id)?;
                }
                nodes.push(OpNode {
                    body: OpBody::Instruction(instr.clone()),
                    block: block_idx,
                    origin: block_idx,
                    pin: pin_reason(instr.op()),
                    operands: Vec::new(),
                    uses: Vec::new(),
                });
                sequence.push(id);
            }
            order.push(sequence);
        }

        let lookup = |var: SsaVarId| defs.get(var.index()).copied().flatten();
        for index in 0..nodes.len() {
            let operands: Vec<OpId> = match &nodes[index].body {
                OpBody::Phi(phi) => phi
                    .operands()
                    .iter()
                    .filter_map(|operand| lookup(operand.value()))
                    .collect(),
                OpBody::Instruction(instr) => {
                    instr.uses().into_iter().filter_map(lookup).collect()
                }
            };
            for &operand in &operands {
                nodes[operand.0].uses.push(OpId(index));
            }
            nodes[index].operands = operands;
        }

        let result_key: Vec<usize> = nodes
            .iter()
            .map(|node| node.result().map_or(usize::MAX, SsaVarId::index))
            .collect();
        for node in &mut nodes {
            node.uses.sort_by_key(|user| (result_key[user.0], *user));
            node.uses.dedup();
        }

        Ok(Self { nodes, order })
    }

    /// Number of operations, phis included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the function has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All ids in program order of the snapshot.
    pub fn ids(&self) -> impl Iterator<Item = OpId> {
        (0..self.nodes.len()).map(OpId)
    }

    /// Current block of `id`.
    #[must_use]
    pub fn block(&self, id: OpId) -> NodeId {
        NodeId::new(self.nodes[id.0].block)
    }

    /// Block `id` was in when the snapshot was taken.
    #[must_use]
    pub fn origin(&self, id: OpId) -> NodeId {
        NodeId::new(self.nodes[id.0].origin)
    }

    /// Why `id` is pinned, if it is.
    #[must_use]
    pub fn pin_reason(&self, id: OpId) -> Option<PinReason> {
        self.nodes[id.0].pin
    }

    /// Returns true if `id` must not move.
    #[must_use]
    pub fn is_pinned(&self, id: OpId) -> bool {
        self.nodes[id.0].pin.is_some()
    }

    /// Returns true if `id` is a phi.
    #[must_use]
    pub fn is_phi(&self, id: OpId) -> bool {
        matches!(self.nodes[id.0].body, OpBody::Phi(_))
    }

    /// Operations defining the values `id` reads.
    #[must_use]
    pub fn operands(&self, id: OpId) -> &[OpId] {
        &self.nodes[id.0].operands
    }

    /// Operations reading the value `id` defines.
    #[must_use]
    pub fn uses(&self, id: OpId) -> &[OpId] {
        &self.nodes[id.0].uses
    }

    /// The value `id` defines.
    #[must_use]
    pub fn result(&self, id: OpId) -> Option<SsaVarId> {
        self.nodes[id.0].result()
    }

    /// Blocks where `user` reads the result of `id`.
    ///
    /// A phi reads each operand at the end of the associated predecessor, so
    /// for phi users this yields one predecessor per matching operand slot.
    /// Any other user reads at its own block.
    #[must_use]
    pub fn use_blocks(&self, id: OpId, user: OpId) -> Vec<NodeId> {
        match (&self.nodes[user.0].body, self.result(id)) {
            (OpBody::Phi(phi), Some(value)) => phi.incoming_blocks(value).map(NodeId::new).collect(),
            (OpBody::Phi(_), None) => Vec::new(),
            (OpBody::Instruction(_), _) => vec![self.block(user)],
        }
    }

    /// Returns true if `id` ends its block.
    #[must_use]
    pub fn is_terminator(&self, id: OpId) -> bool {
        self.nodes[id.0].is_terminator()
    }

    /// Instruction ids of `block` in their current order.
    #[must_use]
    pub fn sequence(&self, block: NodeId) -> &[OpId] {
        self.order.get(block.index()).map_or(&[], Vec::as_slice)
    }

    /// Position of `id` inside its current block, `None` for phis.
    #[must_use]
    pub fn position(&self, id: OpId) -> Option<usize> {
        self.sequence(self.block(id)).iter().position(|&other| other == id)
    }

    /// Returns the first non-phi user of `id` that sits in `block`.
    #[must_use]
    pub fn first_use_in(&self, id: OpId, block: NodeId) -> Option<OpId> {
        let users = &self.nodes[id.0].uses;
        self.sequence(block)
            .iter()
            .copied()
            .find(|candidate| users.contains(candidate) && !self.is_phi(*candidate))
    }

    /// Moves `id` into `block` at `at`.
    ///
    /// Phis and ids already at the requested point are left alone. Returns
    /// true if the layout changed.
    pub fn relocate(&mut self, id: OpId, block: NodeId, at: InsertPoint) -> bool {
        if self.is_phi(id) || block.index() >= self.order.len() {
            return false;
        }

        let from = self.nodes[id.0].block;
        let Some(old_position) = self.order[from].iter().position(|&other| other == id) else {
            return false;
        };
        self.order[from].remove(old_position);

        let target = &self.order[block.index()];
        let position = match at {
            InsertPoint::Before(anchor) => target
                .iter()
                .position(|&other| other == anchor)
                .unwrap_or(target.len()),
            InsertPoint::BeforeTerminator => match target.last() {
                Some(&last) if self.nodes[last.0].is_terminator() => target.len() - 1,
                _ => target.len(),
            },
        };

        self.order[block.index()].insert(position, id);
        self.nodes[id.0].block = block.index();
        from != block.index() || old_position != position
    }

    /// Replaces the order of `block`. `sequence` must hold exactly the ids
    /// currently in that block.
    pub(crate) fn set_sequence(&mut self, block: NodeId, sequence: Vec<OpId>) {
        if let Some(slot) = self.order.get_mut(block.index()) {
            debug_assert_eq!(slot.len(), sequence.len());
            *slot = sequence;
        }
    }

    /// Writes the current layout back into `ssa`.
    ///
    /// Phis are untouched; every block's instruction list is rebuilt from
    /// its id sequence.
    pub fn materialize(self, ssa: &mut SsaFunction) {
        let mut bodies: Vec<Option<SsaInstruction>> = self
            .nodes
            .into_iter()
            .map(|node| match node.body {
                OpBody::Instruction(instr) => Some(instr),
                OpBody::Phi(_) => None,
            })
            .collect();

        for (block, sequence) in ssa.blocks_mut().iter_mut().zip(self.order) {
            *block.instructions_mut() = sequence
                .into_iter()
                .filter_map(|id| bodies[id.0].take())
                .collect();
        }
    }

    /// Renders `id` for diagnostics.
    #[must_use]
    pub fn describe(&self, id: OpId) -> String {
        match &self.nodes[id.0].body {
            OpBody::Phi(phi) => phi.to_string(),
            OpBody::Instruction(instr) => instr.op().to_string(),
        }
    }
}

impl OpNode {
    fn result(&self) -> Option<SsaVarId> {
        match &self.body {
            OpBody::Phi(phi) => Some(phi.result()),
            OpBody::Instruction(instr) => instr.def(),
        }
    }

    fn is_terminator(&self) -> bool {
        matches!(&self.body, OpBody::Instruction(instr) if instr.is_terminator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::SsaFunctionBuilder, Error};

    fn sample() -> SsaFunction {
        // B0: v2 = add v0, v1; jump B1
        // B1: v3 = phi(v2 from B0, v4 from B1); v4 = mul v3, v2; branch v4 -> B1 / B2
        // B2: ret v4
        SsaFunctionBuilder::new(2).build_with(|f| {
            let (a, b) = (f.arg(0), f.arg(1));
            let sum = f.var();
            let phi = f.var();
            let prod = f.var();
            f.block(0, |bb| {
                bb.op(crate::analysis::SsaOp::Add {
                    dest: sum,
                    left: a,
                    right: b,
                });
                bb.jump(1);
            });
            f.block(1, |bb| {
                bb.phi_into(phi, &[(0, sum), (1, prod)]);
                bb.op(crate::analysis::SsaOp::Mul {
                    dest: prod,
                    left: phi,
                    right: sum,
                });
                bb.branch(prod, 1, 2);
            });
            f.block(2, |bb| bb.ret_val(prod));
        })
    }

    #[test]
    fn test_build_links_operands_and_uses() {
        let ssa = sample();
        let placement = Placement::build(&ssa).unwrap();

        // op0 add, op1 jump, op2 phi, op3 mul, op4 branch, op5 ret
        assert_eq!(placement.len(), 6);
        let add = OpId(0);
        let phi = OpId(2);
        let mul = OpId(3);

        assert!(placement.is_phi(phi));
        assert_eq!(placement.pin_reason(phi), Some(PinReason::Phi));
        assert!(!placement.is_pinned(add));
        assert!(placement.is_pinned(OpId(1)));

        assert!(placement.operands(add).is_empty());
        assert_eq!(placement.operands(mul), &[phi, add]);
        assert_eq!(placement.uses(add), &[phi, mul]);
        assert_eq!(placement.uses(mul), &[phi, OpId(4), OpId(5)]);
        assert_eq!(placement.sequence(NodeId::new(1)), &[mul, OpId(4)]);
        assert_eq!(placement.position(phi), None);
    }

    #[test]
    fn test_phi_use_blocks_are_predecessors() {
        let placement = Placement::build(&sample()).unwrap();
        let phi = OpId(2);

        assert_eq!(placement.use_blocks(OpId(0), phi), vec![NodeId::new(0)]);
        assert_eq!(placement.use_blocks(OpId(3), phi), vec![NodeId::new(1)]);
        assert_eq!(placement.use_blocks(OpId(0), OpId(3)), vec![NodeId::new(1)]);
    }

    #[test]
    fn test_relocate_before_terminator_and_before_use() {
        let mut ssa = sample();
        let mut placement = Placement::build(&ssa).unwrap();
        let add = OpId(0);

        assert!(placement.relocate(add, NodeId::new(2), InsertPoint::BeforeTerminator));
        assert_eq!(placement.block(add), NodeId::new(2));
        assert_eq!(placement.origin(add), NodeId::new(0));
        assert_eq!(placement.sequence(NodeId::new(0)), &[OpId(1)]);
        assert_eq!(placement.sequence(NodeId::new(2)), &[add, OpId(5)]);

        assert!(placement.relocate(add, NodeId::new(1), InsertPoint::Before(OpId(3))));
        assert_eq!(placement.sequence(NodeId::new(1)), &[add, OpId(3), OpId(4)]);
        assert!(!placement.relocate(add, NodeId::new(1), InsertPoint::Before(OpId(3))));
        assert_eq!(placement.first_use_in(add, NodeId::new(1)), Some(OpId(3)));

        placement.materialize(&mut ssa);
        assert!(ssa.block(0).unwrap().instructions()[0].is_terminator());
        assert_eq!(ssa.block(1).unwrap().instruction_count(), 3);
        assert_eq!(ssa.block(1).unwrap().phi_count(), 1);
        assert_eq!(ssa.total_instruction_count(), 5);
    }

    #[test]
    fn test_phis_never_relocate() {
        let mut placement = Placement::build(&sample()).unwrap();
        assert!(!placement.relocate(OpId(2), NodeId::new(0), InsertPoint::BeforeTerminator));
        assert_eq!(placement.block(OpId(2)), NodeId::new(1));
    }

    #[test]
    fn test_duplicate_definition_is_malformed() {
        let ssa = SsaFunctionBuilder::new(0).build_with(|f| {
            let x = f.var();
            f.block(0, |b| {
                b.op(crate::analysis::SsaOp::Const {
                    dest: x,
                    value: crate::analysis::ConstValue::I32(1),
                });
                b.op(crate::analysis::SsaOp::Const {
                    dest: x,
                    value: crate::analysis::ConstValue::I32(2),
                });
                b.ret();
            });
        });
        assert!(matches!(
            Placement::build(&ssa),
            Err(Error::Malformed { .. })
        ));
    }
}
