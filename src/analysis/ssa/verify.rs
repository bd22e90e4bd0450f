//! SSA dominance verification.
//!
//! Strict SSA requires every use of a value to be dominated by its
//! definition. For an instruction operand that means the definition sits in
//! a dominating block, or earlier in the same block. A phi operand is used
//! at the end of its predecessor block, so there the definition must
//! dominate the predecessor instead.
//!
//! Blocks unreachable from the entry are not checked.

use crate::{
    analysis::ssa::{DefSite, SsaFunction, SsaVarId},
    utils::graph::{algorithms::DominatorTree, NodeId},
    Error, Result,
};

/// Verifies that every use in `ssa` is dominated by its definition.
///
/// # Errors
///
/// Returns [`Error::SsaViolation`] describing the first offending use.
pub fn verify_dominance(ssa: &SsaFunction, dominators: &DominatorTree) -> Result<()> {
    let defs = ssa.definitions();
    let lookup = |var: SsaVarId| -> Result<DefSite> {
        defs.get(var.index())
            .copied()
            .flatten()
            .ok_or_else(|| Error::SsaViolation(format!("{var} is used but never defined")))
    };

    for block in ssa.blocks() {
        let block_id = block.id();
        if !dominators.is_reachable(NodeId::new(block_id)) {
            continue;
        }

        for (position, instr) in block.instructions().iter().enumerate() {
            for var in instr.uses() {
                let available = match lookup(var)? {
                    DefSite::Argument(_) => true,
                    DefSite::Phi { block: def_block, .. } => {
                        dominators.dominates(NodeId::new(def_block), NodeId::new(block_id))
                    }
                    DefSite::Instruction {
                        block: def_block,
                        index,
                    } => {
                        if def_block == block_id {
                            index < position
                        } else {
                            dominators
                                .strictly_dominates(NodeId::new(def_block), NodeId::new(block_id))
                        }
                    }
                };
                if !available {
                    return Err(Error::SsaViolation(format!(
                        "{var} used by `{}` in B{block_id} is not dominated by its definition",
                        instr.op()
                    )));
                }
            }
        }

        for phi in block.phi_nodes() {
            for operand in phi.operands() {
                let pred = NodeId::new(operand.predecessor());
                if !dominators.is_reachable(pred) {
                    continue;
                }
                let available = match lookup(operand.value())? {
                    DefSite::Argument(_) => true,
                    DefSite::Phi { block: def_block, .. }
                    | DefSite::Instruction {
                        block: def_block, ..
                    } => dominators.dominates(NodeId::new(def_block), pred),
                };
                if !available {
                    return Err(Error::SsaViolation(format!(
                        "{} flowing into `{phi}` from {pred} is not dominated by its definition",
                        operand.value()
                    )));
                }
            }
        }
    }

    Ok(())
}
