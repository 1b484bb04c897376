//! Arena of basic blocks under construction.
//!
//! Blocks are addressed by [`BlockRef`] labels. A label can be reserved long
//! before its block is filled, which lets a `SwitchInt` name case blocks that
//! do not exist yet. A block only receives its final `bbN` number when it is
//! placed, so the numbering follows emission order rather than reservation order.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::LoweringError;
use crate::ir::{BasicBlock, BasicBlockId, FunctionReference, Operand, Place, Statement, Terminator};

/// A label for a block that may not have been placed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef(u32);

/// A terminator whose targets are still labels.
#[derive(Debug, Clone)]
pub enum PendingTerminator {
    GoTo(BlockRef),
    SwitchInt {
        operand: Operand,
        cases: IndexMap<u64, BlockRef>,
        otherwise: BlockRef,
    },
    MethodCall {
        function: FunctionReference,
        arguments: Vec<Operand>,
        destination: Place,
        goto_after: BlockRef,
    },
    Return,
}

impl PendingTerminator {
    fn targets(&self) -> Vec<BlockRef> {
        match self {
            PendingTerminator::GoTo(target) => vec![*target],
            PendingTerminator::SwitchInt { cases, otherwise, .. } => {
                cases.values().copied().chain(std::iter::once(*otherwise)).collect()
            }
            PendingTerminator::MethodCall { goto_after, .. } => vec![*goto_after],
            PendingTerminator::Return => Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct PendingBlock {
    statements: Vec<Statement>,
    terminator: Option<PendingTerminator>,
    position: Option<u32>,
}

#[derive(Debug)]
pub struct BlockBuilder {
    blocks: Vec<PendingBlock>,
    /// Labels that were merged into another block before being placed
    aliases: FxHashMap<BlockRef, BlockRef>,
    /// Placed labels, in placement order
    order: Vec<BlockRef>,
    current: BlockRef,
}

impl BlockBuilder {
    /// A builder whose current block is the entry block `bb0`.
    pub fn new() -> Self {
        let mut builder = Self {
            blocks: Vec::new(),
            aliases: FxHashMap::default(),
            order: Vec::new(),
            current: BlockRef(0),
        };
        let entry = builder.reserve();
        builder.order.push(entry);
        builder.blocks[0].position = Some(0);
        builder
    }

    pub fn reserve(&mut self) -> BlockRef {
        let label = BlockRef(self.blocks.len() as u32);
        self.blocks.push(PendingBlock::default());
        label
    }

    /// Gives `label` the next block number and makes it the current block.
    pub fn place(&mut self, label: BlockRef) -> Result<(), LoweringError> {
        let label = self.resolve(label);
        let position = self.order.len() as u32;
        let block = self.block_mut(label)?;
        if block.position.is_some() {
            return Err(LoweringError::Internal(format!("block {label:?} placed twice")));
        }
        block.position = Some(position);
        self.order.push(label);
        self.current = label;
        Ok(())
    }

    pub fn current(&self) -> BlockRef {
        self.current
    }

    /// Whether the current block still accepts statements.
    pub fn is_open(&self) -> bool {
        self.current_block().is_some_and(|b| b.terminator.is_none())
    }

    /// Whether the current block holds no statements yet.
    pub fn is_empty(&self) -> bool {
        self.current_block().is_some_and(|b| b.statements.is_empty())
    }

    pub fn is_placed(&self, label: BlockRef) -> bool {
        let label = self.resolve(label);
        self.blocks.get(label.0 as usize).is_some_and(|b| b.position.is_some())
    }

    /// Whether any terminator emitted so far jumps to `label`.
    pub fn is_referenced(&self, label: BlockRef) -> bool {
        let label = self.resolve(label);
        self.blocks
            .iter()
            .filter_map(|b| b.terminator.as_ref())
            .flat_map(PendingTerminator::targets)
            .any(|target| self.resolve(target) == label)
    }

    /// Whether the current block ends with a jump to `label` and no other
    /// terminator targets it.
    pub fn only_current_jumps_to(&self, label: BlockRef) -> bool {
        let label = self.resolve(label);
        let current_jumps = matches!(
            self.current_block().and_then(|b| b.terminator.as_ref()),
            Some(PendingTerminator::GoTo(target)) if self.resolve(*target) == label
        );
        let references = self
            .blocks
            .iter()
            .filter_map(|b| b.terminator.as_ref())
            .flat_map(PendingTerminator::targets)
            .filter(|target| self.resolve(*target) == label)
            .count();
        current_jumps && references == 1
    }

    /// Replaces the terminator of the current block.
    pub fn replace_terminator(&mut self, terminator: PendingTerminator) -> Result<(), LoweringError> {
        let current = self.current;
        self.block_mut(current)?.terminator = Some(terminator);
        Ok(())
    }

    /// Makes every jump to the unplaced `from` land on `to` instead.
    pub fn alias(&mut self, from: BlockRef, to: BlockRef) -> Result<(), LoweringError> {
        if self.is_placed(from) {
            return Err(LoweringError::Internal(format!("cannot alias placed block {from:?}")));
        }
        let to = self.resolve(to);
        if from != to {
            self.aliases.insert(from, to);
        }
        Ok(())
    }

    pub fn push(&mut self, statement: Statement) -> Result<(), LoweringError> {
        self.ensure_open()?;
        let current = self.current;
        self.block_mut(current)?.statements.push(statement);
        Ok(())
    }

    pub fn terminate(&mut self, terminator: PendingTerminator) -> Result<(), LoweringError> {
        self.ensure_open()?;
        let current = self.current;
        self.block_mut(current)?.terminator = Some(terminator);
        Ok(())
    }

    /// Jumps to `target` unless the current block already ended.
    pub fn goto_if_open(&mut self, target: BlockRef) -> Result<(), LoweringError> {
        if self.is_open() {
            self.terminate(PendingTerminator::GoTo(target))?;
        }
        Ok(())
    }

    /// Numbers the placed blocks and resolves every label.
    pub fn finish(self) -> Result<Vec<BasicBlock>, LoweringError> {
        let mut result = Vec::with_capacity(self.order.len());
        for (position, label) in self.order.iter().enumerate() {
            let block = &self.blocks[label.0 as usize];
            let terminator = block
                .terminator
                .as_ref()
                .ok_or_else(|| LoweringError::Internal(format!("block bb{position} has no terminator")))?;
            result.push(BasicBlock {
                id: BasicBlockId(position as u32),
                statements: block.statements.clone(),
                terminator: self.resolve_terminator(terminator)?,
            });
        }
        log::trace!("finished {} basic blocks", result.len());
        Ok(result)
    }

    fn resolve_terminator(&self, terminator: &PendingTerminator) -> Result<Terminator, LoweringError> {
        Ok(match terminator {
            PendingTerminator::GoTo(target) => Terminator::GoTo(self.block_id(*target)?),
            PendingTerminator::SwitchInt {
                operand,
                cases,
                otherwise,
            } => Terminator::SwitchInt {
                operand: operand.clone(),
                cases: cases
                    .iter()
                    .map(|(value, target)| Ok((*value, self.block_id(*target)?)))
                    .collect::<Result<_, LoweringError>>()?,
                otherwise: self.block_id(*otherwise)?,
            },
            PendingTerminator::MethodCall {
                function,
                arguments,
                destination,
                goto_after,
            } => Terminator::MethodCall {
                function: function.clone(),
                arguments: arguments.clone(),
                destination: destination.clone(),
                goto_after: self.block_id(*goto_after)?,
            },
            PendingTerminator::Return => Terminator::Return,
        })
    }

    fn block_id(&self, label: BlockRef) -> Result<BasicBlockId, LoweringError> {
        let label = self.resolve(label);
        self.blocks
            .get(label.0 as usize)
            .and_then(|b| b.position)
            .map(BasicBlockId)
            .ok_or_else(|| LoweringError::Internal(format!("jump to block {label:?} that was never placed")))
    }

    fn resolve(&self, mut label: BlockRef) -> BlockRef {
        while let Some(target) = self.aliases.get(&label) {
            label = *target;
        }
        label
    }

    /// Statements after a terminator are unreachable; they go to a fresh block.
    fn ensure_open(&mut self) -> Result<(), LoweringError> {
        if !self.is_open() {
            let fresh = self.reserve();
            self.place(fresh)?;
        }
        Ok(())
    }

    fn current_block(&self) -> Option<&PendingBlock> {
        self.blocks.get(self.current.0 as usize)
    }

    fn block_mut(&mut self, label: BlockRef) -> Result<&mut PendingBlock, LoweringError> {
        self.blocks
            .get_mut(label.0 as usize)
            .ok_or_else(|| LoweringError::Internal(format!("unknown block {label:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_numbered_in_placement_order() -> Result<(), LoweringError> {
        let mut blocks = BlockBuilder::new();
        let late = blocks.reserve();
        let early = blocks.reserve();
        blocks.terminate(PendingTerminator::GoTo(early))?;
        blocks.place(early)?;
        blocks.terminate(PendingTerminator::GoTo(late))?;
        blocks.place(late)?;
        blocks.terminate(PendingTerminator::Return)?;

        let finished = blocks.finish()?;
        assert_eq!(finished.len(), 3);
        assert_eq!(finished[0].terminator, Terminator::GoTo(BasicBlockId(1)));
        assert_eq!(finished[1].terminator, Terminator::GoTo(BasicBlockId(2)));
        assert_eq!(finished[2].terminator, Terminator::Return);
        Ok(())
    }

    #[test]
    fn aliased_labels_resolve_to_their_target() -> Result<(), LoweringError> {
        let mut blocks = BlockBuilder::new();
        let exit = blocks.reserve();
        let body = blocks.reserve();
        blocks.terminate(PendingTerminator::SwitchInt {
            operand: Operand::BoolConstant(true),
            cases: IndexMap::from([(0, exit)]),
            otherwise: body,
        })?;
        blocks.place(body)?;
        blocks.alias(exit, body)?;
        blocks.terminate(PendingTerminator::Return)?;

        let finished = blocks.finish()?;
        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].terminator.successors(), vec![BasicBlockId(1), BasicBlockId(1)]);
        Ok(())
    }

    #[test]
    fn unplaced_targets_are_reported() {
        let mut blocks = BlockBuilder::new();
        let nowhere = blocks.reserve();
        blocks.terminate(PendingTerminator::GoTo(nowhere)).unwrap();
        assert!(matches!(blocks.finish(), Err(LoweringError::Internal(_))));
    }

    #[test]
    fn unterminated_blocks_are_reported() {
        let blocks = BlockBuilder::new();
        assert!(matches!(blocks.finish(), Err(LoweringError::Internal(_))));
    }

    #[test]
    fn statements_after_a_terminator_open_a_new_block() -> Result<(), LoweringError> {
        let mut blocks = BlockBuilder::new();
        blocks.terminate(PendingTerminator::Return)?;
        assert!(!blocks.is_open());
        blocks.push(Statement::Assign(
            Place::local("_local0"),
            crate::ir::Rvalue::Use(Operand::UnitConstant),
        ))?;
        assert!(blocks.is_open());
        assert!(!blocks.is_empty());
        blocks.terminate(PendingTerminator::Return)?;
        assert_eq!(blocks.finish()?.len(), 2);
        Ok(())
    }
}
