//! Statement chain compilation.

use super::registry::{BlockCategory, BlockKind, Fragment};
use super::step::Step;
use super::Compiler;
use crate::error::CompileResult;
use crate::workspace::{Block, BlockGraph};
use std::collections::HashSet;

impl Compiler<'_> {
    /// Compile `head` and every block after it, in chain order.
    ///
    /// The `next` links must be acyclic; a cycle in the graph is not detected
    /// here and is stopped only by the step limit.
    pub fn compile_chain(&self, head: &Block) -> CompileResult<Vec<Step>> {
        let mut steps = Vec::new();
        let mut current = Some(head);

        while let Some(block) = current {
            if BlockKind::of(block)?.category() == BlockCategory::Value {
                // Never evaluated: its result has nowhere to go.
                tracing::warn!(
                    block_id = %block.id,
                    block_type = %block.block_type,
                    "Value block in statement position contributes no steps"
                );
            } else {
                match self.compile_block(block)? {
                    Fragment::Step(step) => steps.push(step),
                    Fragment::Steps(more) => steps.extend(more),
                    Fragment::Value(_) => {}
                }
            }
            self.check_step_limit(steps.len(), &block.id)?;

            current = match &block.next {
                Some(next_id) => Some(self.graph.resolve(&block.id, next_id)?),
                None => None,
            };
        }

        tracing::debug!(head = %head.id, steps = steps.len(), "Compiled chain");
        Ok(steps)
    }

    /// Check a chain and everything nested in it without emitting steps.
    ///
    /// Catches unknown block types and dangling links; literals are not
    /// evaluated.
    pub(crate) fn validate_chain(&self, head: &Block) -> CompileResult<()> {
        let mut pending = vec![head];
        let mut seen = HashSet::new();
        while let Some(block) = pending.pop() {
            if !seen.insert(block.id.as_str()) {
                continue;
            }
            BlockKind::of(block)?;
            let children = block
                .value_inputs
                .values()
                .chain(block.statement_inputs.values())
                .chain(block.next.iter());
            for child in children {
                pending.push(self.graph.resolve(&block.id, child)?);
            }
        }
        Ok(())
    }
}
