//! In-memory block graph: blocks, field literals and the owning workspace.

use crate::error::{CompileError, CompileResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Editor-assigned block identifier.
pub type BlockId = String;

/// Literal stored directly in a block field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric field (`field_number`)
    Number(f64),
    /// Free text or dropdown choice
    Text(String),
    /// Checkbox field
    Bool(bool),
}

impl FieldValue {
    /// Render the literal as the editor would display it.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(true) => "TRUE".to_string(),
            FieldValue::Bool(false) => "FALSE".to_string(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// A node in the visual program.
///
/// Children are referenced by id; the [`Workspace`] owns every block.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Stable id, reused verbatim as the step id
    pub id: BlockId,
    /// Type tag selecting the generator
    pub block_type: String,
    /// Literals embedded in the block
    pub fields: BTreeMap<String, FieldValue>,
    /// Slot name -> attached value block
    pub value_inputs: BTreeMap<String, BlockId>,
    /// Slot name -> head of a nested statement chain
    pub statement_inputs: BTreeMap<String, BlockId>,
    /// Next block in this block's chain
    pub next: Option<BlockId>,
}

impl Block {
    /// Create a block with no fields, inputs or successor.
    pub fn new(id: impl Into<BlockId>, block_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            fields: BTreeMap::new(),
            value_inputs: BTreeMap::new(),
            statement_inputs: BTreeMap::new(),
            next: None,
        }
    }

    /// Set a field literal.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Attach a value block to a slot.
    pub fn with_value_input(mut self, slot: impl Into<String>, child: impl Into<BlockId>) -> Self {
        self.value_inputs.insert(slot.into(), child.into());
        self
    }

    /// Attach the head of a nested statement chain to a slot.
    pub fn with_statement_input(
        mut self,
        slot: impl Into<String>,
        head: impl Into<BlockId>,
    ) -> Self {
        self.statement_inputs.insert(slot.into(), head.into());
        self
    }

    /// Link the next block of the chain.
    pub fn with_next(mut self, next: impl Into<BlockId>) -> Self {
        self.next = Some(next.into());
        self
    }

    /// Field literal by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Every block id this block points at.
    fn references(&self) -> impl Iterator<Item = &BlockId> {
        self.value_inputs
            .values()
            .chain(self.statement_inputs.values())
            .chain(self.next.iter())
    }
}

/// Read access to a block graph.
///
/// The compiler only reads through this trait and never mutates the graph.
pub trait BlockGraph {
    /// Look up a block by id.
    fn block(&self, id: &str) -> Option<&Block>;

    /// Heads of the independent top-level chains, in editor order.
    fn top_block_ids(&self) -> Vec<BlockId>;

    /// Total number of blocks in the graph.
    fn block_count(&self) -> usize;

    /// Look up a block that `from` refers to, failing on a dangling id.
    fn resolve(&self, from: &str, id: &str) -> CompileResult<&Block> {
        self.block(id).ok_or_else(|| CompileError::DanglingReference {
            from: from.to_string(),
            to: id.to_string(),
        })
    }
}

/// The complete program graph as reported by the editor.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    blocks: HashMap<BlockId, Block>,
    order: Vec<BlockId>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block. Ids must be unique.
    pub fn insert(&mut self, block: Block) -> CompileResult<()> {
        if self.blocks.contains_key(&block.id) {
            return Err(CompileError::DuplicateBlockId(block.id));
        }
        self.order.push(block.id.clone());
        self.blocks.insert(block.id.clone(), block);
        Ok(())
    }

    /// Build a workspace from blocks in editor order.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> CompileResult<Self> {
        let mut workspace = Self::new();
        for block in blocks {
            workspace.insert(block)?;
        }
        Ok(workspace)
    }

    /// Whether the workspace holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.order.iter().filter_map(|id| self.blocks.get(id))
    }
}

impl BlockGraph for Workspace {
    fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    fn top_block_ids(&self) -> Vec<BlockId> {
        let referenced: HashSet<&BlockId> =
            self.blocks.values().flat_map(|block| block.references()).collect();
        self.order
            .iter()
            .filter(|id| !referenced.contains(id))
            .cloned()
            .collect()
    }

    fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
