//! Loader for the editor's JSON workspace serialization.
//!
//! ```json
//! { "blocks": { "languageVersion": 0, "blocks": [
//!     { "type": "wait_time_block", "id": "a", "x": 20, "y": 40,
//!       "fields": { "SECONDS": 2 },
//!       "next": { "block": { "type": "acquire_frame_block", "id": "b" } } }
//! ] } }
//! ```
//!
//! Nested blocks are flattened into a [`Workspace`]. Type tags are validated
//! here, so an unknown block never makes it into a loaded workspace.

use super::block::{Block, BlockId, FieldValue, Workspace};
use crate::compiler::BlockKind;
use crate::error::{CompileError, CompileResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Order in which top-level chains are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopBlockOrder {
    /// Top to bottom on the canvas, with a slight left-to-right tilt
    #[default]
    Position,
    /// As listed in the file
    AsListed,
}

#[derive(Debug, Deserialize)]
struct SerializedWorkspace {
    #[serde(default)]
    blocks: Option<SerializedBlocks>,
}

#[derive(Debug, Deserialize)]
struct SerializedBlocks {
    #[serde(default)]
    blocks: Vec<SerializedBlock>,
}

#[derive(Debug, Deserialize)]
struct SerializedBlock {
    #[serde(rename = "type")]
    block_type: String,
    id: BlockId,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    fields: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    inputs: BTreeMap<String, SerializedConnection>,
    #[serde(default)]
    next: Option<SerializedConnection>,
}

/// A connection holds a real block, a shadow, or both; the real block wins.
#[derive(Debug, Deserialize)]
struct SerializedConnection {
    #[serde(default)]
    block: Option<Box<SerializedBlock>>,
    #[serde(default)]
    shadow: Option<Box<SerializedBlock>>,
}

impl SerializedConnection {
    fn into_target(self) -> Option<SerializedBlock> {
        self.block.or(self.shadow).map(|b| *b)
    }
}

/// Parse a serialized workspace.
pub fn parse_workspace(json: &str, order: TopBlockOrder) -> CompileResult<Workspace> {
    // Chains nest through `next`; the stack grows on demand instead of hitting a depth limit.
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let serialized =
        SerializedWorkspace::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;

    let mut top = serialized.blocks.map(|b| b.blocks).unwrap_or_default();
    if order == TopBlockOrder::Position {
        sort_by_position(&mut top);
    }

    let mut workspace = Workspace::new();
    let mut heads = top.into_iter();
    while let Some(head) = heads.next() {
        if let Err(err) = flatten_chain(head, &mut workspace) {
            heads.for_each(|rest| release_chain(Some(rest)));
            return Err(err);
        }
    }
    tracing::debug!(blocks = workspace.blocks().count(), "Loaded workspace");
    Ok(workspace)
}

/// Read and parse a serialized workspace file.
pub fn load_workspace_file(path: impl AsRef<Path>, order: TopBlockOrder) -> CompileResult<Workspace> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "Loading workspace");
    let json = std::fs::read_to_string(path)?;
    parse_workspace(&json, order)
}

fn sort_by_position(blocks: &mut [SerializedBlock]) {
    let tilt = 3f64.to_radians().sin();
    blocks.sort_by(|a, b| (a.y + tilt * a.x).total_cmp(&(b.y + tilt * b.x)));
}

/// Flatten a chain iteratively, recursing only into inputs.
fn flatten_chain(head: SerializedBlock, workspace: &mut Workspace) -> CompileResult<BlockId> {
    let head_id = head.id.clone();
    let mut current = Some(head);

    while let Some(mut raw) = current.take() {
        let next = raw.next.take().and_then(SerializedConnection::into_target);
        let next_id = next.as_ref().map(|b| b.id.clone());

        let inserted = flatten_block(raw, workspace).and_then(|mut block| {
            block.next = next_id;
            workspace.insert(block)
        });
        if let Err(err) = inserted {
            release_chain(next);
            return Err(err);
        }

        current = next;
    }
    Ok(head_id)
}

/// Drop an unflattened chain link by link; the default drop recurses once per block.
fn release_chain(mut current: Option<SerializedBlock>) {
    while let Some(mut raw) = current.take() {
        current = raw.next.take().and_then(SerializedConnection::into_target);
    }
}

fn flatten_block(mut raw: SerializedBlock, workspace: &mut Workspace) -> CompileResult<Block> {
    let mut inputs = std::mem::take(&mut raw.inputs).into_iter();
    let block = build_block(raw, &mut inputs, workspace);
    if block.is_err() {
        inputs.for_each(|(_, connection)| release_chain(connection.into_target()));
    }
    block
}

fn build_block(
    raw: SerializedBlock,
    inputs: &mut impl Iterator<Item = (String, SerializedConnection)>,
    workspace: &mut Workspace,
) -> CompileResult<Block> {
    let kind = BlockKind::from_type_tag(&raw.block_type).ok_or_else(|| {
        CompileError::UnknownBlockType {
            block_type: raw.block_type.clone(),
            block_id: raw.id.clone(),
        }
    })?;

    let mut block = Block::new(raw.id, raw.block_type);
    for (name, value) in raw.fields {
        let field = field_value(&block.id, &name, value)?;
        block.fields.insert(name, field);
    }

    for (slot, connection) in inputs {
        let Some(child) = connection.into_target() else {
            continue;
        };
        let child_id = flatten_chain(child, workspace)?;
        if kind.statement_inputs().contains(&slot.as_str()) {
            block.statement_inputs.insert(slot, child_id);
        } else {
            block.value_inputs.insert(slot, child_id);
        }
    }
    Ok(block)
}

fn field_value(block_id: &str, name: &str, value: serde_json::Value) -> CompileResult<FieldValue> {
    let malformed = |value: String| CompileError::MalformedLiteral {
        block_id: block_id.to_string(),
        field: name.to_string(),
        value,
    };
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(FieldValue::Number)
            .ok_or_else(|| malformed(n.to_string())),
        serde_json::Value::String(s) => Ok(FieldValue::Text(s)),
        serde_json::Value::Bool(b) => Ok(FieldValue::Bool(b)),
        other => Err(malformed(other.to_string())),
    }
}
