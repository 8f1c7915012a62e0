//! Block graph model and the editor workspace loader.

pub mod block;
pub mod blockly;

pub use block::{Block, BlockGraph, BlockId, FieldValue, Workspace};
pub use blockly::{load_workspace_file, parse_workspace, TopBlockOrder};
