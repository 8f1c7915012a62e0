//! Error types for workspace loading and compilation.
//!
//! Every fatal condition the compiler can hit is a variant of `CompileError`.
//! A compile either returns a complete `Document` or one of these; there is no
//! partially built step list to salvage.
//!
//! ## Error Hierarchy
//!
//! - **`UnknownBlockType`**: the graph holds a block whose type tag has no generator.
//! - **`MalformedLiteral`** / **`NonFiniteValue`**: a parameter resolved to text that is
//!   not a number, or to NaN/infinity.
//! - **`DanglingReference`** / **`DuplicateBlockId`**: the graph itself is inconsistent.
//! - **`ExpectedValueBlock`**: a statement block is plugged into a value slot.
//! - **`StepLimitExceeded`**: loop unrolling would emit more steps than allowed.
//! - **`Json`**, **`Io`**, **`Config`**: wrapped errors from loading inputs and settings.

use thiserror::Error;

/// Convenience alias for results using the compiler error type.
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Fatal load or compile failure.
#[derive(Error, Debug)]
pub enum CompileError {
    /// No generator is registered for the block's type tag.
    #[error("Unknown block type '{block_type}' (block {block_id})")]
    UnknownBlockType {
        /// Offending type tag
        block_type: String,
        /// Block carrying it
        block_id: String,
    },

    /// A literal could not be read as the type its slot needs.
    #[error("Malformed literal in field {field} of block {block_id}: {value:?}")]
    MalformedLiteral {
        /// Block holding the literal
        block_id: String,
        /// Field or slot name
        field: String,
        /// Raw text of the literal
        value: String,
    },

    /// A parameter evaluated to NaN or an infinity.
    #[error("Block {block_id} produced a non-finite value for {slot}")]
    NonFiniteValue {
        /// Block whose value was non-finite
        block_id: String,
        /// Slot being resolved
        slot: String,
    },

    /// A link names a block that is not in the graph.
    #[error("Block {from} references missing block {to}")]
    DanglingReference {
        /// Block holding the link
        from: String,
        /// Missing target id
        to: String,
    },

    /// A value slot holds a statement block.
    #[error("Block {block_id} ('{block_type}') is a statement block plugged into a value slot")]
    ExpectedValueBlock {
        /// Misplaced block
        block_id: String,
        /// Its type tag
        block_type: String,
    },

    /// Two blocks share an id.
    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(String),

    /// The document would exceed the configured step count.
    #[error("Step limit of {limit} exceeded while compiling block {block_id}")]
    StepLimitExceeded {
        /// Configured maximum
        limit: usize,
        /// Block being compiled when the limit was hit
        block_id: String,
    },

    /// Workspace text is not valid JSON for the expected shape.
    #[error("Workspace JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration values failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),
}

impl From<figment::Error> for CompileError {
    fn from(value: figment::Error) -> Self {
        CompileError::Config(Box::new(value))
    }
}

impl CompileError {
    /// Id of the block the error is attributed to, when there is one.
    pub fn block_id(&self) -> Option<&str> {
        match self {
            CompileError::UnknownBlockType { block_id, .. }
            | CompileError::MalformedLiteral { block_id, .. }
            | CompileError::NonFiniteValue { block_id, .. }
            | CompileError::ExpectedValueBlock { block_id, .. }
            | CompileError::StepLimitExceeded { block_id, .. } => Some(block_id),
            CompileError::DanglingReference { from, .. } => Some(from),
            CompileError::DuplicateBlockId(id) => Some(id),
            CompileError::Json(_)
            | CompileError::Io(_)
            | CompileError::Config(_)
            | CompileError::Configuration(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_message_names_type_and_block() {
        let err = CompileError::UnknownBlockType {
            block_type: "fire_laser_block".into(),
            block_id: "b7".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fire_laser_block"));
        assert!(msg.contains("b7"));
        assert_eq!(err.block_id(), Some("b7"));
    }

    #[test]
    fn dangling_reference_is_attributed_to_the_referrer() {
        let err = CompileError::DanglingReference {
            from: "loop".into(),
            to: "gone".into(),
        };
        assert_eq!(err.block_id(), Some("loop"));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn wrapped_errors_have_no_block() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CompileError = json_err.into();
        assert!(err.block_id().is_none());
        assert!(err.to_string().starts_with("Workspace JSON error"));
    }
}
