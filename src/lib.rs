//! # Workflow Compiler Library
//!
//! Compiles the block graph of a visual experiment editor into the flat step
//! document a microscope execution engine runs. Nothing is executed here: the
//! compiler is a pure function from a workspace to a [`Document`].
//!
//! ## Crate Structure
//!
//! - **`workspace`**: The block graph model ([`Workspace`], [`BlockGraph`]) and the
//!   loader for the editor's JSON serialization.
//! - **`compiler`**: Generator registry, value resolution, chain compilation, loop
//!   unrolling and document assembly.
//! - **`config`**: Figment-backed configuration (step limit, id policy, hooks, logging).
//! - **`error`**: The [`CompileError`] enum shared by every stage.
//! - **`tracing_setup`**: Subscriber initialization for the CLI and embedding hosts.
//!
//! ## Example
//! ```
//! use workflow_compiler::{compile_workspace, parse_workspace, TopBlockOrder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let json = r#"{"blocks": {"languageVersion": 0, "blocks": [
//!     {"type": "wait_time_block", "id": "w1", "fields": {"SECONDS": 2}}
//! ]}}"#;
//! let workspace = parse_workspace(json, TopBlockOrder::Position)?;
//! let document = compile_workspace(&workspace)?;
//! assert_eq!(document.steps[0].main_func_name, "wait_time");
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod tracing_setup;
pub mod workspace;

pub use compiler::{
    compile_to_json, compile_workspace, compile_workspace_with_options, CompileOptions, Document,
    IterationIds, Step,
};
pub use config::CompilerConfig;
pub use error::{CompileError, CompileResult};
pub use workspace::{
    load_workspace_file, parse_workspace, Block, BlockGraph, TopBlockOrder, Workspace,
};
