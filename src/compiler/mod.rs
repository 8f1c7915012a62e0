//! # Workspace compiler
//!
//! Turns a block graph into the flat step document the execution engine runs.
//!
//! Compilation is a pure function of the graph:
//!
//! 1. **Top-level chains** - enumerate chain heads in the order the workspace reports
//! 2. **Chains** - compile each block in `next` order ([`Compiler::compile_chain`])
//! 3. **Dispatch** - map each block onto its generator ([`BlockKind`])
//! 4. **Values** - resolve literals and expressions feeding parameters
//! 5. **Unrolling** - materialize repeat blocks N times
//! 6. **Assembly** - wrap every step into one [`Document`]
//!
//! Any failure aborts the whole compile; no partial document is returned.

mod chain;
mod generators;
pub mod registry;
pub mod step;
pub mod unroll;
pub mod values;

pub use registry::{BlockCategory, BlockKind, Fragment};
pub use step::{Document, Params, Scalar, Step, StepBuilder, StepHooks};

use crate::error::{CompileError, CompileResult};
use crate::workspace::BlockGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default cap on emitted steps.
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// How step ids are written for copies produced by loop unrolling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationIds {
    /// Every copy keeps the source block id
    #[default]
    Reuse,
    /// Copies get `{id}#{outer}.{inner}`
    Indexed,
}

/// Hook bundles keyed by `mainFuncName`. Empty unless configured.
pub type HookTable = BTreeMap<String, StepHooks>;

/// Knobs for a compile run.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileOptions {
    /// Maximum number of steps a document may hold
    pub max_steps: usize,
    /// Id policy for unrolled copies
    pub iteration_ids: IterationIds,
    /// Pre/post operations bundled per main operation
    pub hooks: HookTable,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            iteration_ids: IterationIds::Reuse,
            hooks: HookTable::new(),
        }
    }
}

impl CompileOptions {
    /// Override the step limit.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Override the id policy for unrolled copies.
    pub fn with_iteration_ids(mut self, iteration_ids: IterationIds) -> Self {
        self.iteration_ids = iteration_ids;
        self
    }
}

/// Compiles one graph under one set of options.
pub struct Compiler<'a> {
    graph: &'a dyn BlockGraph,
    options: &'a CompileOptions,
}

impl<'a> Compiler<'a> {
    /// Borrow a graph and the options to compile it under.
    pub fn new(graph: &'a dyn BlockGraph, options: &'a CompileOptions) -> Self {
        Self { graph, options }
    }

    /// Compile every top-level chain and assemble the document.
    pub fn compile(&self) -> CompileResult<Document> {
        let heads = self.graph.top_block_ids();
        tracing::info!(
            blocks = self.graph.block_count(),
            chains = heads.len(),
            "Compiling workspace"
        );

        let mut steps = Vec::new();
        for head_id in &heads {
            let head = self.graph.resolve("workspace", head_id)?;
            let chain = self.compile_chain(head)?;
            steps.extend(chain);
            self.check_step_limit(steps.len(), head_id)?;
        }

        let document = Document::assemble(steps, self.options.iteration_ids);
        tracing::info!(steps = document.len(), "Compiled workspace");
        Ok(document)
    }

    fn check_step_limit(&self, emitted: usize, block_id: &str) -> CompileResult<()> {
        if emitted > self.options.max_steps {
            return Err(CompileError::StepLimitExceeded {
                limit: self.options.max_steps,
                block_id: block_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Compile a graph with default options.
pub fn compile_workspace(graph: &dyn BlockGraph) -> CompileResult<Document> {
    compile_workspace_with_options(graph, &CompileOptions::default())
}

/// Compile a graph with explicit options.
pub fn compile_workspace_with_options(
    graph: &dyn BlockGraph,
    options: &CompileOptions,
) -> CompileResult<Document> {
    Compiler::new(graph, options).compile()
}

/// Compile a graph straight to the pretty-printed JSON document.
pub fn compile_to_json(graph: &dyn BlockGraph, options: &CompileOptions) -> CompileResult<String> {
    let document = compile_workspace_with_options(graph, options)?;
    Ok(document.to_json_pretty()?)
}
