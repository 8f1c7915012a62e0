//! CLI Entry Point for the workflow compiler
//!
//! Provides command-line interface for:
//! - Compiling a saved editor workspace into a step document
//! - Checking that a workspace compiles without writing anything
//!
//! # Usage
//!
//! Compile to stdout:
//! ```bash
//! workflow-compiler compile experiment.json
//! ```
//!
//! Compile to a file with indexed loop ids:
//! ```bash
//! workflow-compiler compile experiment.json -o steps.json --indexed-ids
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use workflow_compiler::{
    compile_workspace_with_options, config::CompilerConfig, load_workspace_file, tracing_setup,
    CompileOptions, Document, IterationIds,
};

#[derive(Parser)]
#[command(name = "workflow-compiler")]
#[command(about = "Compile block-editor workspaces into microscope step documents", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/workflow_compiler.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a workspace and write the step document
    Compile {
        /// Path to the serialized workspace (.json)
        workspace: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Give unrolled loop copies distinct ids (`id#i.j`)
        #[arg(long)]
        indexed_ids: bool,

        /// Override the maximum number of emitted steps
        #[arg(long)]
        max_steps: Option<usize>,
    },

    /// Compile a workspace and report the step count without writing
    Check {
        /// Path to the serialized workspace (.json)
        workspace: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    tracing_setup::init_from_config(&config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Compile {
            workspace,
            output,
            indexed_ids,
            max_steps,
        } => {
            let mut options = config.compile_options();
            if indexed_ids {
                options = options.with_iteration_ids(IterationIds::Indexed);
            }
            if let Some(max_steps) = max_steps {
                if max_steps == 0 {
                    bail!("--max-steps must be at least 1");
                }
                options = options.with_max_steps(max_steps);
            }
            let document = compile_file(&workspace, &config, &options)?;
            write_document(&document, output.as_deref())
        }
        Commands::Check { workspace } => {
            let document = compile_file(&workspace, &config, &config.compile_options())?;
            println!(
                "✅ {} compiles to {} step(s)",
                workspace.display(),
                document.len()
            );
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            CompilerConfig::load_from(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => CompilerConfig::load().context("Failed to load configuration"),
    }
}

fn compile_file(path: &Path, config: &CompilerConfig, options: &CompileOptions) -> Result<Document> {
    let workspace = load_workspace_file(path, config.workspace.top_block_order)
        .with_context(|| format!("Failed to load workspace {}", path.display()))?;
    compile_workspace_with_options(&workspace, options)
        .with_context(|| format!("Failed to compile workspace {}", path.display()))
}

fn write_document(document: &Document, output: Option<&Path>) -> Result<()> {
    let json = document
        .to_json_pretty()
        .context("Failed to serialize step document")?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), steps = document.len(), "Wrote step document");
        }
        None => println!("{json}"),
    }
    Ok(())
}
