//! Compiler configuration using Figment
//!
//! Configuration is loaded from:
//! 1. `config/workflow_compiler.toml` (base configuration)
//! 2. Environment variables (prefixed with `WORKFLOW_COMPILER_`, nested keys split on `__`)
//!
//! Every section has defaults, so a missing file yields a usable configuration.
//!
//! # Example
//! ```no_run
//! use workflow_compiler::config::CompilerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CompilerConfig::load()?;
//! println!("max steps: {}", config.compiler.max_steps);
//! # Ok(())
//! # }
//! ```

use crate::compiler::{CompileOptions, HookTable, IterationIds, DEFAULT_MAX_STEPS};
use crate::error::{CompileError, CompileResult};
use crate::workspace::TopBlockOrder;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/workflow_compiler.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "WORKFLOW_COMPILER_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Compilation settings
    #[serde(default)]
    pub compiler: CompilerSection,
    /// Workspace loading settings
    #[serde(default)]
    pub workspace: WorkspaceSection,
    /// Pre/post hooks keyed by main operation name
    #[serde(default)]
    pub hooks: HookTable,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Compilation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerSection {
    /// Maximum number of steps in one document
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Id policy for unrolled loop copies
    #[serde(default)]
    pub iteration_ids: IterationIds,
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            iteration_ids: IterationIds::default(),
        }
    }
}

/// Workspace loading settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSection {
    /// How top-level chains are ordered
    #[serde(default)]
    pub top_block_order: TopBlockOrder,
}

// Default value functions
fn default_name() -> String {
    "Workflow Compiler".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl CompilerConfig {
    /// Load configuration from the default file and environment variables
    ///
    /// Example: `WORKFLOW_COMPILER_COMPILER__MAX_STEPS=500`
    pub fn load() -> CompileResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> CompileResult<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate().map_err(CompileError::Configuration)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            ));
        }

        if self.compiler.max_steps == 0 {
            return Err("Invalid max_steps 0. Must be at least 1".to_string());
        }

        for (func, hooks) in &self.hooks {
            if func.trim().is_empty() {
                return Err("Hook table key must not be empty".to_string());
            }
            if let Some(name) = hooks.pre.iter().chain(&hooks.post).find(|n| n.trim().is_empty()) {
                return Err(format!("Empty hook name '{}' for '{}'", name, func));
            }
        }

        Ok(())
    }

    /// Options for a compile run under this configuration
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            max_steps: self.compiler.max_steps,
            iteration_ids: self.compiler.iteration_ids,
            hooks: self.hooks.clone(),
        }
    }
}
