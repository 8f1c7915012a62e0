//! Generators for ordinary (non-control) statement blocks.
//!
//! Each one reads its parameters through the value resolver, so a slot can be
//! fed either by the block's own field or by an attached value block. Defaults
//! match the editor's block definitions.

use super::step::{Step, StepBuilder};
use super::Compiler;
use crate::error::CompileResult;
use crate::workspace::Block;

impl Compiler<'_> {
    /// Builder for a step originating from `block`, with configured hooks applied.
    fn step(&self, block: &Block, step_name: &str, main_func_name: &str) -> StepBuilder {
        let builder = Step::builder(block.id.clone(), step_name, main_func_name);
        match self.options.hooks.get(main_func_name) {
            Some(hooks) => builder.hooks(hooks),
            None => builder,
        }
    }

    /// `set_laser_power_block`: `POWER` (default 10), `CHANNEL` (default "LED").
    pub(crate) fn set_laser_power(&self, block: &Block) -> CompileResult<Step> {
        let power = self.number_param(block, "POWER", 10.0)?;
        let channel = self.text_param(block, "CHANNEL", "LED")?;
        Ok(self
            .step(block, "Set Laser Power", "set_laser_power")
            .param("power", power)
            .param("channel", channel)
            .build())
    }

    /// `wait_time_block`: `SECONDS` (default 1).
    pub(crate) fn wait_time(&self, block: &Block) -> CompileResult<Step> {
        let seconds = self.number_param(block, "SECONDS", 1.0)?;
        Ok(self
            .step(block, "Wait Time", "wait_time")
            .param("seconds", seconds)
            .build())
    }

    /// `acquire_frame_block`: `CHANNEL` (default "Mono").
    pub(crate) fn acquire_frame(&self, block: &Block) -> CompileResult<Step> {
        let channel = self.text_param(block, "CHANNEL", "Mono")?;
        Ok(self
            .step(block, "Acquire Frame", "acquire_frame")
            .param("channel", channel)
            .build())
    }

    /// `move_stage_block`: `X`, `Y`, `Z` (each default 0).
    pub(crate) fn move_stage(&self, block: &Block) -> CompileResult<Step> {
        let x = self.number_param(block, "X", 0.0)?;
        let y = self.number_param(block, "Y", 0.0)?;
        let z = self.number_param(block, "Z", 0.0)?;
        Ok(self
            .step(block, "Move Stage", "move_stage")
            .param("x", x)
            .param("y", y)
            .param("z", z)
            .build())
    }
}
