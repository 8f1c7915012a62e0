//! Closed catalog of block kinds and the generator dispatch over them.
//!
//! Type tags come from the editor as strings. They are mapped onto
//! [`BlockKind`] once; from there every generator is reached through an
//! exhaustive `match`, so adding a kind without a generator does not compile.

use super::step::{Scalar, Step};
use super::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::workspace::Block;

/// Every block type the compiler knows how to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `set_laser_power_block`
    SetLaserPower,
    /// `wait_time_block`
    WaitTime,
    /// `acquire_frame_block`
    AcquireFrame,
    /// `move_stage_block`
    MoveStage,
    /// Repeat with the count in a value input
    RepeatExt,
    /// Repeat with the count in a field
    Repeat,
    /// Numeric literal
    MathNumber,
    /// Named constant such as `PI`
    MathConstant,
    /// Binary arithmetic
    MathArithmetic,
    /// Unary math function
    MathSingle,
    /// Rounding
    MathRound,
    /// Text literal
    Text,
}

/// How a kind participates in the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockCategory {
    /// Chainable, compiles to exactly one step
    Statement,
    /// Chainable, compiles to zero or more steps
    Control,
    /// Produces a scalar, never chained
    Value,
}

/// What compiling a single block yields.
#[derive(Clone, Debug, PartialEq)]
pub enum Fragment {
    /// One step from an ordinary statement block
    Step(Step),
    /// Zero or more steps from a control block
    Steps(Vec<Step>),
    /// A scalar from a value block
    Value(Scalar),
}

impl BlockKind {
    /// Every kind, in catalog order.
    pub const ALL: [BlockKind; 12] = [
        BlockKind::SetLaserPower,
        BlockKind::WaitTime,
        BlockKind::AcquireFrame,
        BlockKind::MoveStage,
        BlockKind::RepeatExt,
        BlockKind::Repeat,
        BlockKind::MathNumber,
        BlockKind::MathConstant,
        BlockKind::MathArithmetic,
        BlockKind::MathSingle,
        BlockKind::MathRound,
        BlockKind::Text,
    ];

    /// The editor's type tag for this kind.
    pub fn type_tag(self) -> &'static str {
        match self {
            BlockKind::SetLaserPower => "set_laser_power_block",
            BlockKind::WaitTime => "wait_time_block",
            BlockKind::AcquireFrame => "acquire_frame_block",
            BlockKind::MoveStage => "move_stage_block",
            BlockKind::RepeatExt => "controls_repeat_ext",
            BlockKind::Repeat => "controls_repeat",
            BlockKind::MathNumber => "math_number",
            BlockKind::MathConstant => "math_constant",
            BlockKind::MathArithmetic => "math_arithmetic",
            BlockKind::MathSingle => "math_single",
            BlockKind::MathRound => "math_round",
            BlockKind::Text => "text",
        }
    }

    /// Kind for an editor type tag, if registered.
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_tag() == tag)
    }

    /// Classify a block, failing on an unregistered type tag.
    pub fn of(block: &Block) -> CompileResult<Self> {
        Self::from_type_tag(&block.block_type).ok_or_else(|| CompileError::UnknownBlockType {
            block_type: block.block_type.clone(),
            block_id: block.id.clone(),
        })
    }

    /// How this kind participates in the program.
    pub fn category(self) -> BlockCategory {
        match self {
            BlockKind::SetLaserPower
            | BlockKind::WaitTime
            | BlockKind::AcquireFrame
            | BlockKind::MoveStage => BlockCategory::Statement,
            BlockKind::RepeatExt | BlockKind::Repeat => BlockCategory::Control,
            BlockKind::MathNumber
            | BlockKind::MathConstant
            | BlockKind::MathArithmetic
            | BlockKind::MathSingle
            | BlockKind::MathRound
            | BlockKind::Text => BlockCategory::Value,
        }
    }

    /// Input slots that hold nested statement chains rather than values.
    pub fn statement_inputs(self) -> &'static [&'static str] {
        match self {
            BlockKind::RepeatExt | BlockKind::Repeat => &["DO"],
            _ => &[],
        }
    }
}

impl Compiler<'_> {
    /// Compile one block (not its successors) to a fragment.
    pub fn compile_block(&self, block: &Block) -> CompileResult<Fragment> {
        let fragment = match BlockKind::of(block)? {
            BlockKind::SetLaserPower => Fragment::Step(self.set_laser_power(block)?),
            BlockKind::WaitTime => Fragment::Step(self.wait_time(block)?),
            BlockKind::AcquireFrame => Fragment::Step(self.acquire_frame(block)?),
            BlockKind::MoveStage => Fragment::Step(self.move_stage(block)?),
            BlockKind::RepeatExt => {
                let count = self.resolve_number_input(block, "TIMES")?;
                Fragment::Steps(self.unroll(block, count)?)
            }
            BlockKind::Repeat => {
                let count = self.number_field(block, "TIMES")?;
                Fragment::Steps(self.unroll(block, count)?)
            }
            BlockKind::MathNumber => Fragment::Value(self.math_number(block)?),
            BlockKind::MathConstant => Fragment::Value(self.math_constant(block)?),
            BlockKind::MathArithmetic => Fragment::Value(self.math_arithmetic(block)?),
            BlockKind::MathSingle => Fragment::Value(self.math_single(block)?),
            BlockKind::MathRound => Fragment::Value(self.math_round(block)?),
            BlockKind::Text => Fragment::Value(self.text(block)),
        };
        Ok(fragment)
    }
}
