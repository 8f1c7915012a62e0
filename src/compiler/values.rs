//! Value resolution: literals, named constants and arithmetic expressions.
//!
//! Policy for bad input is to reject. Text that does not parse as a number is
//! `MalformedLiteral`; anything that evaluates to NaN or an infinity is
//! `NonFiniteValue`. Neither ever reaches a parameter map.

use super::registry::{BlockCategory, BlockKind, Fragment};
use super::step::Scalar;
use super::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::workspace::{Block, BlockGraph, FieldValue};

/// Parse a numeric field literal. Blank text counts as absent.
pub fn parse_number(block_id: &str, field: &str, value: &FieldValue) -> CompileResult<Option<f64>> {
    let malformed = || CompileError::MalformedLiteral {
        block_id: block_id.to_string(),
        field: field.to_string(),
        value: value.as_text(),
    };

    let number = match value {
        FieldValue::Number(n) => *n,
        FieldValue::Text(text) if text.trim().is_empty() => return Ok(None),
        FieldValue::Text(text) => text.trim().parse::<f64>().map_err(|_| malformed())?,
        FieldValue::Bool(_) => return Err(malformed()),
    };

    // "NaN" and "inf" parse successfully but are not usable literals.
    if number.is_finite() {
        Ok(Some(number))
    } else {
        Err(malformed())
    }
}

fn finite(block: &Block, slot: &str, value: f64) -> CompileResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CompileError::NonFiniteValue {
            block_id: block.id.clone(),
            slot: slot.to_string(),
        })
    }
}

/// Round half up, the way the editor's runtime does (`-2.5` -> `-2`).
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

impl Compiler<'_> {
    /// Resolve a value block to a scalar.
    pub fn resolve_value(&self, block: &Block) -> CompileResult<Scalar> {
        let kind = BlockKind::of(block)?;
        if kind.category() != BlockCategory::Value {
            return Err(CompileError::ExpectedValueBlock {
                block_id: block.id.clone(),
                block_type: block.block_type.clone(),
            });
        }
        match self.compile_block(block)? {
            Fragment::Value(scalar) => Ok(scalar),
            Fragment::Step(_) | Fragment::Steps(_) => Err(CompileError::ExpectedValueBlock {
                block_id: block.id.clone(),
                block_type: block.block_type.clone(),
            }),
        }
    }

    /// Resolve whatever is attached to a value slot; `None` when the slot is empty.
    pub fn resolve_input(&self, block: &Block, slot: &str) -> CompileResult<Option<Scalar>> {
        match block.value_inputs.get(slot) {
            Some(child_id) => {
                let child = self.graph.resolve(&block.id, child_id)?;
                self.resolve_value(child).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Resolve a value slot that must be numeric.
    pub fn resolve_number_input(&self, block: &Block, slot: &str) -> CompileResult<Option<f64>> {
        match self.resolve_input(block, slot)? {
            Some(Scalar::Number(n)) => finite(block, slot, n).map(Some),
            Some(Scalar::Text(text)) => parse_number(&block.id, slot, &FieldValue::Text(text)),
            None => Ok(None),
        }
    }

    /// Numeric field literal; `None` when the field is absent or blank.
    pub fn number_field(&self, block: &Block, field: &str) -> CompileResult<Option<f64>> {
        match block.field(field) {
            Some(value) => parse_number(&block.id, field, value),
            None => Ok(None),
        }
    }

    /// Numeric parameter: attached value input, then field, then `default`.
    pub fn number_param(&self, block: &Block, slot: &str, default: f64) -> CompileResult<f64> {
        if let Some(n) = self.resolve_number_input(block, slot)? {
            return Ok(n);
        }
        Ok(self.number_field(block, slot)?.unwrap_or(default))
    }

    /// Text parameter: attached value input, then field, then `default`.
    pub fn text_param(&self, block: &Block, slot: &str, default: &str) -> CompileResult<String> {
        if let Some(scalar) = self.resolve_input(block, slot)? {
            return Ok(scalar.to_text());
        }
        Ok(block
            .field(slot)
            .map(FieldValue::as_text)
            .unwrap_or_else(|| default.to_string()))
    }

    /// `math_number`: field `NUM`; missing or blank is 0.
    pub(crate) fn math_number(&self, block: &Block) -> CompileResult<Scalar> {
        let n = self.number_field(block, "NUM")?.unwrap_or(0.0);
        Ok(Scalar::Number(n))
    }

    /// `math_constant`: field `CONSTANT`; missing is `PI`.
    pub(crate) fn math_constant(&self, block: &Block) -> CompileResult<Scalar> {
        let name = block
            .field("CONSTANT")
            .map(FieldValue::as_text)
            .unwrap_or_else(|| "PI".to_string());
        let value = match name.as_str() {
            "PI" => std::f64::consts::PI,
            "E" => std::f64::consts::E,
            "GOLDEN_RATIO" => (1.0 + 5f64.sqrt()) / 2.0,
            "SQRT2" => std::f64::consts::SQRT_2,
            "SQRT1_2" => std::f64::consts::FRAC_1_SQRT_2,
            "INFINITY" => f64::INFINITY,
            _ => {
                return Err(CompileError::MalformedLiteral {
                    block_id: block.id.clone(),
                    field: "CONSTANT".to_string(),
                    value: name,
                })
            }
        };
        finite(block, "CONSTANT", value).map(Scalar::Number)
    }

    /// `math_arithmetic`: `A OP B`; empty operands are 0, missing `OP` is `ADD`.
    pub(crate) fn math_arithmetic(&self, block: &Block) -> CompileResult<Scalar> {
        let a = self.resolve_number_input(block, "A")?.unwrap_or(0.0);
        let b = self.resolve_number_input(block, "B")?.unwrap_or(0.0);
        let op = self.operator(block, "ADD");
        let value = match op.as_str() {
            "ADD" => a + b,
            "MINUS" => a - b,
            "MULTIPLY" => a * b,
            "DIVIDE" => a / b,
            "POWER" => a.powf(b),
            _ => return Err(self.malformed_operator(block, op)),
        };
        finite(block, "OP", value).map(Scalar::Number)
    }

    /// `math_single`: unary function of `NUM`; empty is 0, missing `OP` is `ROOT`.
    pub(crate) fn math_single(&self, block: &Block) -> CompileResult<Scalar> {
        let x = self.resolve_number_input(block, "NUM")?.unwrap_or(0.0);
        let op = self.operator(block, "ROOT");
        let value = match op.as_str() {
            "ROOT" => x.sqrt(),
            "ABS" => x.abs(),
            "NEG" => -x,
            "LN" => x.ln(),
            "LOG10" => x.log10(),
            "EXP" => x.exp(),
            "POW10" => 10f64.powf(x),
            _ => return Err(self.malformed_operator(block, op)),
        };
        finite(block, "OP", value).map(Scalar::Number)
    }

    /// `math_round`: rounding of `NUM`; empty is 0, missing `OP` is `ROUND`.
    pub(crate) fn math_round(&self, block: &Block) -> CompileResult<Scalar> {
        let x = self.resolve_number_input(block, "NUM")?.unwrap_or(0.0);
        let op = self.operator(block, "ROUND");
        let value = match op.as_str() {
            "ROUND" => round_half_up(x),
            "ROUNDUP" => x.ceil(),
            "ROUNDDOWN" => x.floor(),
            _ => return Err(self.malformed_operator(block, op)),
        };
        Ok(Scalar::Number(value))
    }

    /// `text`: field `TEXT`; missing is the empty string.
    pub(crate) fn text(&self, block: &Block) -> Scalar {
        Scalar::Text(block.field("TEXT").map(FieldValue::as_text).unwrap_or_default())
    }

    fn operator(&self, block: &Block, default: &str) -> String {
        block
            .field("OP")
            .map(FieldValue::as_text)
            .unwrap_or_else(|| default.to_string())
    }

    fn malformed_operator(&self, block: &Block, op: String) -> CompileError {
        CompileError::MalformedLiteral {
            block_id: block.id.clone(),
            field: "OP".to_string(),
            value: op,
        }
    }
}
