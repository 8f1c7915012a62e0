//! Static unrolling of bounded repeat blocks.
//!
//! The execution engine has no loop construct, so a repeat block becomes its
//! body's steps repeated N times. Nested repeats multiply, which is why every
//! expansion is checked against the step limit before it is materialized.

use super::step::Step;
use super::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::workspace::{Block, BlockGraph};

/// Slot holding the loop body.
const BODY_SLOT: &str = "DO";

/// Trip count from a resolved count value: absent is 0, fractions truncate
/// toward zero, anything below 1 is 0.
pub fn trip_count(count: Option<f64>) -> f64 {
    match count {
        Some(n) if n >= 1.0 => n.trunc(),
        _ => 0.0,
    }
}

impl Compiler<'_> {
    /// Expand a repeat block whose count has already been resolved.
    ///
    /// A zero-trip body emits nothing but is still validated, so an unknown
    /// block inside an inactive loop fails the compile.
    pub(crate) fn unroll(&self, block: &Block, count: Option<f64>) -> CompileResult<Vec<Step>> {
        let Some(body_id) = block.statement_inputs.get(BODY_SLOT) else {
            tracing::debug!(block_id = %block.id, "Repeat block has no body");
            return Ok(Vec::new());
        };
        let body_head = self.graph.resolve(&block.id, body_id)?;

        let trips = trip_count(count);
        if trips == 0.0 {
            self.validate_chain(body_head)?;
            tracing::debug!(block_id = %block.id, "Repeat block runs zero times");
            return Ok(Vec::new());
        }

        let body = self.compile_chain(body_head)?;
        if body.is_empty() {
            tracing::debug!(block_id = %block.id, trips, "Repeat body is empty");
            return Ok(Vec::new());
        }

        let limit = self.options.max_steps;
        if trips > limit as f64 {
            return Err(CompileError::StepLimitExceeded {
                limit,
                block_id: block.id.clone(),
            });
        }
        let trips = trips as usize;
        let total = body
            .len()
            .checked_mul(trips)
            .filter(|total| *total <= limit)
            .ok_or_else(|| CompileError::StepLimitExceeded {
                limit,
                block_id: block.id.clone(),
            })?;

        let mut steps = Vec::with_capacity(total);
        for iteration in 0..trips {
            steps.extend(body.iter().map(|step| {
                let mut copy = step.clone();
                copy.iteration.insert(0, iteration);
                copy
            }));
        }

        tracing::debug!(
            block_id = %block.id,
            trips,
            body_steps = body.len(),
            steps = steps.len(),
            "Unrolled repeat block"
        );
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileOptions, Scalar};
    use crate::workspace::Workspace;

    fn unrolled(blocks: Vec<Block>, root: &str, options: &CompileOptions) -> CompileResult<Vec<Step>> {
        let workspace = Workspace::from_blocks(blocks).unwrap();
        let compiler = Compiler::new(&workspace, options);
        compiler.compile_chain(workspace.block(root).unwrap())
    }

    fn repeat(id: &str, times: &str, body: &str) -> Block {
        Block::new(id, "controls_repeat_ext")
            .with_value_input("TIMES", times)
            .with_statement_input("DO", body)
    }

    fn number(id: &str, n: f64) -> Block {
        Block::new(id, "math_number").with_field("NUM", n)
    }

    fn wait(id: &str, seconds: f64) -> Block {
        Block::new(id, "wait_time_block").with_field("SECONDS", seconds)
    }

    #[test]
    fn trip_count_policy() {
        assert_eq!(trip_count(None), 0.0);
        assert_eq!(trip_count(Some(-4.0)), 0.0);
        assert_eq!(trip_count(Some(0.9)), 0.0);
        assert_eq!(trip_count(Some(2.7)), 2.0);
        assert_eq!(trip_count(Some(3.0)), 3.0);
    }

    #[test]
    fn repeat_three_times() {
        let steps = unrolled(
            vec![repeat("r", "n", "w"), number("n", 3.0), wait("w", 1.0)],
            "r",
            &CompileOptions::default(),
        )
        .unwrap();

        assert_eq!(steps.len(), 3);
        for step in &steps {
            assert_eq!(step.id, "w");
            assert_eq!(step.main_func_name, "wait_time");
            assert_eq!(step.main_params["seconds"], Scalar::Number(1.0));
        }
        let iterations: Vec<Vec<usize>> = steps.iter().map(|s| s.iteration.clone()).collect();
        assert_eq!(iterations, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn empty_count_slot_means_zero_trips() {
        let steps = unrolled(
            vec![
                Block::new("r", "controls_repeat_ext").with_statement_input("DO", "w"),
                wait("w", 1.0),
            ],
            "r",
            &CompileOptions::default(),
        )
        .unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn zero_and_negative_counts_yield_nothing() {
        for n in [0.0, -2.0] {
            let steps = unrolled(
                vec![repeat("r", "n", "w"), number("n", n), wait("w", 1.0)],
                "r",
                &CompileOptions::default(),
            )
            .unwrap();
            assert!(steps.is_empty(), "count {n}");
        }
    }

    #[test]
    fn missing_body_yields_nothing() {
        let steps = unrolled(
            vec![
                Block::new("r", "controls_repeat_ext").with_value_input("TIMES", "n"),
                number("n", 5.0),
            ],
            "r",
            &CompileOptions::default(),
        )
        .unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn zero_trip_body_is_still_checked() {
        let err = unrolled(
            vec![
                repeat("r", "n", "bad"),
                number("n", 0.0),
                Block::new("bad", "controls_whileUntil"),
            ],
            "r",
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownBlockType { .. }));
    }

    #[test]
    fn zero_trip_loop_ignores_inner_expansion_size() {
        let steps = unrolled(
            vec![
                repeat("outer", "zero", "inner"),
                number("zero", 0.0),
                repeat("inner", "many", "w"),
                number("many", 200_000.0),
                wait("w", 1.0),
            ],
            "outer",
            &CompileOptions::default(),
        )
        .unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn zero_trip_body_with_dangling_link_fails() {
        let err = unrolled(
            vec![
                repeat("r", "n", "w"),
                number("n", 0.0),
                wait("w", 1.0).with_next("ghost"),
            ],
            "r",
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::DanglingReference { ref to, .. } if to == "ghost"));
    }

    #[test]
    fn body_chain_order_repeats_per_iteration() {
        let steps = unrolled(
            vec![
                repeat("r", "n", "a"),
                number("n", 2.0),
                Block::new("a", "acquire_frame_block").with_next("w"),
                wait("w", 0.5),
            ],
            "r",
            &CompileOptions::default(),
        )
        .unwrap();
        let funcs: Vec<&str> = steps.iter().map(|s| s.main_func_name.as_str()).collect();
        assert_eq!(funcs, vec!["acquire_frame", "wait_time", "acquire_frame", "wait_time"]);
    }

    #[test]
    fn nested_repeats_multiply() {
        let steps = unrolled(
            vec![
                repeat("outer", "two", "inner"),
                number("two", 2.0),
                repeat("inner", "three", "w"),
                number("three", 3.0),
                wait("w", 1.0),
            ],
            "outer",
            &CompileOptions::default(),
        )
        .unwrap();

        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0].iteration, vec![0, 0]);
        assert_eq!(steps[4].iteration, vec![1, 1]);
        assert_eq!(steps[5].iteration, vec![1, 2]);
    }

    #[test]
    fn field_count_repeat() {
        let steps = unrolled(
            vec![
                Block::new("r", "controls_repeat")
                    .with_field("TIMES", 4)
                    .with_statement_input("DO", "w"),
                wait("w", 1.0),
            ],
            "r",
            &CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(steps.len(), 4);
    }

    #[test]
    fn expansion_beyond_limit_fails_fast() {
        let options = CompileOptions {
            max_steps: 10,
            ..CompileOptions::default()
        };
        let err = unrolled(
            vec![
                repeat("outer", "n", "inner"),
                number("n", 4.0),
                repeat("inner", "m", "w"),
                number("m", 3.0),
                wait("w", 1.0),
            ],
            "outer",
            &options,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::StepLimitExceeded { limit: 10, ref block_id } if block_id == "outer"
        ));
    }

    #[test]
    fn enormous_trip_count_fails_without_allocating() {
        let err = unrolled(
            vec![repeat("r", "n", "w"), number("n", 1e15), wait("w", 1.0)],
            "r",
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::StepLimitExceeded { .. }));
    }
}
