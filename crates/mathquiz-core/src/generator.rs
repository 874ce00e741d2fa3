//! Problem generation.

use rand::rngs::StdRng;
use rand::Rng;

use crate::model::{Operator, Problem};

/// Operands are drawn from `0..OPERAND_BOUND`.
pub const OPERAND_BOUND: u32 = 100;

/// Source of uniformly distributed integers, injected so tests can script it.
pub trait RandomSource: Send {
    /// Returns an integer in `[0, bound)`.
    fn next_int(&mut self, bound: u32) -> u32;
}

impl RandomSource for StdRng {
    fn next_int(&mut self, bound: u32) -> u32 {
        self.gen_range(0..bound)
    }
}

/// Generate a problem for `operator`, drawing both operands from `rng`.
pub fn generate(operator: Operator, rng: &mut dyn RandomSource) -> Problem {
    let operand1 = rng.next_int(OPERAND_BOUND) as i64;
    let operand2 = rng.next_int(OPERAND_BOUND) as i64;
    Problem::new(operator, operand1, operand2)
}
