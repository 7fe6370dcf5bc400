//! Addition chains over exponents.
//!
//! A chain starts at the implicit value 1 (step 0) and every later step
//! derives a new exponent from earlier ones by doubling, adding, or
//! shifting. The compiler turns each doubling into a field squaring and
//! each addition into a field multiplication.

pub mod oracle;
pub mod script;

#[cfg(test)]
mod tests;

use num_bigint::BigUint;
use num_traits::{Num, One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::MalformedChain;
use crate::program::OpCounts;

/// Index of a step in an [`AdditionChain`]. Step 0 is the implicit value 1.
pub type StepRef = usize;

/// How a step derives its value from earlier steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// `2 * value(of)`.
    Double(StepRef),
    /// `value(x) + value(y)`.
    Add(StepRef, StepRef),
    /// `value(of) * 2^count`: a run of `count` doublings.
    Shift(StepRef, u32),
}

impl Op {
    /// The steps this op reads (the second slot is only used by `Add`).
    pub fn operands(&self) -> (StepRef, Option<StepRef>) {
        match *self {
            Op::Double(of) | Op::Shift(of, _) => (of, None),
            Op::Add(x, y) => (x, Some(y)),
        }
    }

    /// Number of doublings this op stands for.
    pub fn doublings(&self) -> u32 {
        match *self {
            Op::Double(_) => 1,
            Op::Shift(_, count) => count,
            Op::Add(..) => 0,
        }
    }
}

/// A target exponent plus the steps that reach it.
///
/// Steps are numbered from 1; `steps()[i]` defines step `i + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionChain {
    target: BigUint,
    steps: Vec<Op>,
}

impl AdditionChain {
    pub fn new(target: BigUint, steps: Vec<Op>) -> Self {
        Self { target, steps }
    }

    pub fn target(&self) -> &BigUint {
        &self.target
    }

    pub fn steps(&self) -> &[Op] {
        &self.steps
    }

    /// Number of explicit steps (the implicit 1 is not counted).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reference to the step holding the final value.
    pub fn last(&self) -> StepRef {
        self.steps.len()
    }

    /// Multiplications and squarings a direct translation would use.
    pub fn counts(&self) -> OpCounts {
        let mut counts = OpCounts::default();
        for op in &self.steps {
            match op {
                Op::Add(..) => counts.multiplications += 1,
                _ => counts.squarings += op.doublings() as usize,
            }
        }
        counts
    }

    /// Evaluate every step. `values[0]` is 1.
    ///
    /// Fails on references to undefined or later steps and on zero-place
    /// shifts; does not look at the declared target.
    pub fn values(&self) -> Result<Vec<BigUint>, MalformedChain> {
        let mut values: Vec<BigUint> = Vec::with_capacity(self.steps.len() + 1);
        values.push(BigUint::one());
        for (i, op) in self.steps.iter().enumerate() {
            let step = i + 1;
            let (x, y) = op.operands();
            for target in std::iter::once(x).chain(y) {
                if target >= step {
                    return Err(MalformedChain::DanglingRef { step, target });
                }
            }
            let value = match *op {
                Op::Double(of) => &values[of] << 1u32,
                Op::Add(x, y) => &values[x] + &values[y],
                Op::Shift(of, count) => {
                    if count == 0 {
                        return Err(MalformedChain::ZeroShift { step });
                    }
                    &values[of] << count
                }
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Check every structural invariant, including that the final value
    /// is the declared target. Returns the step values on success.
    pub fn validate(&self) -> Result<Vec<BigUint>, MalformedChain> {
        if self.target.is_zero() {
            return Err(MalformedChain::ZeroTarget);
        }
        let values = self.values()?;
        let found = &values[self.last()];
        if *found != self.target {
            return Err(MalformedChain::TargetMismatch {
                expected: self.target.clone(),
                found: found.clone(),
            });
        }
        Ok(values)
    }
}

/// Incremental chain construction. Every method returns the new step.
#[derive(Clone, Debug, Default)]
pub struct ChainBuilder {
    steps: Vec<Op>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The implicit starting value 1.
    pub fn one(&self) -> StepRef {
        0
    }

    /// The most recently defined step.
    pub fn current(&self) -> StepRef {
        self.steps.len()
    }

    pub fn double(&mut self, of: StepRef) -> StepRef {
        self.push(Op::Double(of))
    }

    pub fn add(&mut self, x: StepRef, y: StepRef) -> StepRef {
        self.push(Op::Add(x, y))
    }

    /// Shift by `count` places. A shift by one is recorded as a double and
    /// a shift by zero adds no step.
    pub fn shift(&mut self, of: StepRef, count: u32) -> StepRef {
        match count {
            0 => of,
            1 => self.double(of),
            _ => self.push(Op::Shift(of, count)),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn finish(self, target: BigUint) -> AdditionChain {
        AdditionChain::new(target, self.steps)
    }

    fn push(&mut self, op: Op) -> StepRef {
        self.steps.push(op);
        self.steps.len()
    }
}

/// Parse an exponent written as `0x`-prefixed hex or as decimal.
pub fn parse_exponent(text: &str) -> Option<BigUint> {
    let text = text.trim().replace('_', "");
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => BigUint::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if !text.is_empty() => BigUint::from_str_radix(&text, 10).ok(),
        None => None,
    }
}
