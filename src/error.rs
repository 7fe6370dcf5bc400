//! Errors raised while specializing an exponent.
//!
//! Both kinds are fatal for the exponent being specialized and are never
//! repaired: a missing chain aborts specialization, a malformed chain
//! points at a bug in whoever produced it. Execution has no error path.

use std::fmt;

use num_bigint::BigUint;

use crate::chain::StepRef;

/// Structural violations detected when a chain is validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MalformedChain {
    /// Step `step` refers to `target`, which is not an earlier step.
    DanglingRef { step: StepRef, target: StepRef },
    /// Step `step` is a shift by zero places.
    ZeroShift { step: StepRef },
    /// The final step evaluates to `found` instead of the declared target.
    TargetMismatch { expected: BigUint, found: BigUint },
    /// Zero is not reachable from 1 by additions.
    ZeroTarget,
}

impl fmt::Display for MalformedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedChain::DanglingRef { step, target } => write!(
                f,
                "step {} refers to step {}, which is not defined before it",
                step, target
            ),
            MalformedChain::ZeroShift { step } => {
                write!(f, "step {} shifts by zero places", step)
            }
            MalformedChain::TargetMismatch { expected, found } => write!(
                f,
                "chain ends at {:#x} but the declared target is {:#x}",
                found, expected
            ),
            MalformedChain::ZeroTarget => write!(f, "no addition chain ends at zero"),
        }
    }
}

/// Failure to obtain a usable chain for an exponent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainError {
    /// The oracle gave up on `exponent`.
    NotFound { exponent: BigUint, reason: String },
    /// The chain violates the chain invariants.
    Malformed(MalformedChain),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::NotFound { exponent, reason } => {
                write!(f, "no addition chain found for {:#x}: {}", exponent, reason)
            }
            ChainError::Malformed(m) => write!(f, "malformed addition chain: {}", m),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<MalformedChain> for ChainError {
    fn from(m: MalformedChain) -> Self {
        ChainError::Malformed(m)
    }
}
