//! Chain oracles: exponent in, addition chain out.
//!
//! Searching for short chains is a separate problem; any search tool can
//! plug in through [`ChainOracle`]. The two oracles here are deterministic
//! reference constructions so that every exponent can be specialized
//! without an external tool.

use num_bigint::BigUint;
use num_traits::Zero;

use super::{AdditionChain, ChainBuilder, StepRef};
use crate::error::ChainError;

/// Default step budget for the built-in oracles.
pub const DEFAULT_MAX_STEPS: usize = 4096;

/// Produces an addition chain ending at a given exponent.
pub trait ChainOracle {
    fn search(&self, exponent: &BigUint) -> Result<AdditionChain, ChainError>;
}

/// Left-to-right square-and-multiply chain: one double per bit below the
/// top and one add per set bit.
#[derive(Clone, Debug)]
pub struct BinaryOracle {
    pub max_steps: usize,
}

impl Default for BinaryOracle {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl ChainOracle for BinaryOracle {
    fn search(&self, exponent: &BigUint) -> Result<AdditionChain, ChainError> {
        WindowOracle {
            width: 1,
            max_steps: self.max_steps,
        }
        .search(exponent)
    }
}

/// Sliding-window chain over a table of odd powers `1, 3, ..., 2^width - 1`.
///
/// Width 1 is the binary chain. Wider windows trade table entries for
/// fewer additions; 4 or 5 suits 256-bit exponents.
#[derive(Clone, Debug)]
pub struct WindowOracle {
    pub width: u32,
    pub max_steps: usize,
}

impl Default for WindowOracle {
    fn default() -> Self {
        Self {
            width: 4,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl WindowOracle {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Split the exponent into (zero run before window, odd window value,
    /// window length) triples, most significant first.
    fn windows(&self, exponent: &BigUint) -> (Vec<(u32, u64, u32)>, u32) {
        let bits = exponent.bits();
        let width = self.width as u64;
        let mut windows = Vec::new();
        let mut zeros = 0u32;
        let mut i = bits as i64 - 1;
        while i >= 0 {
            if !exponent.bit(i as u64) {
                zeros += 1;
                i -= 1;
                continue;
            }
            let mut low = (i - width as i64 + 1).max(0);
            while !exponent.bit(low as u64) {
                low += 1;
            }
            let mut digit = 0u64;
            for b in (low..=i).rev() {
                digit = (digit << 1) | exponent.bit(b as u64) as u64;
            }
            windows.push((zeros, digit, (i - low + 1) as u32));
            zeros = 0;
            i = low - 1;
        }
        (windows, zeros)
    }
}

impl ChainOracle for WindowOracle {
    fn search(&self, exponent: &BigUint) -> Result<AdditionChain, ChainError> {
        if exponent.is_zero() {
            return Err(ChainError::NotFound {
                exponent: exponent.clone(),
                reason: "zero is not reachable from 1".to_string(),
            });
        }
        if self.width == 0 || self.width > 16 {
            return Err(ChainError::NotFound {
                exponent: exponent.clone(),
                reason: format!("window width {} is outside 1..=16", self.width),
            });
        }

        let (windows, trailing) = self.windows(exponent);
        let largest = windows.iter().map(|w| w.1).max().unwrap_or(1);

        let mut b = ChainBuilder::new();
        // odd[k] holds 2k + 1
        let mut odd: Vec<StepRef> = vec![b.one()];
        if largest > 1 {
            let two = b.double(b.one());
            while ((odd.len() as u64) * 2 + 1) <= largest {
                let prev = odd[odd.len() - 1];
                odd.push(b.add(prev, two));
            }
        }

        let mut acc: Option<StepRef> = None;
        for (zeros, digit, len) in windows {
            let entry = odd[(digit / 2) as usize];
            acc = Some(match acc {
                None => entry,
                Some(a) => {
                    let shifted = b.shift(a, zeros + len);
                    b.add(shifted, entry)
                }
            });
            if b.len() > self.max_steps {
                break;
            }
        }
        if let Some(a) = acc {
            b.shift(a, trailing);
        }

        if b.len() > self.max_steps {
            return Err(ChainError::NotFound {
                exponent: exponent.clone(),
                reason: format!("chain exceeds the budget of {} steps", self.max_steps),
            });
        }
        Ok(b.finish(exponent.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::parse_exponent;

    fn assert_reaches(oracle: &dyn ChainOracle, e: &BigUint) -> AdditionChain {
        let chain = oracle.search(e).unwrap();
        chain.validate().unwrap_or_else(|err| panic!("{:#x}: {}", e, err));
        chain
    }

    #[test]
    fn test_binary_small_exponents() {
        let oracle = BinaryOracle::default();
        for e in 1u64..300 {
            assert_reaches(&oracle, &BigUint::from(e));
        }
    }

    #[test]
    fn test_window_small_exponents() {
        for width in 1..=6 {
            let oracle = WindowOracle::new(width);
            for e in 1u64..300 {
                assert_reaches(&oracle, &BigUint::from(e));
            }
        }
    }

    #[test]
    fn test_one_needs_no_steps() {
        let chain = assert_reaches(&WindowOracle::default(), &BigUint::from(1u32));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_binary_counts() {
        // 0b1011: three doublings, two additions
        let chain = assert_reaches(&BinaryOracle::default(), &BigUint::from(11u32));
        let counts = chain.counts();
        assert_eq!(counts.squarings, 3);
        assert_eq!(counts.multiplications, 2);
    }

    #[test]
    fn test_window_beats_binary_on_large_exponent() {
        let e = parse_exponent(
            "0xb640000002a3a6f1d603ab4ff58ec74521f2934b1a7aeedbe56f9b27e351457b",
        )
        .unwrap();
        let binary = assert_reaches(&BinaryOracle::default(), &e).counts();
        let window = assert_reaches(&WindowOracle::default(), &e).counts();
        assert_eq!(binary.squarings, 255);
        assert!(window.total() < binary.total());
    }

    #[test]
    fn test_zero_not_found() {
        let err = WindowOracle::default().search(&BigUint::zero()).unwrap_err();
        assert!(matches!(err, ChainError::NotFound { .. }));
    }

    #[test]
    fn test_bad_width_not_found() {
        let err = WindowOracle::new(0).search(&BigUint::from(9u32)).unwrap_err();
        assert!(matches!(err, ChainError::NotFound { .. }));
    }

    #[test]
    fn test_step_budget() {
        let oracle = BinaryOracle { max_steps: 8 };
        let e = BigUint::from(u64::MAX);
        let err = oracle.search(&e).unwrap_err();
        match err {
            ChainError::NotFound { exponent, reason } => {
                assert_eq!(exponent, e);
                assert!(reason.contains("budget"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
