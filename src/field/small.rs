//! Prime fields with a modulus below 2^32.
//!
//! Small enough to test exhaustively: every element of `SmallField<13>`
//! can be pushed through a compiled program and checked against the
//! reference exponentiation.

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use super::FieldElement;

/// Element of the prime field of order `P`. Requires `P < 2^32` so that
/// products fit in a `u64`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SmallField<const P: u64>(u64);

impl<const P: u64> SmallField<P> {
    pub const MODULUS: u64 = P;

    /// Construct from a u64 value (reduced mod P).
    pub fn new(v: u64) -> Self {
        assert!(P > 1 && P < (1 << 32), "modulus {} out of range", P);
        Self(v % P)
    }

    /// Canonical representative in `0..P`.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Every element, in order.
    pub fn elements() -> impl Iterator<Item = Self> {
        (0..P).map(Self)
    }

    #[inline]
    fn reduce_once(v: u64) -> Self {
        let reduced = v.wrapping_sub(P);
        // v >= P exactly when the subtraction did not wrap
        let keep = Choice::from((reduced >> 63) as u8 ^ 1);
        Self(u64::conditional_select(&v, &reduced, keep))
    }
}

impl<const P: u64> FieldElement for SmallField<P> {
    const ZERO: Self = Self(0);
    const ONE: Self = Self(1);

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::reduce_once(self.0 + rhs.0)
    }

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::reduce_once(self.0 + P - rhs.0)
    }

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self((self.0 * rhs.0) % P)
    }

    #[inline]
    fn neg(self) -> Self {
        Self::reduce_once(P - self.0)
    }
}

impl<const P: u64> ConstantTimeEq for SmallField<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl<const P: u64> ConditionallySelectable for SmallField<P> {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(u64::conditional_select(&a.0, &b.0, choice))
    }
}
