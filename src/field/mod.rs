//! Field arithmetic targeted by compiled programs.
//!
//! - `FieldElement` trait: the execution contract (mul, square, add, sub,
//!   neg, constant-time equality and selection)
//! - `Fp`: SM9 BN256 base field, 4x64-bit Montgomery form
//! - `Fp2`: quadratic extension `Fp[u] / (u^2 + 2)`
//! - `SmallField<P>`: toy prime fields for exhaustive tests

pub mod fp;
pub mod fp2;
pub mod small;

pub use fp::Fp;
pub use fp2::Fp2;
pub use small::SmallField;

use num_bigint::BigUint;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// Arithmetic a compiled program needs from its element type.
///
/// Elements are `Copy` values and every operation returns a new value,
/// so an output can never alias an operand mid-computation.
pub trait FieldElement:
    Copy + Clone + std::fmt::Debug + ConstantTimeEq + ConditionallySelectable + Send + Sync + 'static
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn neg(self) -> Self;

    fn square(self) -> Self {
        self.mul(self)
    }

    fn double(self) -> Self {
        self.add(self)
    }

    fn is_zero(&self) -> Choice {
        self.ct_eq(&Self::ZERO)
    }

    /// Left-to-right square-and-multiply. Branches on the exponent bits,
    /// so only for public exponents and as a reference in tests.
    fn pow_vartime(self, exp: &BigUint) -> Self {
        let mut acc = Self::ONE;
        for i in (0..exp.bits()).rev() {
            acc = acc.square();
            if exp.bit(i) {
                acc = acc.mul(self);
            }
        }
        acc
    }
}
