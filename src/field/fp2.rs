//! Quadratic extension `Fp2 = Fp[u] / (u^2 + 2)`.
//!
//! -2 is a non-residue modulo the SM9 prime, so `u^2 + 2` is irreducible.
//! Elements are `c0 + c1 * u`.

use std::fmt;

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use super::{FieldElement, Fp};

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Fp2 {
    pub c0: Fp,
    pub c1: Fp,
}

impl Fp2 {
    pub const ZERO: Fp2 = Fp2 {
        c0: Fp::ZERO,
        c1: Fp::ZERO,
    };
    pub const ONE: Fp2 = Fp2 {
        c0: Fp::ONE,
        c1: Fp::ZERO,
    };
    /// The generator `u`, a non-square.
    pub const U: Fp2 = Fp2 {
        c0: Fp::ZERO,
        c1: Fp::ONE,
    };

    pub const fn new(c0: Fp, c1: Fp) -> Self {
        Self { c0, c1 }
    }

    pub const fn from_base(c0: Fp) -> Self {
        Self { c0, c1: Fp::ZERO }
    }

    /// `c0 - c1 * u`, which equals `self^p`.
    pub fn conjugate(self) -> Self {
        Self {
            c0: self.c0,
            c1: self.c1.neg(),
        }
    }

    /// `self * conjugate(self) = c0^2 + 2 * c1^2`.
    pub fn norm(self) -> Fp {
        self.c0.square().add(self.c1.square().double())
    }

    /// Multiply by a base-field scalar.
    pub fn scale(self, k: Fp) -> Self {
        Self {
            c0: self.c0.mul(k),
            c1: self.c1.mul(k),
        }
    }

    /// True when `c1` is zero, i.e. the element lies in the base field.
    pub fn is_base(&self) -> Choice {
        self.c1.is_zero()
    }
}

impl FieldElement for Fp2 {
    const ZERO: Self = Fp2::ZERO;
    const ONE: Self = Fp2::ONE;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            c0: self.c0.add(rhs.c0),
            c1: self.c1.add(rhs.c1),
        }
    }

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            c0: self.c0.sub(rhs.c0),
            c1: self.c1.sub(rhs.c1),
        }
    }

    /// Karatsuba: three base multiplications.
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let v0 = self.c0.mul(rhs.c0);
        let v1 = self.c1.mul(rhs.c1);
        let cross = self.c0.add(self.c1).mul(rhs.c0.add(rhs.c1));
        Self {
            // u^2 = -2
            c0: v0.sub(v1.double()),
            c1: cross.sub(v0).sub(v1),
        }
    }

    #[inline]
    fn square(self) -> Self {
        let c0c1 = self.c0.mul(self.c1);
        Self {
            c0: self.c0.square().sub(self.c1.square().double()),
            c1: c0c1.double(),
        }
    }

    #[inline]
    fn neg(self) -> Self {
        Self {
            c0: self.c0.neg(),
            c1: self.c1.neg(),
        }
    }
}

impl ConstantTimeEq for Fp2 {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.c0.ct_eq(&other.c0) & self.c1.ct_eq(&other.c1)
    }
}

impl ConditionallySelectable for Fp2 {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            c0: Fp::conditional_select(&a.c0, &b.c0, choice),
            c1: Fp::conditional_select(&a.c1, &b.c1, choice),
        }
    }
}

impl fmt::Debug for Fp2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} + {:?}*u", self.c0, self.c1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn sample() -> Fp2 {
        Fp2::new(Fp::from_u64(0x1234_5678), Fp::from_u64(0x9abc_def0).neg())
    }

    #[test]
    fn test_u_squared_is_minus_two() {
        assert_eq!(Fp2::U.square(), Fp2::from_base(Fp::from_u64(2).neg()));
        assert_eq!(Fp2::U.mul(Fp2::U), Fp2::U.square());
    }

    #[test]
    fn test_square_matches_mul() {
        let a = sample();
        assert_eq!(a.square(), a.mul(a));
    }

    #[test]
    fn test_norm_is_product_with_conjugate() {
        let a = sample();
        assert_eq!(a.mul(a.conjugate()), Fp2::from_base(a.norm()));
    }

    #[test]
    fn test_conjugate_is_frobenius() {
        let a = sample();
        assert_eq!(a.pow_vartime(&Fp::modulus()), a.conjugate());
    }

    #[test]
    fn test_multiplicative_order_divides_p2_minus_1() {
        let a = sample();
        let p = Fp::modulus();
        let order = &p * &p - BigUint::from(1u32);
        assert_eq!(a.pow_vartime(&order), Fp2::ONE);
    }

    #[test]
    fn test_scale_and_is_base() {
        let a = sample();
        let k = Fp::from_u64(3);
        assert_eq!(a.scale(k), a.mul(Fp2::from_base(k)));
        assert!(bool::from(Fp2::from_base(k).is_base()));
        assert!(!bool::from(a.is_base()));
    }
}
