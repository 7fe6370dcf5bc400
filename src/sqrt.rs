//! Constant-time square roots built on compiled exponentiations.
//!
//! `AtkinSqrt` works in any prime field with p = 5 (mod 8): one compiled
//! exponentiation by (p - 5) / 8 plus five multiplications. `Fp2Sqrt`
//! reduces a square root in the SM9 extension field to base-field roots.
//! Both always run every step and pick results with `subtle` selection.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};

use crate::chain::oracle::ChainOracle;
use crate::error::ChainError;
use crate::field::{FieldElement, Fp, Fp2};
use crate::program::{compile, execute, Program};

/// The exponent `(p - 5) / 8`, when p = 5 (mod 8) and the exponent is
/// positive.
pub fn atkin_exponent(p: &BigUint) -> Option<BigUint> {
    let residue = (p % 8u32).to_u32()?;
    if residue != 5 || *p <= BigUint::from(5u32) {
        return None;
    }
    Some((p - 5u32) >> 3u32)
}

/// Atkin's square root for p = 5 (mod 8).
#[derive(Clone, Debug)]
pub struct AtkinSqrt<F> {
    /// Computes `x^((p-5)/8)`.
    candidate: Program,
    /// `2^((p-5)/8)`
    t: F,
}

impl<F: FieldElement> AtkinSqrt<F> {
    pub fn new(candidate: Program, t: F) -> Self {
        Self { candidate, t }
    }

    /// Build everything from the modulus: search a chain for (p - 5) / 8,
    /// compile it, and derive `t`.
    pub fn for_modulus(p: &BigUint, oracle: &dyn ChainOracle) -> Result<Self, ChainError> {
        let exponent = atkin_exponent(p).ok_or_else(|| ChainError::NotFound {
            exponent: p.clone(),
            reason: "modulus is not 5 mod 8".to_string(),
        })?;
        let chain = oracle.search(&exponent)?;
        let candidate = compile(&chain)?;
        let t = F::ONE.double().pow_vartime(&exponent);
        Ok(Self { candidate, t })
    }

    pub fn candidate(&self) -> &Program {
        &self.candidate
    }

    /// Root candidate and whether it squares back to `x`.
    fn root(&self, x: &F) -> (F, Choice) {
        let candidate = execute(&self.candidate, x);
        let b = self.t.mul(candidate);
        let a1 = x.mul(b);
        let i = a1.double().mul(b).sub(F::ONE);
        let root = a1.mul(i);
        let ok = root.square().ct_eq(x);
        (root, ok)
    }

    pub fn sqrt_ct(&self, x: &F) -> CtOption<F> {
        let (root, ok) = self.root(x);
        CtOption::new(root, ok)
    }

    pub fn sqrt(&self, x: &F) -> Option<F> {
        self.sqrt_ct(x).into()
    }

    /// Write the root into `out` when `x` is a square; leave `out`
    /// unchanged otherwise.
    pub fn sqrt_assign(&self, out: &mut F, x: &F) -> Choice {
        let (root, ok) = self.root(x);
        out.conditional_assign(&root, ok);
        ok
    }
}

/// Square roots in `Fp2` for p = 5 (mod 8).
///
/// With `b = x^((p-1)/4)` and `bq = b^p`, `n = bq * b` is 1 or -1 for every
/// square. When `n = 1`, `b^2 * x` is a base-field square and
/// `bq * sqrt(b^2 * x)` is a root. When `n = -1` the base element is
/// scaled by `(d * c)^2` first and the root corrected by `k`.
#[derive(Clone, Debug)]
pub struct Fp2Sqrt {
    /// Computes `x^((p-1)/4)`.
    quarter: Program,
    /// Computes `x^p`.
    frobenius: Program,
    base: AtkinSqrt<Fp>,
    /// `(d * c)^2` for the non-square `c` and `d = c^((p-1)/2)`.
    dc_squared: Fp2,
    /// `d^p * c^-1`
    k: Fp2,
}

impl Fp2Sqrt {
    pub fn new(quarter: Program, frobenius: Program, base: AtkinSqrt<Fp>, c: Fp2, d: Fp2, k: Fp2) -> Self {
        Self {
            quarter,
            frobenius,
            base,
            dc_squared: d.mul(c).square(),
            k,
        }
    }

    fn root(&self, x: &Fp2) -> (Fp2, Choice) {
        let b = execute(&self.quarter, x);
        let bq = execute(&self.frobenius, &b);
        let n = bq.mul(b);
        let b2x = b.square().mul(*x);

        let (s1, _) = self.base.root(&b2x.c0);
        let residue = bq.scale(s1);

        let (s2, _) = self.base.root(&b2x.mul(self.dc_squared).c0);
        let nonresidue = bq.scale(s2).mul(self.k);

        let root = Fp2::conditional_select(&nonresidue, &residue, n.ct_eq(&Fp2::ONE));
        let ok = root.square().ct_eq(x);
        (root, ok)
    }

    pub fn sqrt_ct(&self, x: &Fp2) -> CtOption<Fp2> {
        let (root, ok) = self.root(x);
        CtOption::new(root, ok)
    }

    pub fn sqrt(&self, x: &Fp2) -> Option<Fp2> {
        self.sqrt_ct(x).into()
    }

    pub fn sqrt_assign(&self, out: &mut Fp2, x: &Fp2) -> Choice {
        let (root, ok) = self.root(x);
        out.conditional_assign(&root, ok);
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::oracle::{BinaryOracle, WindowOracle};
    use crate::field::SmallField;

    fn check_exhaustive<const P: u64>() {
        let sqrt = AtkinSqrt::<SmallField<P>>::for_modulus(&BigUint::from(P), &WindowOracle::default())
            .unwrap();
        let squares: Vec<SmallField<P>> = SmallField::<P>::elements().map(|y| y.square()).collect();

        for x in SmallField::<P>::elements() {
            let is_square = squares.contains(&x);
            match sqrt.sqrt(&x) {
                Some(root) => {
                    assert!(is_square, "p={} x={} has no root", P, x.value());
                    assert_eq!(root.square(), x);
                }
                None => assert!(!is_square, "p={} x={} root missed", P, x.value()),
            }
        }
    }

    #[test]
    fn test_exhaustive_small_primes() {
        check_exhaustive::<13>();
        check_exhaustive::<29>();
        check_exhaustive::<37>();
        check_exhaustive::<53>();
        check_exhaustive::<61>();
        check_exhaustive::<101>();
    }

    #[test]
    fn test_sqrt_of_zero() {
        type F = SmallField<29>;
        let sqrt = AtkinSqrt::<F>::for_modulus(&BigUint::from(29u32), &BinaryOracle::default()).unwrap();
        assert_eq!(sqrt.sqrt(&F::ZERO), Some(F::ZERO));
    }

    #[test]
    fn test_sqrt_assign_leaves_output_on_failure() {
        type F = SmallField<13>;
        let sqrt = AtkinSqrt::<F>::for_modulus(&BigUint::from(13u32), &BinaryOracle::default()).unwrap();

        // 2 is not a square mod 13
        let mut out = F::new(7);
        let ok = sqrt.sqrt_assign(&mut out, &F::new(2));
        assert!(!bool::from(ok));
        assert_eq!(out, F::new(7));

        let ok = sqrt.sqrt_assign(&mut out, &F::new(4));
        assert!(bool::from(ok));
        assert_eq!(out.square(), F::new(4));
    }

    #[test]
    fn test_atkin_exponent() {
        assert_eq!(atkin_exponent(&BigUint::from(13u32)), Some(BigUint::from(1u32)));
        assert_eq!(atkin_exponent(&BigUint::from(101u32)), Some(BigUint::from(12u32)));
        assert_eq!(atkin_exponent(&BigUint::from(5u32)), None);
        assert_eq!(atkin_exponent(&BigUint::from(7u32)), None);
        assert_eq!(atkin_exponent(&BigUint::from(17u32)), None);
    }

    #[test]
    fn test_wrong_modulus_class_rejected() {
        let err = AtkinSqrt::<SmallField<17>>::for_modulus(&BigUint::from(17u32), &BinaryOracle::default())
            .unwrap_err();
        assert!(matches!(err, ChainError::NotFound { .. }));
    }
}
