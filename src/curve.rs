//! SM9 BN256 routines: inversion, square roots and Frobenius.
//!
//! The five exponents are searched and compiled once per process, in
//! parallel, the first time any routine is used. Everything after that is
//! read-only and shared between threads.

use std::sync::OnceLock;

use num_bigint::BigUint;
use rayon::prelude::*;
use subtle::CtOption;

use crate::chain::oracle::{ChainOracle, WindowOracle};
use crate::chain::{parse_exponent, AdditionChain};
use crate::error::ChainError;
use crate::field::{FieldElement, Fp, Fp2};
use crate::program::{compile_with, execute, CompileOptions, Program};
use crate::sqrt::{AtkinSqrt, Fp2Sqrt};

pub const MODULUS_HEX: &str = "0xb640000002a3a6f1d603ab4ff58ec74521f2934b1a7aeedbe56f9b27e351457d";

/// `2^((p-5)/8)` in Montgomery form.
pub const SQRT_T: Fp = Fp::from_montgomery([
    0xd5dd560c5235102a,
    0xa3772bab091163ac,
    0x0ed7304fd0711ab0,
    0x8efb889ed7056e1e,
]);

pub fn modulus() -> BigUint {
    Fp::modulus()
}

/// One exponentiation the SM9 field code needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Routine {
    /// `x^(p-2)` over Fp
    Invert,
    /// `x^((p-5)/8)` over Fp
    SqrtCandidate,
    /// `x^p` over Fp2
    Frobenius,
    /// `x^((p-1)/4)` over Fp2
    PMinus1Over4,
    /// `x^((p-1)/2)` over Fp2
    PMinus1Over2,
}

impl Routine {
    pub const ALL: [Routine; 5] = [
        Routine::Invert,
        Routine::SqrtCandidate,
        Routine::Frobenius,
        Routine::PMinus1Over4,
        Routine::PMinus1Over2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Routine::Invert => "invert",
            Routine::SqrtCandidate => "sqrt_candidate",
            Routine::Frobenius => "exp_p",
            Routine::PMinus1Over4 => "exp_p_minus_1_over_4",
            Routine::PMinus1Over2 => "exp_p_minus_1_over_2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Routine::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Element type the routine runs over.
    pub fn field(&self) -> &'static str {
        match self {
            Routine::Invert | Routine::SqrtCandidate => "Fp",
            _ => "Fp2",
        }
    }

    pub fn exponent(&self) -> BigUint {
        let p = modulus();
        match self {
            Routine::Invert => p - 2u32,
            Routine::SqrtCandidate => (p - 5u32) >> 3u32,
            Routine::Frobenius => p,
            Routine::PMinus1Over4 => (p - 1u32) >> 2u32,
            Routine::PMinus1Over2 => (p - 1u32) >> 1u32,
        }
    }
}

/// Compiled programs for every [`Routine`], with their chains.
#[derive(Clone, Debug)]
pub struct Programs {
    entries: Vec<(Routine, AdditionChain, Program)>,
}

impl Programs {
    /// Search and compile all routines in parallel.
    pub fn compile(oracle: &(dyn ChainOracle + Sync), options: &CompileOptions) -> Result<Self, ChainError> {
        let entries = Routine::ALL
            .par_iter()
            .map(|&routine| {
                let chain = oracle.search(&routine.exponent())?;
                let program = compile_with(&chain, options)?;
                Ok((routine, chain, program))
            })
            .collect::<Result<Vec<_>, ChainError>>()?;
        Ok(Self { entries })
    }

    pub fn get(&self, routine: Routine) -> &Program {
        &self.entry(routine).2
    }

    pub fn chain(&self, routine: Routine) -> &AdditionChain {
        &self.entry(routine).1
    }

    pub fn iter(&self) -> impl Iterator<Item = (Routine, &AdditionChain, &Program)> {
        self.entries.iter().map(|(r, c, p)| (*r, c, p))
    }

    fn entry(&self, routine: Routine) -> &(Routine, AdditionChain, Program) {
        // entries follow Routine::ALL
        &self.entries[routine as usize]
    }
}

/// The SM9 routine bundle.
#[derive(Clone, Debug)]
pub struct Sm9 {
    programs: Programs,
    sqrt: AtkinSqrt<Fp>,
    sqrt2: Fp2Sqrt,
}

impl Sm9 {
    pub fn new(oracle: &(dyn ChainOracle + Sync), options: &CompileOptions) -> Result<Self, ChainError> {
        let programs = Programs::compile(oracle, options)?;

        let sqrt = AtkinSqrt::new(programs.get(Routine::SqrtCandidate).clone(), SQRT_T);

        let invert = programs.get(Routine::Invert);
        let c = Fp2::U;
        let d = execute(programs.get(Routine::PMinus1Over2), &c);
        let c_inv = c.conjugate().scale(execute(invert, &c.norm()));
        let k = execute(programs.get(Routine::Frobenius), &d).mul(c_inv);

        let sqrt2 = Fp2Sqrt::new(
            programs.get(Routine::PMinus1Over4).clone(),
            programs.get(Routine::Frobenius).clone(),
            sqrt.clone(),
            c,
            d,
            k,
        );

        Ok(Self {
            programs,
            sqrt,
            sqrt2,
        })
    }

    pub fn programs(&self) -> &Programs {
        &self.programs
    }

    pub fn program(&self, routine: Routine) -> &Program {
        self.programs.get(routine)
    }

    pub fn fp_sqrt(&self) -> &AtkinSqrt<Fp> {
        &self.sqrt
    }

    pub fn fp2_sqrt(&self) -> &Fp2Sqrt {
        &self.sqrt2
    }
}

/// The process-wide bundle, built on first use.
pub fn sm9() -> &'static Sm9 {
    static SM9: OnceLock<Sm9> = OnceLock::new();
    SM9.get_or_init(|| {
        Sm9::new(&WindowOracle::default(), &CompileOptions::default())
            .expect("every SM9 exponent has a window chain")
    })
}

/// Parse [`MODULUS_HEX`].
pub fn modulus_from_hex() -> Option<BigUint> {
    parse_exponent(MODULUS_HEX)
}

impl Fp {
    /// `x^(p-2)`; zero maps to zero.
    pub fn invert(&self) -> Fp {
        execute(sm9().program(Routine::Invert), self)
    }

    pub fn sqrt(&self) -> CtOption<Fp> {
        sm9().fp_sqrt().sqrt_ct(self)
    }
}

impl Fp2 {
    /// Conjugate over norm; zero maps to zero.
    pub fn invert(&self) -> Fp2 {
        self.conjugate().scale(self.norm().invert())
    }

    pub fn sqrt(&self) -> CtOption<Fp2> {
        sm9().fp2_sqrt().sqrt_ct(self)
    }

    /// `x^p` through the compiled program.
    pub fn frobenius(&self) -> Fp2 {
        execute(sm9().program(Routine::Frobenius), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use subtle::ConstantTimeEq;

    fn random_fp(rng: &mut StdRng) -> Fp {
        let mut bytes = [0u8; 64];
        rng.fill_bytes(&mut bytes);
        Fp::from_bytes_wide(&bytes)
    }

    fn random_fp2(rng: &mut StdRng) -> Fp2 {
        Fp2::new(random_fp(rng), random_fp(rng))
    }

    #[test]
    fn test_modulus_hex_matches_field() {
        assert_eq!(modulus_from_hex(), Some(Fp::modulus()));
    }

    #[test]
    fn test_routine_exponents() {
        assert_eq!(
            format!("{:x}", Routine::SqrtCandidate.exponent()),
            "16c80000005474de3ac07569feb1d8e8a43e5269634f5ddb7cadf364fc6a28af"
        );
        assert_eq!(
            format!("{:x}", Routine::PMinus1Over4.exponent()),
            "2d90000000a8e9bc7580ead3fd63b1d1487ca4d2c69ebbb6f95be6c9f8d4515f"
        );
        assert_eq!(
            format!("{:x}", Routine::PMinus1Over2.exponent()),
            "5b2000000151d378eb01d5a7fac763a290f949a58d3d776df2b7cd93f1a8a2be"
        );
        for routine in Routine::ALL {
            assert_eq!(Routine::from_name(routine.name()), Some(routine));
        }
    }

    #[test]
    fn test_sqrt_t_constant() {
        let two = Fp::from_u64(2);
        assert_eq!(two.pow_vartime(&Routine::SqrtCandidate.exponent()), SQRT_T);
    }

    #[test]
    fn test_programs_match_reference_pow() {
        let mut rng = StdRng::seed_from_u64(0x5390);
        let bundle = sm9();
        for (routine, chain, program) in bundle.programs().iter() {
            assert_eq!(chain.target(), &routine.exponent());
            assert_eq!(program.exponent(), &routine.exponent());
            match routine.field() {
                "Fp" => {
                    let x = random_fp(&mut rng);
                    assert_eq!(execute(program, &x), x.pow_vartime(program.exponent()));
                }
                _ => {
                    let x = random_fp2(&mut rng);
                    assert_eq!(execute(program, &x), x.pow_vartime(program.exponent()));
                }
            }
        }
    }

    #[test]
    fn test_invert() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..16 {
            let x = random_fp(&mut rng);
            assert_eq!(x.invert().mul(x), Fp::ONE);
            let y = random_fp2(&mut rng);
            assert_eq!(y.invert().mul(y), Fp2::ONE);
        }
        assert_eq!(Fp::ZERO.invert(), Fp::ZERO);
        assert_eq!(Fp2::ZERO.invert(), Fp2::ZERO);
    }

    #[test]
    fn test_fp_sqrt() {
        let mut rng = StdRng::seed_from_u64(2);
        // 2 is a non-residue
        let two = Fp::from_u64(2);
        for _ in 0..32 {
            let y = random_fp(&mut rng);
            let square = y.square();
            let root = square.sqrt().unwrap();
            assert_eq!(root.square(), square);
            assert!(bool::from(square.mul(two).sqrt().is_none()));
        }
        assert_eq!(Option::<Fp>::from(Fp::ZERO.sqrt()), Some(Fp::ZERO));
        // -1 is a residue for p = 5 (mod 8)
        assert!(bool::from(Fp::ONE.neg().sqrt().is_some()));
    }

    #[test]
    fn test_fp2_sqrt() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..32 {
            let y = random_fp2(&mut rng);
            let square = y.square();
            let root = square.sqrt().unwrap();
            assert_eq!(root.square(), square);
            // u is a non-square
            assert!(bool::from(square.mul(Fp2::U).sqrt().is_none()));
        }
        assert_eq!(Option::<Fp2>::from(Fp2::ZERO.sqrt()), Some(Fp2::ZERO));
    }

    #[test]
    fn test_fp2_sqrt_of_base_elements() {
        // every base element is a square in Fp2, including non-residues
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..8 {
            let x = Fp2::from_base(random_fp(&mut rng));
            let root = x.sqrt().unwrap();
            assert_eq!(root.square(), x);
        }
        let two = Fp2::from_base(Fp::from_u64(2));
        assert_eq!(two.sqrt().unwrap().square(), two);
    }

    #[test]
    fn test_frobenius_is_conjugate() {
        let mut rng = StdRng::seed_from_u64(5);
        let x = random_fp2(&mut rng);
        assert_eq!(x.frobenius(), x.conjugate());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let options = CompileOptions::default();
        let a = Programs::compile(&WindowOracle::default(), &options).unwrap();
        let b = Programs::compile(&WindowOracle::default(), &options).unwrap();
        for routine in Routine::ALL {
            assert_eq!(a.get(routine).fingerprint(), b.get(routine).fingerprint());
            assert_eq!(a.get(routine), sm9().program(routine));
        }
    }

    #[test]
    fn test_shared_across_threads() {
        let results: Vec<bool> = (0u64..8)
            .into_par_iter()
            .map(|i| {
                let x = Fp::from_u64(i + 3).square();
                bool::from(x.sqrt().unwrap().square().ct_eq(&x))
            })
            .collect();
        assert!(results.into_iter().all(|ok| ok));
    }
}
