//! Constant-time exponentiation by fixed exponents.
//!
//! An addition chain for the exponent (from an oracle or a chain script)
//! is compiled into a straight-line [`Program`] of multiplications and
//! squarings, executed over any [`FieldElement`]. The SM9 BN256 routines
//! (inversion, square roots, Frobenius) are built on top.

pub mod api;
pub mod chain;
pub mod config;
pub mod curve;
pub mod diagnostic;
pub mod emit;
pub mod error;
pub mod field;
pub mod program;
pub mod span;
pub mod sqrt;

pub use api::{build_manifest, compile_exponent, compile_script_file, write_artifacts, Artifact, Failure};
pub use chain::oracle::{BinaryOracle, ChainOracle, WindowOracle};
pub use chain::{AdditionChain, ChainBuilder, Op, StepRef};
pub use error::{ChainError, MalformedChain};
pub use field::{FieldElement, Fp, Fp2, SmallField};
pub use program::{compile, compile_with, execute, CompileOptions, Program, Scratch, SquareShape};
pub use sqrt::{AtkinSqrt, Fp2Sqrt};
