//! Straight-line field programs.
//!
//! A [`Program`] is the compiled form of one exponent: a list of
//! multiplications and squarings over the read-only input `x`, the
//! accumulator `z` and scratch temporaries `t0, t1, ...`. The accumulator
//! starts as a copy of the input and holds the result when the last
//! instruction has run.

mod alloc;
pub mod compile;
pub mod exec;
pub mod fingerprint;


use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

pub use compile::{compile, compile_with, CompileOptions, SquareShape};
pub use exec::{execute, Scratch};
pub use fingerprint::Fingerprint;

/// Multiplication and squaring totals. A run of `k` squarings counts `k`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpCounts {
    pub multiplications: usize,
    pub squarings: usize,
}

impl OpCounts {
    pub fn total(&self) -> usize {
        self.multiplications + self.squarings
    }
}

impl fmt::Display for OpCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mul, {} sqr", self.multiplications, self.squarings)
    }
}

/// A storage location an instruction reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operand {
    /// The caller's input. Never written.
    Input,
    /// The accumulator; starts as the input, ends as the result.
    Acc,
    /// Scratch temporary `t<i>`.
    Temp(u32),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Input => write!(f, "x"),
            Operand::Acc => write!(f, "z"),
            Operand::Temp(i) => write!(f, "t{}", i),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// `out = x * y`
    Mul { out: Operand, x: Operand, y: Operand },
    /// `out = x^2`
    Square { out: Operand, x: Operand },
    /// `out = x^(2^count)`: square `x` once, then `out` in place.
    SquareRun { out: Operand, x: Operand, count: u32 },
}

impl Instruction {
    pub fn output(&self) -> Operand {
        match *self {
            Instruction::Mul { out, .. }
            | Instruction::Square { out, .. }
            | Instruction::SquareRun { out, .. } => out,
        }
    }

    /// Operands read by the instruction.
    pub fn inputs(&self) -> (Operand, Option<Operand>) {
        match *self {
            Instruction::Mul { x, y, .. } => (x, Some(y)),
            Instruction::Square { x, .. } | Instruction::SquareRun { x, .. } => (x, None),
        }
    }

    pub fn counts(&self) -> OpCounts {
        match *self {
            Instruction::Mul { .. } => OpCounts {
                multiplications: 1,
                squarings: 0,
            },
            Instruction::Square { .. } => OpCounts {
                multiplications: 0,
                squarings: 1,
            },
            Instruction::SquareRun { count, .. } => OpCounts {
                multiplications: 0,
                squarings: count as usize,
            },
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Mul { out, x, y } => write!(f, "{} = {} * {}", out, x, y),
            Instruction::Square { out, x } => write!(f, "{} = {}^2", out, x),
            Instruction::SquareRun { out, x, count } => {
                write!(f, "{} = {}^(2^{})", out, x, count)
            }
        }
    }
}

/// Why a deserialized program was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramError {
    WritesInput { index: usize },
    UnknownTemp { index: usize, temp: u32 },
    ReadBeforeWrite { index: usize, temp: u32 },
    EmptyRun { index: usize },
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::WritesInput { index } => {
                write!(f, "instruction {} writes the input", index)
            }
            ProgramError::UnknownTemp { index, temp } => {
                write!(f, "instruction {} uses undeclared temporary t{}", index, temp)
            }
            ProgramError::ReadBeforeWrite { index, temp } => {
                write!(f, "instruction {} reads t{} before it is written", index, temp)
            }
            ProgramError::EmptyRun { index } => {
                write!(f, "instruction {} squares zero times", index)
            }
        }
    }
}

impl std::error::Error for ProgramError {}

/// Serialized shape of a [`Program`]; checked before it becomes one.
#[derive(Deserialize)]
struct RawProgram {
    exponent: BigUint,
    instructions: Vec<Instruction>,
    temporaries: u32,
}

impl TryFrom<RawProgram> for Program {
    type Error = ProgramError;

    fn try_from(raw: RawProgram) -> Result<Self, Self::Error> {
        let program = Program::new(raw.exponent, raw.instructions, raw.temporaries);
        program.check()?;
        Ok(program)
    }
}

/// Compiled exponentiation by one fixed exponent.
///
/// Immutable once built; share it freely between threads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProgram")]
pub struct Program {
    exponent: BigUint,
    instructions: Vec<Instruction>,
    temporaries: u32,
}

impl Program {
    pub(crate) fn new(exponent: BigUint, instructions: Vec<Instruction>, temporaries: u32) -> Self {
        Self {
            exponent,
            instructions,
            temporaries,
        }
    }

    /// The exponent this program raises its input to.
    pub fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn temporary_count(&self) -> usize {
        self.temporaries as usize
    }

    /// Temporaries in declaration order.
    pub fn temporaries(&self) -> impl Iterator<Item = Operand> + '_ {
        (0..self.temporaries).map(Operand::Temp)
    }

    pub fn op_counts(&self) -> OpCounts {
        self.instructions
            .iter()
            .map(Instruction::counts)
            .fold(OpCounts::default(), |acc, c| OpCounts {
                multiplications: acc.multiplications + c.multiplications,
                squarings: acc.squarings + c.squarings,
            })
    }

    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint::fingerprint(self)
    }

    /// Verify that the program only writes declared storage and never
    /// reads a temporary before writing it. Compiled programs always pass.
    pub fn check(&self) -> Result<(), ProgramError> {
        let mut written = vec![false; self.temporaries as usize];
        for (index, inst) in self.instructions.iter().enumerate() {
            if let Instruction::SquareRun { count: 0, .. } = inst {
                return Err(ProgramError::EmptyRun { index });
            }
            let (x, y) = inst.inputs();
            for operand in std::iter::once(x).chain(y) {
                if let Operand::Temp(temp) = operand {
                    match written.get(temp as usize) {
                        None => return Err(ProgramError::UnknownTemp { index, temp }),
                        Some(false) => return Err(ProgramError::ReadBeforeWrite { index, temp }),
                        Some(true) => {}
                    }
                }
            }
            match inst.output() {
                Operand::Input => return Err(ProgramError::WritesInput { index }),
                Operand::Acc => {}
                Operand::Temp(temp) => match written.get_mut(temp as usize) {
                    Some(slot) => *slot = true,
                    None => return Err(ProgramError::UnknownTemp { index, temp }),
                },
            }
        }
        Ok(())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}
