//! Program execution over any [`FieldElement`].
//!
//! Control flow depends only on the program, never on the values: every
//! loop runs over instruction or squaring counts fixed at compile time.

use super::{Instruction, Operand, Program};
use crate::field::FieldElement;

/// Raise `input` to the program's exponent.
pub fn execute<F: FieldElement>(program: &Program, input: &F) -> F {
    let mut temps = vec![F::ZERO; program.temporary_count()];
    run(program, *input, &mut temps)
}

/// Reusable temporary storage for repeated executions.
#[derive(Clone, Debug, Default)]
pub struct Scratch<F> {
    temps: Vec<F>,
}

impl<F: FieldElement> Scratch<F> {
    pub fn new() -> Self {
        Self { temps: Vec::new() }
    }

    /// Scratch already sized for `program`.
    pub fn for_program(program: &Program) -> Self {
        Self {
            temps: vec![F::ZERO; program.temporary_count()],
        }
    }

    pub fn execute(&mut self, program: &Program, input: &F) -> F {
        let needed = program.temporary_count();
        if self.temps.len() < needed {
            self.temps.resize(needed, F::ZERO);
        }
        run(program, *input, &mut self.temps[..needed])
    }
}

struct Registers<'a, F> {
    input: F,
    acc: F,
    temps: &'a mut [F],
}

impl<F: FieldElement> Registers<'_, F> {
    #[inline(always)]
    fn load(&self, operand: Operand) -> F {
        match operand {
            Operand::Input => self.input,
            Operand::Acc => self.acc,
            Operand::Temp(i) => self.temps[i as usize],
        }
    }

    #[inline(always)]
    fn store(&mut self, operand: Operand, value: F) {
        match operand {
            Operand::Acc => self.acc = value,
            Operand::Temp(i) => self.temps[i as usize] = value,
            Operand::Input => unreachable!("program writes its input"),
        }
    }
}

fn run<F: FieldElement>(program: &Program, input: F, temps: &mut [F]) -> F {
    let mut regs = Registers {
        input,
        acc: input,
        temps,
    };
    for inst in program.instructions() {
        match *inst {
            Instruction::Mul { out, x, y } => {
                let value = regs.load(x).mul(regs.load(y));
                regs.store(out, value);
            }
            Instruction::Square { out, x } => {
                let value = regs.load(x).square();
                regs.store(out, value);
            }
            Instruction::SquareRun { out, x, count } => {
                let mut value = regs.load(x);
                for _ in 0..count {
                    value = value.square();
                }
                regs.store(out, value);
            }
        }
    }
    regs.acc
}
