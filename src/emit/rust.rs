//! Rust source output.
//!
//! Each unit becomes a free function `fn <name>(x: R) -> R` over a
//! receiver type `R` with by-value `mul` and `square` methods. A header
//! comment carries the operation counts and the chain script the code was
//! derived from.

use super::{Emitter, Unit};
use crate::chain::script::print_script;
use crate::diagnostic::Diagnostic;
use crate::program::{Instruction, Operand};

pub struct RustEmitter {
    receiver: String,
}

impl RustEmitter {
    pub fn new(receiver: &str) -> Self {
        Self {
            receiver: receiver.to_string(),
        }
    }

    fn function(&self, unit: &Unit<'_>, out: &mut String) {
        let program = unit.program;
        let counts = program.op_counts();
        let ty = &self.receiver;

        out.push_str(&format!(
            "/// Returns `x^{:#x}`.\n",
            program.exponent()
        ));
        out.push_str(&format!("pub fn {}(x: {}) -> {} {{\n", unit.name, ty, ty));
        out.push_str(&format!(
            "    // The sequence of {} multiplications and {} squarings is derived from the\n",
            counts.multiplications, counts.squarings
        ));
        out.push_str("    // following addition chain.\n");
        out.push_str("    //\n");
        for line in print_script(unit.chain).lines() {
            out.push_str(&format!("    //    {}\n", line));
        }
        out.push_str("    //\n");

        let mutated = !program.instructions().is_empty();
        out.push_str(&format!("    let {}z = x;\n", if mutated { "mut " } else { "" }));
        for temp in program.temporaries() {
            out.push_str(&format!("    let mut {} = {}::default();\n", temp, ty));
        }

        for inst in program.instructions() {
            match *inst {
                Instruction::Mul { out: o, x, y } => {
                    out.push_str(&format!("    {} = {}.mul({});\n", o, x, y));
                }
                Instruction::Square { out: o, x } => {
                    out.push_str(&format!("    {} = {}.square();\n", o, x));
                }
                Instruction::SquareRun { out: o, x, count } => {
                    let first = if o == x {
                        0
                    } else {
                        out.push_str(&format!("    {} = {}.square();\n", o, x));
                        1
                    };
                    out.push_str(&format!("    for _ in {}..{} {{\n", first, count));
                    out.push_str(&format!("        {} = {}.square();\n", o, o));
                    out.push_str("    }\n");
                }
            }
        }
        out.push_str(&format!("    {}\n", Operand::Acc));
        out.push_str("}\n");
    }
}

impl Emitter for RustEmitter {
    fn format_name(&self) -> &str {
        "rust"
    }

    fn extension(&self) -> &str {
        "rs"
    }

    fn emit(&self, units: &[Unit<'_>]) -> Result<String, Diagnostic> {
        let mut out = String::from("// Code generated by chainexp. DO NOT EDIT.\n");
        for unit in units {
            out.push('\n');
            self.function(unit, &mut out);
        }
        Ok(out)
    }
}
