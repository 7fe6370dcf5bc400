use serde::Serialize;

use super::{Emitter, Unit};
use crate::chain::AdditionChain;
use crate::diagnostic::Diagnostic;
use crate::program::{OpCounts, Program};
use crate::span::Span;

/// Structured output: every unit with its chain and program.
pub struct JsonEmitter;

#[derive(Serialize)]
struct JsonUnit<'a> {
    name: &'a str,
    exponent: String,
    fingerprint: String,
    counts: OpCounts,
    temporaries: Vec<String>,
    chain: &'a AdditionChain,
    program: &'a Program,
}

impl Emitter for JsonEmitter {
    fn format_name(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn emit(&self, units: &[Unit<'_>]) -> Result<String, Diagnostic> {
        let records: Vec<JsonUnit<'_>> = units
            .iter()
            .map(|unit| JsonUnit {
                name: unit.name,
                exponent: format!("{:#x}", unit.program.exponent()),
                fingerprint: unit.program.fingerprint().to_hex(),
                counts: unit.program.op_counts(),
                temporaries: unit.program.temporaries().map(|t| t.to_string()).collect(),
                chain: unit.chain,
                program: unit.program,
            })
            .collect();
        let mut text = serde_json::to_string_pretty(&records).map_err(|e| {
            Diagnostic::error(format!("cannot serialize programs: {}", e), Span::dummy())
        })?;
        text.push('\n');
        Ok(text)
    }
}
