use super::{Emitter, Unit};
use crate::diagnostic::Diagnostic;

/// Plain text: a header per unit, then one instruction per line.
pub struct ListingEmitter;

impl Emitter for ListingEmitter {
    fn format_name(&self) -> &str {
        "listing"
    }

    fn extension(&self) -> &str {
        "txt"
    }

    fn emit(&self, units: &[Unit<'_>]) -> Result<String, Diagnostic> {
        let mut out = String::new();
        for (i, unit) in units.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let program = unit.program;
            out.push_str(&format!(
                "# {}: x^{:#x} ({}) {}\n",
                unit.name,
                program.exponent(),
                program.op_counts(),
                program.fingerprint()
            ));
            let temps: Vec<String> = program.temporaries().map(|t| t.to_string()).collect();
            if !temps.is_empty() {
                out.push_str(&format!("# temporaries: {}\n", temps.join(" ")));
            }
            out.push_str(&program.to_string());
        }
        Ok(out)
    }
}
