pub mod json;
pub mod listing;
pub mod rust;

#[cfg(test)]
mod tests;

use crate::chain::AdditionChain;
use crate::diagnostic::Diagnostic;
use crate::program::Program;

pub use json::JsonEmitter;
pub use listing::ListingEmitter;
pub use rust::RustEmitter;

/// One compiled exponent ready to be written out.
#[derive(Clone, Copy, Debug)]
pub struct Unit<'a> {
    /// Function or section name.
    pub name: &'a str,
    pub chain: &'a AdditionChain,
    pub program: &'a Program,
}

/// Renders compiled programs as text.
///
/// Emitters only read the program's public surface (`instructions()`,
/// `temporaries()`, counts and fingerprint), so new output formats need
/// no changes to the compiler.
pub trait Emitter {
    /// Format name (e.g. "listing", "rust").
    fn format_name(&self) -> &str;
    /// File extension for output (e.g. "rs").
    fn extension(&self) -> &str;
    /// Render several units into one output file.
    fn emit(&self, units: &[Unit<'_>]) -> Result<String, Diagnostic>;
}

/// Output formats selectable from the CLI and the manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Listing,
    Rust,
    Json,
}

impl Format {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "listing" => Some(Format::Listing),
            "rust" => Some(Format::Rust),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Listing => "listing",
            Format::Rust => "rust",
            Format::Json => "json",
        }
    }
}

// ─── Emitter Factory ──────────────────────────────────────────────

/// Create the emitter for a format. `receiver` names the element type
/// in generated Rust code.
pub fn create_emitter(format: Format, receiver: &str) -> Box<dyn Emitter> {
    match format {
        Format::Listing => Box::new(ListingEmitter),
        Format::Rust => Box::new(RustEmitter::new(receiver)),
        Format::Json => Box::new(JsonEmitter),
    }
}
