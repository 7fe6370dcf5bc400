//! Shared chain preparation pipeline.
//!
//! Every entry point (one-shot exponent, script file, manifest program)
//! goes source -> chain -> program through the functions here.

use std::path::Path;

use num_bigint::BigUint;

use crate::chain::oracle::{ChainOracle, WindowOracle};
use crate::chain::script::parse_script;
use crate::chain::AdditionChain;
use crate::config::{ProgramSpec, Source};
use crate::diagnostic::Diagnostic;
use crate::program::{compile_with, CompileOptions, Program};
use crate::span::Span;

use super::Failure;

/// A chain and the program compiled from it.
#[derive(Clone, Debug)]
pub struct Compiled {
    pub name: String,
    pub chain: AdditionChain,
    pub program: Program,
}

pub(crate) fn search(exponent: &BigUint, window: u32) -> Result<AdditionChain, Failure> {
    WindowOracle::new(window)
        .search(exponent)
        .map_err(|e| Failure::bare(e.into()))
}

pub(crate) fn read_script(path: &Path) -> Result<AdditionChain, Failure> {
    let filename = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|e| {
        Failure::bare(Diagnostic::error(
            format!("cannot read '{}': {}", filename, e),
            Span::dummy(),
        ))
    })?;
    parse_script(&source).map_err(|diagnostics| Failure {
        filename,
        source,
        diagnostics,
    })
}

pub(crate) fn compile_chain(
    name: &str,
    chain: AdditionChain,
    options: &CompileOptions,
) -> Result<Compiled, Failure> {
    let program = compile_with(&chain, options).map_err(|e| {
        Failure::bare(Diagnostic::from(e).with_note(format!("while compiling '{}'", name)))
    })?;
    Ok(Compiled {
        name: name.to_string(),
        chain,
        program,
    })
}

/// Run one manifest program through the pipeline.
pub(crate) fn compile_spec(spec: &ProgramSpec) -> Result<Compiled, Failure> {
    let chain = match &spec.source {
        Source::Exponent(e) => search(e, spec.window)?,
        Source::Script(path) => read_script(path)?,
    };
    let options = CompileOptions { shape: spec.shape };
    compile_chain(&spec.name, chain, &options)
}
