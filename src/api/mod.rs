pub mod pipeline;


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use num_bigint::BigUint;
use rayon::prelude::*;

use crate::config::Manifest;
use crate::curve::{Programs, Routine};
use crate::diagnostic::{render_diagnostics, Diagnostic};
use crate::emit::{create_emitter, Format, Unit};
use crate::program::{CompileOptions, Fingerprint, OpCounts};
use crate::span::Span;

pub use pipeline::Compiled;

/// Diagnostics together with the source they point into.
///
/// The library never prints; callers decide when to [`render`](Failure::render).
#[derive(Clone, Debug)]
pub struct Failure {
    pub filename: String,
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Failure {
    /// A failure with no source location.
    pub fn bare(diagnostic: Diagnostic) -> Self {
        Self {
            filename: "<input>".to_string(),
            source: String::new(),
            diagnostics: vec![diagnostic],
        }
    }

    pub fn render(&self) {
        if !self.source.is_empty() {
            render_diagnostics(&self.diagnostics, &self.filename, &self.source);
            return;
        }
        for diag in &self.diagnostics {
            eprintln!("error: {}", diag.message);
            for note in &diag.notes {
                eprintln!("  note: {}", note);
            }
            if let Some(help) = &diag.help {
                eprintln!("  help: {}", help);
            }
        }
    }
}

/// Search a window chain for `exponent` and compile it.
pub fn compile_exponent(exponent: &BigUint, window: u32, options: &CompileOptions) -> Result<Compiled, Failure> {
    let name = format!("exp_{:x}", exponent);
    let chain = pipeline::search(exponent, window)?;
    pipeline::compile_chain(&name, chain, options)
}

/// Parse and compile a chain script file. The function name is the file
/// stem.
pub fn compile_script_file(path: &Path, options: &CompileOptions) -> Result<Compiled, Failure> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().replace(['-', '.'], "_"))
        .unwrap_or_else(|| "chain".to_string());
    let chain = pipeline::read_script(path)?;
    pipeline::compile_chain(&name, chain, options)
}

/// Summary of one program written into an artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSummary {
    pub name: String,
    pub counts: OpCounts,
    pub fingerprint: Fingerprint,
}

/// One output file of a manifest build.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub path: PathBuf,
    pub format: Format,
    pub contents: String,
    pub programs: Vec<ProgramSummary>,
}

/// Compile every program of a manifest (in parallel) and render the
/// output files. Programs sharing an output file are written together,
/// in declaration order, and must agree on format and receiver.
pub fn build_manifest(manifest: &Manifest) -> Result<Vec<Artifact>, Failure> {
    let compiled = manifest
        .programs
        .par_iter()
        .map(pipeline::compile_spec)
        .collect::<Result<Vec<_>, Failure>>()?;

    // output path -> indices into manifest.programs
    let mut groups: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();
    let mut order: Vec<PathBuf> = Vec::new();
    for (i, spec) in manifest.programs.iter().enumerate() {
        let path = match &spec.output {
            Some(path) => path.clone(),
            None => {
                let ext = create_emitter(spec.format, &spec.receiver).extension().to_string();
                manifest.root_dir.join(format!("{}.{}", spec.name, ext))
            }
        };
        if !groups.contains_key(&path) {
            order.push(path.clone());
        }
        groups.entry(path).or_default().push(i);
    }

    let mut artifacts = Vec::with_capacity(order.len());
    for path in order {
        let members = &groups[&path];
        let first = &manifest.programs[members[0]];
        for &i in &members[1..] {
            let spec = &manifest.programs[i];
            if spec.format != first.format || spec.receiver != first.receiver {
                return Err(Failure::bare(
                    Diagnostic::error(
                        format!(
                            "programs '{}' and '{}' share '{}' but differ in format or receiver",
                            first.name,
                            spec.name,
                            path.display()
                        ),
                        Span::dummy(),
                    )
                    .with_help("give one of them its own 'output'".to_string()),
                ));
            }
        }

        let units: Vec<Unit<'_>> = members
            .iter()
            .map(|&i| Unit {
                name: &compiled[i].name,
                chain: &compiled[i].chain,
                program: &compiled[i].program,
            })
            .collect();
        let contents = create_emitter(first.format, &first.receiver)
            .emit(&units)
            .map_err(Failure::bare)?;
        let programs = members
            .iter()
            .map(|&i| ProgramSummary {
                name: compiled[i].name.clone(),
                counts: compiled[i].program.op_counts(),
                fingerprint: compiled[i].program.fingerprint(),
            })
            .collect();

        artifacts.push(Artifact {
            path,
            format: first.format,
            contents,
            programs,
        });
    }
    Ok(artifacts)
}

/// Output files for the SM9 bundle: base-field routines in
/// `gfp_invert_sqrt`, extension-field routines in `gfp2_sqrt`.
pub fn curve_artifacts(programs: &Programs, format: Format, out_dir: &Path) -> Result<Vec<Artifact>, Failure> {
    let mut artifacts = Vec::with_capacity(2);
    for (stem, receiver) in [("gfp_invert_sqrt", "Fp"), ("gfp2_sqrt", "Fp2")] {
        let routines: Vec<Routine> = Routine::ALL
            .into_iter()
            .filter(|r| r.field() == receiver)
            .collect();
        let units: Vec<Unit<'_>> = routines
            .iter()
            .map(|&r| Unit {
                name: r.name(),
                chain: programs.chain(r),
                program: programs.get(r),
            })
            .collect();
        let emitter = create_emitter(format, receiver);
        let contents = emitter.emit(&units).map_err(Failure::bare)?;
        artifacts.push(Artifact {
            path: out_dir.join(format!("{}.{}", stem, emitter.extension())),
            format,
            contents,
            programs: routines
                .iter()
                .map(|&r| ProgramSummary {
                    name: r.name().to_string(),
                    counts: programs.get(r).op_counts(),
                    fingerprint: programs.get(r).fingerprint(),
                })
                .collect(),
        });
    }
    Ok(artifacts)
}

/// Write artifacts to disk, creating parent directories.
pub fn write_artifacts(artifacts: &[Artifact]) -> Result<(), Diagnostic> {
    for artifact in artifacts {
        if let Some(parent) = artifact.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Diagnostic::error(
                    format!("cannot create '{}': {}", parent.display(), e),
                    Span::dummy(),
                )
            })?;
        }
        std::fs::write(&artifact.path, &artifact.contents).map_err(|e| {
            Diagnostic::error(
                format!("cannot write '{}': {}", artifact.path.display(), e),
                Span::dummy(),
            )
        })?;
    }
    Ok(())
}
