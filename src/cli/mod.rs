pub mod build;
pub mod compile;
pub mod curve;
pub mod script;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;

use chainexp::api::Compiled;
use chainexp::emit::{create_emitter, Format, Unit};
use chainexp::program::SquareShape;
use chainexp::Failure;

/// Status lines on stderr, silenced by `--quiet`.
#[derive(Clone, Copy)]
pub struct Log {
    pub quiet: bool,
}

impl Log {
    pub fn status(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    pub fn compiled(&self, compiled: &Compiled) {
        self.status(format!(
            "compiled {} ({}) {}",
            compiled.name,
            compiled.program.op_counts(),
            compiled.program.fingerprint()
        ));
    }
}

pub fn fail(failure: Failure) -> ! {
    failure.render();
    process::exit(1);
}

pub fn resolve_shape(name: &str) -> SquareShape {
    match SquareShape::parse(name) {
        Some(shape) => shape,
        None => {
            eprintln!("error: unknown shape '{}' (expected run or unrolled)", name);
            process::exit(1);
        }
    }
}

pub fn resolve_format(name: &str) -> Format {
    match Format::parse(name) {
        Some(format) => format,
        None => {
            eprintln!("error: unknown format '{}' (expected listing, rust or json)", name);
            process::exit(1);
        }
    }
}

/// Render one compiled program and write it to `output`, or stdout.
pub fn emit_compiled(
    compiled: &Compiled,
    format: Format,
    receiver: &str,
    name: Option<&str>,
    output: Option<&Path>,
    log: Log,
) {
    let unit = Unit {
        name: name.unwrap_or(&compiled.name),
        chain: &compiled.chain,
        program: &compiled.program,
    };
    let text = match create_emitter(format, receiver).emit(&[unit]) {
        Ok(text) => text,
        Err(d) => fail(Failure::bare(d)),
    };
    write_output(output, &text, log);
}

pub fn write_output(output: Option<&Path>, text: &str, log: Log) {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            log.status(format!("wrote {}", path.display()));
        }
        None => print!("{}", text),
    }
}

/// The manifest named on the command line, or the nearest chainexp.toml.
pub fn resolve_manifest(input: Option<PathBuf>) -> PathBuf {
    let path = match input {
        Some(p) if p.is_dir() => p.join(chainexp::config::MANIFEST_FILE),
        Some(p) => p,
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            match chainexp::config::Manifest::find(&cwd) {
                Some(p) => p,
                None => {
                    eprintln!("error: no chainexp.toml found in '{}' or its parents", cwd.display());
                    process::exit(1);
                }
            }
        }
    };
    if !path.exists() {
        eprintln!("error: '{}' does not exist", path.display());
        process::exit(1);
    }
    path
}
