use std::path::{Path, PathBuf};

use num_bigint::BigUint;

use crate::chain::parse_exponent;
use crate::diagnostic::Diagnostic;
use crate::emit::Format;
use crate::program::SquareShape;
use crate::span::Span;

pub const MANIFEST_FILE: &str = "chainexp.toml";

/// Settings shared by every program unless overridden.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Defaults {
    pub window: u32,
    pub shape: SquareShape,
    pub format: Format,
    pub receiver: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            window: 4,
            shape: SquareShape::Run,
            format: Format::Listing,
            receiver: "Fp".to_string(),
        }
    }
}

/// Where a program's chain comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Search a chain with the window oracle.
    Exponent(BigUint),
    /// Parse a chain script (path relative to the manifest).
    Script(PathBuf),
}

/// One `[program.<name>]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSpec {
    pub name: String,
    pub source: Source,
    /// Output file; `None` means `<name>.<extension>` next to the manifest.
    pub output: Option<PathBuf>,
    pub window: u32,
    pub shape: SquareShape,
    pub format: Format,
    pub receiver: String,
}

/// Build configuration from chainexp.toml.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub root_dir: PathBuf,
    pub defaults: Defaults,
    /// Programs in declaration order.
    pub programs: Vec<ProgramSpec>,
}

/// A `[program.<name>]` section before defaults are applied.
#[derive(Default)]
struct PendingProgram {
    name: String,
    span: Span,
    exponent: Option<BigUint>,
    script: Option<PathBuf>,
    output: Option<PathBuf>,
    window: Option<u32>,
    shape: Option<SquareShape>,
    format: Option<Format>,
    receiver: Option<String>,
}

fn parse_window(value: &str, span: Span) -> Result<u32, Diagnostic> {
    match value.parse::<u32>() {
        Ok(w) if (1..=16).contains(&w) => Ok(w),
        _ => Err(Diagnostic::error(
            format!("window must be an integer in 1..=16, found '{}'", value),
            span,
        )),
    }
}

fn parse_shape(value: &str, span: Span) -> Result<SquareShape, Diagnostic> {
    SquareShape::parse(value).ok_or_else(|| {
        Diagnostic::error(format!("unknown shape '{}'", value), span)
            .with_help("expected \"run\" or \"unrolled\"".to_string())
    })
}

fn parse_format(value: &str, span: Span) -> Result<Format, Diagnostic> {
    Format::parse(value).ok_or_else(|| {
        Diagnostic::error(format!("unknown format '{}'", value), span)
            .with_help("expected \"listing\", \"rust\" or \"json\"".to_string())
    })
}

impl Manifest {
    /// Load a manifest file.
    pub fn load(toml_path: &Path) -> Result<Manifest, Diagnostic> {
        let content = std::fs::read_to_string(toml_path).map_err(|e| {
            Diagnostic::error(
                format!("cannot read '{}': {}", toml_path.display(), e),
                Span::dummy(),
            )
        })?;
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Manifest::parse(&content, root_dir)
    }

    /// Section-aware minimal TOML parsing. Spans in the returned
    /// diagnostic index into `content`.
    pub fn parse(content: &str, root_dir: PathBuf) -> Result<Manifest, Diagnostic> {
        let mut defaults = Defaults::default();
        let mut pending: Vec<PendingProgram> = Vec::new();
        let mut current_section = String::new();

        let mut offset = 0usize;
        for line in content.split_inclusive('\n') {
            let start = offset;
            offset += line.len();

            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            let lead = line.len() - line.trim_start().len();
            let span = Span::new((start + lead) as u32, (start + lead + trimmed.len()) as u32);

            // Section headers: [defaults], [program.invert], etc.
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                current_section = trimmed[1..trimmed.len() - 1].trim().to_string();
                if let Some(name) = current_section.strip_prefix("program.") {
                    let name = name.trim_matches('"').to_string();
                    if name.is_empty() {
                        return Err(Diagnostic::error("program section without a name".to_string(), span));
                    }
                    if pending.iter().any(|p| p.name == name) {
                        return Err(Diagnostic::error(format!("program '{}' is declared twice", name), span));
                    }
                    pending.push(PendingProgram {
                        name,
                        span,
                        ..PendingProgram::default()
                    });
                } else if current_section != "defaults" {
                    return Err(Diagnostic::error(
                        format!("unknown section '[{}]'", current_section),
                        span,
                    )
                    .with_help("sections are [defaults] and [program.<name>]".to_string()));
                }
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(Diagnostic::error("expected 'key = value'".to_string(), span));
            };
            let key = key.trim().trim_matches('"');
            // strip trailing comments outside quotes
            let value = match value.trim().strip_prefix('"') {
                Some(rest) => rest.split('"').next().unwrap_or(""),
                None => value.split('#').next().unwrap_or("").trim(),
            };

            if current_section == "defaults" {
                match key {
                    "window" => defaults.window = parse_window(value, span)?,
                    "shape" => defaults.shape = parse_shape(value, span)?,
                    "format" => defaults.format = parse_format(value, span)?,
                    "receiver" => defaults.receiver = value.to_string(),
                    _ => {
                        return Err(Diagnostic::error(
                            format!("unknown key '{}' in [defaults]", key),
                            span,
                        ))
                    }
                }
            } else if let Some(program) = pending.last_mut().filter(|_| current_section.starts_with("program.")) {
                match key {
                    "exponent" => {
                        let exponent = parse_exponent(value).ok_or_else(|| {
                            Diagnostic::error(format!("invalid exponent '{}'", value), span)
                                .with_help("write the exponent in decimal or as 0x-prefixed hex".to_string())
                        })?;
                        program.exponent = Some(exponent);
                    }
                    "script" => program.script = Some(PathBuf::from(value)),
                    "output" => program.output = Some(PathBuf::from(value)),
                    "window" => program.window = Some(parse_window(value, span)?),
                    "shape" => program.shape = Some(parse_shape(value, span)?),
                    "format" => program.format = Some(parse_format(value, span)?),
                    "receiver" => program.receiver = Some(value.to_string()),
                    _ => {
                        return Err(Diagnostic::error(
                            format!("unknown key '{}' in program '{}'", key, program.name),
                            span,
                        ))
                    }
                }
            } else {
                return Err(Diagnostic::error(
                    format!("key '{}' outside of any section", key),
                    span,
                ));
            }
        }

        let mut programs = Vec::with_capacity(pending.len());
        for p in pending {
            let source = match (p.exponent, p.script) {
                (Some(e), None) => Source::Exponent(e),
                (None, Some(path)) => Source::Script(root_dir.join(path)),
                (Some(_), Some(_)) => {
                    return Err(Diagnostic::error(
                        format!("program '{}' sets both 'exponent' and 'script'", p.name),
                        p.span,
                    ))
                }
                (None, None) => {
                    return Err(Diagnostic::error(
                        format!("program '{}' needs an 'exponent' or a 'script'", p.name),
                        p.span,
                    ))
                }
            };
            programs.push(ProgramSpec {
                name: p.name,
                source,
                output: p.output.map(|o| root_dir.join(o)),
                window: p.window.unwrap_or(defaults.window),
                shape: p.shape.unwrap_or(defaults.shape),
                format: p.format.unwrap_or(defaults.format),
                receiver: p.receiver.unwrap_or_else(|| defaults.receiver.clone()),
            });
        }

        Ok(Manifest {
            root_dir,
            defaults,
            programs,
        })
    }

    /// Try to find a chainexp.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }
}
