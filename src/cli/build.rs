use std::path::PathBuf;
use std::process;

use clap::Args;

use chainexp::config::Manifest;
use chainexp::diagnostic::render_diagnostics;
use chainexp::{build_manifest, write_artifacts};

use super::{fail, resolve_manifest, Log};

#[derive(Args)]
pub struct BuildArgs {
    /// chainexp.toml, or a directory containing one (default: search upwards)
    pub input: Option<PathBuf>,
    /// Compile and report without writing files
    #[arg(long)]
    pub dry_run: bool,
}

pub fn cmd_build(args: BuildArgs, log: Log) {
    let toml_path = resolve_manifest(args.input);
    let content = match std::fs::read_to_string(&toml_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", toml_path.display(), e);
            process::exit(1);
        }
    };
    let root_dir = toml_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let manifest = match Manifest::parse(&content, root_dir) {
        Ok(m) => m,
        Err(d) => {
            render_diagnostics(&[d], &toml_path.display().to_string(), &content);
            process::exit(1);
        }
    };

    log.status(format!(
        "Generating {} program(s) from {}",
        manifest.programs.len(),
        toml_path.display()
    ));
    let artifacts = match build_manifest(&manifest) {
        Ok(a) => a,
        Err(failure) => fail(failure),
    };

    for artifact in &artifacts {
        for p in &artifact.programs {
            log.status(format!("compiled {} ({}) {}", p.name, p.counts, p.fingerprint));
        }
    }

    if args.dry_run {
        return;
    }
    if let Err(d) = write_artifacts(&artifacts) {
        eprintln!("error: {}", d.message);
        process::exit(1);
    }
    for artifact in &artifacts {
        log.status(format!("wrote {}", artifact.path.display()));
    }
}
