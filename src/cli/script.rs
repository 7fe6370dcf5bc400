use std::path::PathBuf;

use clap::Args;

use chainexp::program::CompileOptions;

use super::{emit_compiled, fail, resolve_format, resolve_shape, Log};

#[derive(Args)]
pub struct ScriptArgs {
    /// Chain script file
    pub input: PathBuf,
    /// Squaring-run shape: run or unrolled
    #[arg(long, default_value = "run")]
    pub shape: String,
    /// Output format: listing, rust or json
    #[arg(long, default_value = "listing")]
    pub format: String,
    /// Element type named in generated Rust code
    #[arg(long, default_value = "Fp")]
    pub receiver: String,
    /// Function name (default: file stem)
    #[arg(long)]
    pub name: Option<String>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_script(args: ScriptArgs, log: Log) {
    let options = CompileOptions {
        shape: resolve_shape(&args.shape),
    };
    let format = resolve_format(&args.format);

    log.status(format!("Generating {}", args.input.display()));
    let compiled = match chainexp::compile_script_file(&args.input, &options) {
        Ok(c) => c,
        Err(failure) => fail(failure),
    };
    log.compiled(&compiled);

    emit_compiled(
        &compiled,
        format,
        &args.receiver,
        args.name.as_deref(),
        args.output.as_deref(),
        log,
    );
}
