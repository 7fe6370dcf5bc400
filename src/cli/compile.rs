use std::path::PathBuf;
use std::process;

use clap::Args;

use chainexp::chain::parse_exponent;
use chainexp::program::CompileOptions;

use super::{emit_compiled, fail, resolve_format, resolve_shape, Log};

#[derive(Args)]
pub struct CompileArgs {
    /// Exponent, decimal or 0x-prefixed hex
    pub exponent: String,
    /// Sliding-window width for the chain search
    #[arg(long, default_value_t = 4)]
    pub window: u32,
    /// Squaring-run shape: run or unrolled
    #[arg(long, default_value = "run")]
    pub shape: String,
    /// Output format: listing, rust or json
    #[arg(long, default_value = "listing")]
    pub format: String,
    /// Element type named in generated Rust code
    #[arg(long, default_value = "Fp")]
    pub receiver: String,
    /// Function name (default: exp_<hex>)
    #[arg(long)]
    pub name: Option<String>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_compile(args: CompileArgs, log: Log) {
    let Some(exponent) = parse_exponent(&args.exponent) else {
        eprintln!("error: invalid exponent '{}'", args.exponent);
        process::exit(1);
    };
    let options = CompileOptions {
        shape: resolve_shape(&args.shape),
    };
    let format = resolve_format(&args.format);

    log.status(format!("Generating x^{:#x} (window {})", exponent, args.window));
    let compiled = match chainexp::compile_exponent(&exponent, args.window, &options) {
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
