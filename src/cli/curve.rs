use std::path::PathBuf;
use std::process;

use clap::Args;

use chainexp::chain::script::print_script;
use chainexp::curve::Sm9;
use chainexp::diagnostic::Diagnostic;
use chainexp::program::CompileOptions;
use chainexp::{Failure, WindowOracle};

use super::{fail, resolve_format, resolve_shape, Log};

#[derive(Args)]
pub struct CurveArgs {
    /// Sliding-window width for the chain search
    #[arg(long, default_value_t = 4)]
    pub window: u32,
    /// Squaring-run shape: run or unrolled
    #[arg(long, default_value = "run")]
    pub shape: String,
    /// Output format for --out-dir: listing, rust or json
    #[arg(long, default_value = "rust")]
    pub format: String,
    /// Write gfp_invert_sqrt and gfp2_sqrt into this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Also print each routine's addition chain
    #[arg(long)]
    pub full: bool,
}

pub fn cmd_curve(args: CurveArgs, log: Log) {
    let options = CompileOptions {
        shape: resolve_shape(&args.shape),
    };
    let format = resolve_format(&args.format);

    log.status(format!("Generating SM9 routines (window {})", args.window));
    let oracle = WindowOracle::new(args.window);
    let sm9 = match Sm9::new(&oracle, &options) {
        Ok(s) => s,
        Err(e) => fail(Failure::bare(Diagnostic::from(e))),
    };

    let programs = sm9.programs();
    let width = programs.iter().map(|(r, _, _)| r.name().len()).max().unwrap_or(0);
    for (routine, chain, program) in programs.iter() {
        println!(
            "{:<w$}  {:<3}  {:>22}  {}",
            routine.name(),
            routine.field(),
            program.op_counts().to_string(),
            program.fingerprint(),
            w = width
        );
        if args.full {
            for line in print_script(chain).lines() {
                println!("    {}", line);
            }
            println!();
        }
    }

    let Some(out_dir) = args.out_dir else {
        return;
    };
    let artifacts = match chainexp::api::curve_artifacts(programs, format, &out_dir) {
        Ok(a) => a,
        Err(failure) => fail(failure),
    };
    if let Err(d) = chainexp::write_artifacts(&artifacts) {
        eprintln!("error: {}", d.message);
        process::exit(1);
    }
    for artifact in &artifacts {
        log.status(format!("wrote {}", artifact.path.display()));
    }
}
