mod cli;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chainexp",
    version,
    about = "Addition-chain compiler for constant-time field exponentiation"
)]
struct Cli {
    /// Suppress status lines on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a chain for an exponent, compile it and emit the program
    Compile(cli::compile::CompileArgs),
    /// Compile a chain script
    Script(cli::script::ScriptArgs),
    /// Compile every program of a chainexp.toml manifest
    Build(cli::build::BuildArgs),
    /// Show (or emit) the compiled SM9 routines
    Curve(cli::curve::CurveArgs),
}

fn main() {
    let cli = Cli::parse();
    let log = cli::Log { quiet: cli.quiet };

    match cli.command {
        Command::Compile(args) => cli::compile::cmd_compile(args, log),
        Command::Script(args) => cli::script::cmd_script(args, log),
        Command::Build(args) => cli::build::cmd_build(args, log),
        Command::Curve(args) => cli::curve::cmd_curve(args, log),
    }
}
