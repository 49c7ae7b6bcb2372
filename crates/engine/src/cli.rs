use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sentinel-engine", version, about = "IoT sentinel rule engine")]
pub struct Opts {
    #[clap(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the engine (default)
    Run(RunArgs),
    /// Compile a rule script and verify it exports the entry point
    CheckScript(CheckScriptArgs),
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct RunArgs {
    #[arg(long, short, help = "Path to engine config file")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, PartialEq)]
pub struct CheckScriptArgs {
    /// `.wasm` or `.wat` file
    pub path: PathBuf,
}

impl Opts {
    pub fn command(self) -> Commands {
        self.cmd.unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }
}
