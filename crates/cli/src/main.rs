mod cmd;
mod logging;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "luabox", version, about = "Run Lua scripts inside a sandbox")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and print resolved paths
    Doctor,

    /// Run a script from the sandbox filesystem
    Run(RunArgs),

    /// List a directory of the sandbox filesystem
    Ls(LsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Script path, resolved against the sandbox root and mounts
    pub script: String,

    /// Arguments exposed through `...` and `luabox.getArgs()`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Directory to list (defaults to the root)
    #[arg(default_value = "/")]
    pub path: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Doctor => {
            cmd::doctor::run(cli.config.as_deref(), cli.profile.as_deref());
            Ok(())
        }
        Commands::Run(args) => {
            cmd::run::run(cli.config.as_deref(), cli.profile.as_deref(), &args.script, args.args)
        }
        Commands::Ls(args) => {
            cmd::ls::run(cli.config.as_deref(), cli.profile.as_deref(), &args.path)
        }
    };
    logging::shutdown();
    result
}
