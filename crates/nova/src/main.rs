mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Run(args)) => run::run(args),
        Some(Command::List(args)) => run::list(args.json),
        Some(Command::Info(args)) => run::info(&args.id, args.json),
        Some(Command::Config(args)) => run::show_config(args),
        None => run::run(cli.run),
    }
}
