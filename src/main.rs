use anyhow::Result;
use clap::Parser;
use filetrack::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
