use anyhow::Result;
use clap::{Parser, Subcommand};

use modal_watchtower_node::cmds;

#[derive(Parser)]
#[command(name = "modal-watchtower")]
#[command(version = clap::crate_version!())]
#[command(about = "Modality watchtower: re-validates sequencer blocks and contests invalid ones", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Init(cmds::init::Opts),

    Run(cmds::run::Opts),

    Verify(cmds::verify::Opts),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Init(opts) => cmds::init::run(opts).await?,
        Commands::Run(opts) => cmds::run::run(opts).await?,
        Commands::Verify(opts) => cmds::verify::run(opts).await?,
    }

    Ok(())
}
