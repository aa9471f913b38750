use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use modal_watchtower::{inspect_fraudproof, Block, Ed25519TxSigner};

#[derive(Debug, Parser)]
#[command(about = "Check a saved fraud-proof block")]
pub struct Opts {
    /// Path to the fraud-proof block JSON
    #[clap(long)]
    pub path: PathBuf,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let bytes = fs::read(&opts.path)
        .with_context(|| format!("Failed to read {}", opts.path.display()))?;
    let block = Block::from_json(&bytes)?;
    let summary = inspect_fraudproof(&block, &Ed25519TxSigner)?;

    println!("Fraud proof {} is well formed", block.hash());
    println!("  contests block:   {}", summary.malicious_block);
    println!("  accuser:          {}", summary.accuser);
    println!("  accused:          {}", summary.accused);
    println!("  dispute tx:       {} (nonce {})", summary.dispute_tx, summary.nonce);

    Ok(())
}
