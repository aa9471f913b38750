use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::events::{read_events, Event};
use crate::logging::init_logging;
use crate::node::{write_fraudproof, WatchtowerNode};
use crate::service::{BlockDisposition, WatchtowerHandle, WatchtowerService, DEFAULT_QUEUE_CAPACITY};

#[derive(Debug, Parser)]
#[command(about = "Replay a block-event feed through the watchtower")]
pub struct Opts {
    /// Path to the watchtower config file
    #[clap(long)]
    pub config: PathBuf,

    /// JSON-lines feed of block and dispute events
    #[clap(long)]
    pub events: PathBuf,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub rejected: usize,
    pub failed: usize,
    pub fraudproofs: Vec<PathBuf>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let config = Config::from_filepath(&opts.config)?;
    init_logging(
        config.logs_path.clone(),
        config.logs_enabled,
        config.log_level.clone(),
    )?;

    let events = read_events(&opts.events)?;
    let node = WatchtowerNode::from_config(&config).context("Failed to start watchtower")?;
    let (handle, task) = WatchtowerService::spawn(Box::new(node.watchtower), DEFAULT_QUEUE_CAPACITY);

    let report = replay(&handle, &events, &config.outbox_dir()).await;
    drop(handle);
    task.await.context("watchtower service panicked")?;
    let report = report?;

    log::info!(
        "Replay finished: {} applied, {} rejected, {} failed, {} fraud proofs",
        report.applied,
        report.rejected,
        report.failed,
        report.fraudproofs.len()
    );
    for path in &report.fraudproofs {
        println!("{}", path.display());
    }

    Ok(())
}

/// Feed `events` to the service in order, writing fraud proofs into `outbox`
pub async fn replay(
    handle: &WatchtowerHandle,
    events: &[Event],
    outbox: &Path,
) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();

    for event in events {
        match event {
            Event::Block { .. } => {
                let block = match event.decode_block() {
                    Ok(block) => block,
                    Err(e) => {
                        log::warn!("Rejected block from feed: {}", e);
                        report.rejected += 1;
                        continue;
                    }
                };
                match handle.submit_block(block).await {
                    Ok(BlockDisposition::Applied { .. }) => report.applied += 1,
                    Ok(BlockDisposition::Rejected(reason)) => {
                        log::warn!("Rejected block: {}", reason);
                        report.rejected += 1;
                    }
                    Err(e) => {
                        log::error!("Failed to apply block: {:#}", e);
                        report.failed += 1;
                    }
                }
            }
            Event::Dispute { .. } => {
                let block = match event.decode_block() {
                    Ok(Some(block)) => block,
                    Ok(None) => {
                        log::warn!("Dispute event without a block");
                        report.rejected += 1;
                        continue;
                    }
                    Err(e) => {
                        log::warn!("Rejected disputed block from feed: {}", e);
                        report.rejected += 1;
                        continue;
                    }
                };
                match handle.construct_fraudproof(block).await {
                    Ok(fraudproof) => {
                        let path = write_fraudproof(outbox, &fraudproof)?;
                        log::info!("Fraud proof {} written to {}", fraudproof.hash(), path.display());
                        report.fraudproofs.push(path);
                    }
                    Err(e) => {
                        log::error!("Failed to construct fraud proof: {:#}", e);
                        report.failed += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}
