use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use modal_watchtower::{Ed25519Key, Genesis, SigningKey};

use crate::config::Config;
use crate::keyfile::Keyfile;

pub const CONFIG_FILE: &str = "config.json";
pub const KEY_FILE: &str = "watchtower.passfile";
pub const GENESIS_FILE: &str = "genesis.json";

#[derive(Debug, Parser)]
#[command(about = "Create a watchtower key, devnet genesis and config")]
pub struct Opts {
    /// Directory to initialize
    #[clap(long)]
    pub dir: PathBuf,

    /// Gas limit of the devnet genesis block
    #[clap(long, default_value_t = 30_000_000)]
    pub gas_limit: u64,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let config_path = opts.dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!(
            "Config already exists at {}. Please choose a different directory or remove it.",
            config_path.display()
        );
    }
    fs::create_dir_all(&opts.dir)
        .with_context(|| format!("Failed to create {}", opts.dir.display()))?;

    let key = Ed25519Key::generate();
    Keyfile::from_key(&key).save(&opts.dir.join(KEY_FILE))?;

    Genesis::new(opts.gas_limit)
        .with_account(key.address(), 0)
        .save(&opts.dir.join(GENESIS_FILE))?;

    let config = Config {
        passfile_path: Some(PathBuf::from(KEY_FILE)),
        genesis_path: Some(PathBuf::from(GENESIS_FILE)),
        outbox_path: Some(PathBuf::from("outbox")),
        logs_path: Some(PathBuf::from("logs")),
        logs_enabled: Some(true),
        log_level: Some("info".to_string()),
        txpool_enabled: Some(true),
    };
    config.save(&config_path)?;

    println!("Initialized watchtower in {}", opts.dir.display());
    println!("Config: {}", config_path.display());
    println!("Watchtower account: {}", key.address());
    println!("\nKeep {} secure and never share it!", KEY_FILE);

    Ok(())
}
