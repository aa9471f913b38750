use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use modal_watchtower::{Ed25519Key, Genesis};

use crate::keyfile::Keyfile;

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    pub passfile_path: Option<PathBuf>,
    pub genesis_path: Option<PathBuf>,
    pub outbox_path: Option<PathBuf>,
    pub logs_path: Option<PathBuf>,
    pub logs_enabled: Option<bool>,
    pub log_level: Option<String>,
    pub txpool_enabled: Option<bool>,
}

impl Config {
    pub fn from_filepath(path: &Path) -> Result<Config> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let mut config: Config = serde_json::from_reader(file)
            .context("Failed to parse config file")?;

        let config_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        config.passfile_path = resolve(&config_dir, config.passfile_path)?;
        config.genesis_path = resolve(&config_dir, config.genesis_path)?;
        config.outbox_path = resolve(&config_dir, config.outbox_path)?;
        config.logs_path = resolve(&config_dir, config.logs_path)?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn load_key(&self) -> Result<Ed25519Key> {
        let path = self
            .passfile_path
            .as_ref()
            .ok_or_else(|| anyhow!("passfile_path is not configured"))?;
        Keyfile::load(path)?.into_key()
    }

    pub fn load_genesis(&self) -> Result<Genesis> {
        let path = self
            .genesis_path
            .as_ref()
            .ok_or_else(|| anyhow!("genesis_path is not configured"))?;
        Genesis::from_filepath(path)
    }

    /// Fraud proofs go to the outbox; defaults to `./outbox`
    pub fn outbox_dir(&self) -> PathBuf {
        self.outbox_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("outbox"))
    }

    pub fn txpool_enabled(&self) -> bool {
        self.txpool_enabled.unwrap_or(true)
    }
}

fn resolve(config_dir: &Path, path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    path.map(|p| to_absolute_path(config_dir, &p)).transpose()
}

pub fn to_absolute_path(base_dir: &Path, relative_path: &Path) -> Result<PathBuf> {
    if relative_path.is_absolute() {
        return Ok(relative_path.to_path_buf());
    }
    let base_dir = base_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", base_dir.display()))?;
    Ok(base_dir.join(relative_path))
}
