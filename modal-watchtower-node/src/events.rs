//! Block-event feed read by `modal-watchtower run`.
//!
//! One JSON object per line:
//! `{"kind":"block","block":{...}}` for blocks announced by the sequencer and
//! `{"kind":"dispute","block":{...}}` for blocks the watchtower should contest.
//! A `null` block is passed through so the validation gate can reject it.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use modal_watchtower::{Block, WatchtowerError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Block { block: serde_json::Value },
    Dispute { block: serde_json::Value },
}

impl Event {
    pub fn block(block: &Block) -> Self {
        Event::Block {
            block: serde_json::to_value(block).expect("serialization should not fail"),
        }
    }

    pub fn dispute(block: &Block) -> Self {
        Event::Dispute {
            block: serde_json::to_value(block).expect("serialization should not fail"),
        }
    }

    fn raw_block(&self) -> &serde_json::Value {
        match self {
            Event::Block { block } | Event::Dispute { block } => block,
        }
    }

    /// Decode the carried block; `Ok(None)` when the feed carried `null`
    pub fn decode_block(&self) -> Result<Option<Block>, WatchtowerError> {
        let raw = self.raw_block();
        if raw.is_null() {
            return Ok(None);
        }
        let bytes = serde_json::to_vec(raw)
            .map_err(|e| WatchtowerError::InvalidBlock(format!("malformed block: {}", e)))?;
        Block::from_json(&bytes).map(Some)
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self).expect("serialization should not fail")
    }
}

pub fn parse_events(contents: &str) -> Result<Vec<Event>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| anyhow!("event on line {}: {}", idx + 1, e))
        })
        .collect()
}

pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event feed {}", path.display()))?;
    parse_events(&contents)
}
