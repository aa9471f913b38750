//! Hosts a watchtower controller on a single blocking task.
//!
//! The controller is not safe for concurrent mutation of its chain and pool,
//! so every request is funnelled through one mpsc channel and handled in
//! arrival order. Callers hold a cloneable [`WatchtowerHandle`].

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use modal_watchtower::{Block, Hash, WatchTower, WatchtowerError};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockDisposition {
    Applied { number: u64, hash: Hash },
    Rejected(String),
}

enum Request {
    Block {
        block: Option<Block>,
        respond_to: oneshot::Sender<Result<BlockDisposition, WatchtowerError>>,
    },
    Fraudproof {
        block: Block,
        respond_to: oneshot::Sender<Result<Block, WatchtowerError>>,
    },
}

#[derive(Clone)]
pub struct WatchtowerHandle {
    tx: mpsc::Sender<Request>,
}

pub struct WatchtowerService;

impl WatchtowerService {
    /// Move `watchtower` onto its own task and return a handle to it.
    ///
    /// The task ends once every handle has been dropped.
    pub fn spawn(
        watchtower: Box<dyn WatchTower>,
        capacity: usize,
    ) -> (WatchtowerHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity);
        let task = tokio::task::spawn_blocking(move || {
            log::info!("Watchtower service started");
            while let Some(request) = rx.blocking_recv() {
                handle_request(watchtower.as_ref(), request);
            }
            log::info!("Watchtower service stopped");
        });
        (WatchtowerHandle { tx }, task)
    }
}

fn handle_request(watchtower: &dyn WatchTower, request: Request) {
    match request {
        Request::Block { block, respond_to } => {
            let result = check_and_apply(watchtower, block.as_ref());
            if respond_to.send(result).is_err() {
                log::debug!("block submitter went away before the reply");
            }
        }
        Request::Fraudproof { block, respond_to } => {
            let result = watchtower.construct_fraudproof(&block);
            if respond_to.send(result).is_err() {
                log::debug!("fraud proof requester went away before the reply");
            }
        }
    }
}

fn check_and_apply(
    watchtower: &dyn WatchTower,
    block: Option<&Block>,
) -> Result<BlockDisposition, WatchtowerError> {
    if let Err(e) = watchtower.check_block_fully(block) {
        return Ok(BlockDisposition::Rejected(e.to_string()));
    }
    // check_block_fully rejects None
    let Some(block) = block else {
        return Ok(BlockDisposition::Rejected("block == nil".to_string()));
    };
    watchtower.apply(block)?;
    Ok(BlockDisposition::Applied {
        number: block.number(),
        hash: block.hash(),
    })
}

impl WatchtowerHandle {
    /// Run the validation gate on `block` and commit it if acceptable
    pub async fn submit_block(&self, block: Option<Block>) -> Result<BlockDisposition> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(Request::Block { block, respond_to })
            .await
            .map_err(|_| anyhow!("watchtower service is not running"))?;
        let disposition = response
            .await
            .map_err(|_| anyhow!("watchtower service dropped the request"))??;
        Ok(disposition)
    }

    pub async fn construct_fraudproof(&self, block: Block) -> Result<Block> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(Request::Fraudproof { block, respond_to })
            .await
            .map_err(|_| anyhow!("watchtower service is not running"))?;
        let fraudproof = response
            .await
            .map_err(|_| anyhow!("watchtower service dropped the request"))??;
        Ok(fraudproof)
    }
}
