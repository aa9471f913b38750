//! Node around the `modal-watchtower` library: configuration, logging, key
//! files, the block-event feed and a tokio service that owns the watchtower.

pub mod cmds;
pub mod config;
pub mod events;
pub mod keyfile;
pub mod logging;
pub mod node;
pub mod service;

pub use config::Config;
pub use events::Event;
pub use keyfile::Keyfile;
pub use node::WatchtowerNode;
pub use service::{BlockDisposition, WatchtowerHandle, WatchtowerService};
