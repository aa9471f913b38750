//! CLI commands for the watchtower node:
//! - `init`: create a key file, devnet genesis and config in a directory
//! - `run`: replay a block-event feed through the watchtower
//! - `verify`: check a saved fraud-proof block

pub mod init;
pub mod run;
pub mod verify;
