pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod server;
