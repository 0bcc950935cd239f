// App-specific modules
pub mod assets;
pub mod config;
pub mod error;
pub mod ledger;
pub mod market;
pub mod tx;
pub mod utils;

pub use error::{ErrorKind, LedgerError, TrackerError};
