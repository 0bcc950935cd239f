pub mod iface;
pub mod rpc;
pub mod types;

use std::sync::Arc;

use crate::config::settings::Settings;

pub use iface::{Ledger, LedgerResult};
pub use rpc::RpcLedger;

/// Returns the HTTP ledger client described by `settings`.
pub fn from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn Ledger>> {
    Ok(Arc::new(RpcLedger::new(
        settings.rpc_url.clone(),
        settings.request_timeout(),
    )?))
}
