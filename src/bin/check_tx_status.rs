//! Quick one-shot check of a transaction's status
//!
//! Usage: cargo run --bin check_tx_status -- <hash>

use anyhow::{Context, Result};
use car_market::config::settings::Settings;
use car_market::ledger::{self, Ledger};
use car_market::tx::events::EventKind;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let hash = std::env::args()
        .nth(1)
        .context("usage: check_tx_status <hash>")?;

    let settings = Settings::load().unwrap_or_default();
    let ledger = ledger::from_settings(&settings)?;

    println!("🔍 Checking transaction status for: {}", hash);
    println!("📤 Node: {}", settings.rpc_url);

    match ledger.get_transaction(&hash).await {
        Ok(tx) => {
            println!("✅ Transaction confirmed:");
            println!("   Block height: {}", tx.block_height);
            if let Some(at) = tx.confirmed_at() {
                println!("   Timestamp: {}", at.to_rfc3339());
            }
            println!("   Events: {}", tx.events.len());
            for evt in &tx.events {
                let known = evt
                    .event_kind()
                    .map(|k: EventKind| k.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("   - {} [{}] {} bytes", evt.kind, known, evt.data.len() / 2);
            }
        }
        Err(e) if e.is_pending() => println!("⏳ Transaction is still pending"),
        Err(e) => println!("❌ {}", e),
    }

    Ok(())
}
