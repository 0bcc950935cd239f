//! Command line front end for the car market.
//!
//! Signing happens elsewhere: operations take the signed transaction as hex.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use car_market::assets::{self, CarData, CarMutableData};
use car_market::config::settings::{Settings, DEFAULT_SETTINGS_PATH};
use car_market::ledger;
use car_market::market::notify::LogNotifier;
use car_market::market::{Completion, Marketplace};
use car_market::tx::{Operation, OperationKind, PollOutcome};

#[derive(Parser)]
#[command(name = "market", about = "Car market operation tracker")]
struct Cli {
    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the tokens deployed on the ledger
    Tokens,
    /// Show balances and owned cars of an address
    Account { address: String },
    /// Check whether an address owns the configured token
    Owns { address: String },
    /// Print a random car payload (ROM and RAM hex) to embed in a mint script
    NewCar {
        #[arg(long)]
        name: String,
    },
    /// Submit a signed token creation
    Create {
        #[arg(long)]
        address: String,
        #[arg(long)]
        tx: String,
    },
    /// Submit a signed mint of the given car payload
    Mint {
        #[arg(long)]
        address: String,
        #[arg(long)]
        rom: String,
        #[arg(long)]
        ram: String,
        #[arg(long)]
        tx: String,
    },
    /// Submit a signed market operation
    Market {
        #[arg(value_enum)]
        action: MarketAction,
        #[arg(long)]
        address: String,
        #[arg(long)]
        tx: String,
    },
    /// Poll an already submitted transaction; Ctrl-C asks the ledger to cancel it
    Watch {
        #[arg(value_enum)]
        kind: KindArg,
        hash: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MarketAction {
    Sell,
    Buy,
    Remove,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Create,
    Mint,
    Sell,
    Buy,
    Remove,
}

impl From<KindArg> for OperationKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Create => OperationKind::CreateToken,
            KindArg::Mint => OperationKind::MintToken,
            KindArg::Sell => OperationKind::SellAsset,
            KindArg::Buy => OperationKind::BuyAsset,
            KindArg::Remove => OperationKind::RemoveAsset,
        }
    }
}

fn load_settings(path: &PathBuf) -> Result<Settings> {
    if path.exists() {
        Settings::load_from_file(path)
    } else {
        info!("No settings at {:?}, using defaults", path);
        Ok(Settings::default())
    }
}

fn report<T: std::fmt::Debug>(completion: Completion<T>) {
    match completion {
        Completion::Done(v) => println!("✅ {:?}", v),
        Completion::Superseded => println!("⏹️ Tracking stopped before a result arrived"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = load_settings(&cli.settings)?;
    let ledger = ledger::from_settings(&settings)?;
    let market = Arc::new(Marketplace::new(settings, ledger, Arc::new(LogNotifier)));

    match cli.command {
        Command::Tokens => {
            market.load_tokens().await?;
            let symbol = &market.settings().token_symbol;
            match market.token(symbol).await {
                Some(token) => println!("{} ({}) supply {}/{}", token.symbol, token.name, token.current_supply, token.max_supply),
                None => println!(
                    "{} ({}) has not been created yet",
                    market.settings().token_name,
                    symbol
                ),
            }
        }
        Command::Account { address } => {
            market.load_tokens().await?;
            let summary = market.login(&address).await?;
            println!("Name: {}", summary.name);
            let soul = &market.settings().soul_symbol;
            if summary.balance(soul).is_none() {
                println!("No {} balance: operations cannot pay for gas", soul);
            }
            for line in &summary.balances {
                println!("{}", line);
            }
            for car in market.cars().snapshot().await {
                println!(
                    "#{} {} power {} speed {} ({:?})",
                    car.token_id, car.mutable.name, car.mutable.power, car.mutable.speed, car.data.rarity
                );
            }
        }
        Command::Owns { address } => {
            market.login(&address).await?;
            println!("{}", market.owns_token().await?);
        }
        Command::NewCar { name } => {
            let (data, mutable) = assets::random_car(&name, market.settings().car_image_count);
            println!("rom {}", assets::encode_hex(&data)?);
            println!("ram {}", assets::encode_hex(&mutable)?);
        }
        Command::Create { address, tx } => {
            market.load_tokens().await?;
            market.login(&address).await?;
            let signed = hex::decode(tx.trim()).context("decoding --tx")?;
            report(market.create_token(&signed).await?);
        }
        Command::Mint { address, rom, ram, tx } => {
            market.load_tokens().await?;
            market.login(&address).await?;
            let data: CarData = assets::decode_hex(&rom)?;
            let mutable: CarMutableData = assets::decode_hex(&ram)?;
            let signed = hex::decode(tx.trim()).context("decoding --tx")?;
            report(market.mint_token(data, mutable, &signed).await?);
        }
        Command::Market { action, address, tx } => {
            market.load_tokens().await?;
            market.login(&address).await?;
            let signed = hex::decode(tx.trim()).context("decoding --tx")?;
            let completion = match action {
                MarketAction::Sell => market.sell_asset(&signed).await?,
                MarketAction::Buy => market.buy_asset(&signed).await?,
                MarketAction::Remove => market.remove_asset(&signed).await?,
            };
            match completion {
                Completion::Done(tx) => println!("✅ {} confirmed in block {}", tx.hash, tx.block_height),
                Completion::Superseded => println!("⏹️ Tracking stopped before a result arrived"),
            }
        }
        Command::Watch { kind, hash } => {
            let poll = market.tracker().track(Operation::new(kind.into(), hash));
            tokio::select! {
                outcome = poll.outcome() => match outcome {
                    Some(PollOutcome::Confirmed(tx)) => println!("✅ confirmed in block {} with {} events", tx.block_height, tx.events.len()),
                    Some(PollOutcome::Failed(e)) => println!("❌ {}", e),
                    Some(PollOutcome::Superseded) => println!("🔁 superseded"),
                    None => println!("⏹️ stopped"),
                },
                _ = tokio::signal::ctrl_c() => {
                    let _ = market.cancel_transaction().await;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn market_action_parses() {
        let cli = Cli::try_parse_from(["market", "market", "sell", "--address", "P2K", "--tx", "AB"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Market { action: MarketAction::Sell, .. }
        ));
    }
}
