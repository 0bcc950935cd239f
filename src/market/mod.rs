//! Car market session: token registry, account login and the
//! submit → track → decode → reconcile flows behind every user action.
//!
//! Collaborators come in through [`Marketplace::new`]; nothing here is
//! global.

pub mod notify;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{info, warn};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::assets::{Car, CarData, CarMutableData, TokenId};
use crate::config::settings::Settings;
use crate::error::TrackerError;
use crate::ledger::types::{Account, Balance, TokenInfo, Transaction};
use crate::ledger::Ledger;
use crate::tx::events;
use crate::tx::{Operation, OperationKind, OperationTracker, PollOutcome};
use crate::utils::asset_cache::AssetCache;

use notify::{Notice, Notifier, Status};

const CREATE_FAILED_MESSAGE: &str = "Something failed on the connection to the blockchain. Please try again.";
const MINT_FAILED_MESSAGE: &str = "Something failed while executing a new token mint. Please try again.";

/// How a tracked flow ended when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion<T> {
    Done(T),
    /// A newer operation or a cancellation stopped the poll first.
    Superseded,
}

impl<T> Completion<T> {
    pub fn done(self) -> Option<T> {
        match self {
            Completion::Done(v) => Some(v),
            Completion::Superseded => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub address: Option<String>,
    pub is_token_created: bool,
    pub is_token_owner: bool,
    pub token_current_supply: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceLine {
    pub chain: String,
    pub symbol: String,
    pub amount: Decimal,
}

impl fmt::Display for BalanceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chain: {} - {} {}", self.chain, self.amount, self.symbol)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSummary {
    pub address: String,
    pub name: String,
    pub balances: Vec<BalanceLine>,
}

impl AccountSummary {
    pub fn balance(&self, symbol: &str) -> Option<&BalanceLine> {
        self.balances.iter().find(|b| b.symbol == symbol)
    }
}

pub struct Marketplace {
    settings: Settings,
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    tracker: OperationTracker,
    cars: AssetCache,
    tokens: RwLock<HashMap<String, TokenInfo>>,
    session: RwLock<Session>,
}

impl Marketplace {
    pub fn new(settings: Settings, ledger: Arc<dyn Ledger>, notifier: Arc<dyn Notifier>) -> Self {
        let tracker = OperationTracker::new(Arc::clone(&ledger), settings.confirmation_delay());
        Self {
            settings,
            ledger,
            notifier,
            tracker,
            cars: AssetCache::new(),
            tokens: RwLock::new(HashMap::new()),
            session: RwLock::new(Session::default()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tracker(&self) -> &OperationTracker {
        &self.tracker
    }

    pub fn cars(&self) -> &AssetCache {
        &self.cars
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn token(&self, symbol: &str) -> Option<TokenInfo> {
        self.tokens.read().await.get(symbol).cloned()
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /* ------------------------------ queries --------------------------- */

    /// Refresh the token registry. Returns how many tokens the ledger lists.
    pub async fn load_tokens(&self) -> Result<usize, TrackerError> {
        self.session.write().await.is_token_created = false;
        self.notify(Notice::progress("Fetching Phantasma tokens..."));

        let listed = match self.ledger.list_tokens().await {
            Ok(listed) => listed,
            Err(e) => {
                self.notify(Notice::fail(e.to_string()));
                return Err(e.into());
            }
        };

        let created = listed.iter().any(|t| t.symbol == self.settings.token_symbol);
        let count = listed.len();
        {
            let mut tokens = self.tokens.write().await;
            tokens.clear();
            tokens.extend(listed.into_iter().map(|t| (t.symbol.clone(), t)));
        }
        self.session.write().await.is_token_created = created;

        info!("📚 [MARKET] {} tokens listed, {} created: {}", count, self.settings.token_symbol, created);
        Ok(count)
    }

    /// Open a session for `address`: balances plus a full rebuild of the
    /// owned car cache.
    pub async fn login(&self, address: &str) -> Result<AccountSummary, TrackerError> {
        self.notify(Notice::progress("Fetching account data from the blockchain..."));

        let summary = match self.sync_account(address).await {
            Ok(summary) => summary,
            Err(e) => {
                self.notify(Notice::fail(e.to_string()));
                return Err(e);
            }
        };

        self.session.write().await.address = Some(address.to_string());
        let soul = summary
            .balance(&self.settings.soul_symbol)
            .map(|b| b.amount)
            .unwrap_or_default();
        info!(
            "🔑 [MARKET] Logged in as {} ({}), {} {}",
            summary.name, address, soul, self.settings.soul_symbol
        );
        Ok(summary)
    }

    /// Whether the session address owns the configured token.
    pub async fn owns_token(&self) -> Result<bool, TrackerError> {
        let address = self.require_session().await?;
        self.session.write().await.is_token_owner = false;
        self.notify(Notice::progress("Fetching tokens from the blockchain..."));

        let listed = match self.ledger.list_tokens().await {
            Ok(listed) => listed,
            Err(e) => {
                self.notify(Notice::fail(e.to_string()));
                return Err(e.into());
            }
        };

        let owner = listed
            .iter()
            .any(|t| t.symbol == self.settings.token_symbol && t.owner_address == address);
        self.session.write().await.is_token_owner = owner;
        Ok(owner)
    }

    pub async fn logout(&self) {
        *self.session.write().await = Session::default();
        self.cars.clear().await;
        info!("👋 [MARKET] Logged out");
    }

    async fn require_session(&self) -> Result<String, TrackerError> {
        self.session
            .read()
            .await
            .address
            .clone()
            .ok_or(TrackerError::NotLoggedIn)
    }

    async fn sync_account(&self, address: &str) -> Result<AccountSummary, TrackerError> {
        let account = self.ledger.get_account(address).await?;
        let tokens = self.tokens.read().await.clone();

        let mut balances = Vec::with_capacity(account.balances.len());
        let mut holds_token = false;
        for balance in &account.balances {
            let amount = balance_amount(balance, tokens.get(&balance.symbol))?;

            if balance.symbol == self.settings.token_symbol {
                holds_token = true;
                self.session.write().await.token_current_supply = amount;
                self.cars
                    .reconcile(self.ledger.as_ref(), &self.settings.token_symbol, &balance.ids)
                    .await;
            }

            balances.push(BalanceLine {
                chain: balance.chain.clone(),
                symbol: balance.symbol.clone(),
                amount,
            });
        }

        // no balance line at all means no cars are owned anymore
        if !holds_token {
            self.session.write().await.token_current_supply = Decimal::ZERO;
            self.cars.clear().await;
        }

        Ok(summary_of(account, balances))
    }

    /* ------------------------------ operations ------------------------ */

    /// Submit a token creation and wait for the ledger to announce the
    /// configured symbol.
    pub async fn create_token(&self, signed_tx: &[u8]) -> Result<Completion<String>, TrackerError> {
        self.notify(Notice::progress("Creating a new token on the blockchain..."));
        info!(
            "🪙 [MARKET] Creating {} ({})",
            self.settings.token_name, self.settings.token_symbol
        );

        let tx = match self
            .submit_and_track(OperationKind::CreateToken, signed_tx, "Checking token creation...")
            .await?
        {
            Completion::Done(tx) => tx,
            Completion::Superseded => return Ok(Completion::Superseded),
        };

        match events::decode_token_create(&tx, &self.settings.token_symbol) {
            Ok(symbol) => {
                {
                    let mut session = self.session.write().await;
                    session.is_token_created = true;
                    session.is_token_owner = true;
                }
                if let Err(e) = self.refresh_registry().await {
                    warn!("⚠️ [MARKET] Token registry refresh failed: {}", e);
                }
                self.notify(Notice::success("New token created with success."));
                Ok(Completion::Done(symbol))
            }
            Err(e) => {
                self.notify(Notice::fail(CREATE_FAILED_MESSAGE));
                Err(e)
            }
        }
    }

    /// Submit a mint of `data`/`mutable` and, once the ledger reports the new
    /// token id, cache the car under it.
    pub async fn mint_token(
        &self,
        data: CarData,
        mutable: CarMutableData,
        signed_tx: &[u8],
    ) -> Result<Completion<TokenId>, TrackerError> {
        let owner = match self.require_session().await {
            Ok(owner) => owner,
            Err(e) => {
                self.notify(Notice::fail(e.to_string()));
                return Err(e);
            }
        };
        self.notify(Notice::progress("Minting a new token..."));

        let tx = match self
            .submit_and_track(OperationKind::MintToken, signed_tx, "Checking token mint...")
            .await?
        {
            Completion::Done(tx) => tx,
            Completion::Superseded => return Ok(Completion::Superseded),
        };

        match events::decode_token_mint(&tx, &self.settings.token_symbol) {
            Ok(token_id) => {
                let car = Car {
                    owner_address: owner,
                    token_id: token_id.clone(),
                    data,
                    mutable,
                };
                if self.cars.insert(car).await.is_some() {
                    warn!("⚠️ [MARKET] Token {} was already cached, replaced", token_id);
                }
                if let Err(e) = self.refresh_registry().await {
                    warn!("⚠️ [MARKET] Token registry refresh failed: {}", e);
                }
                self.notify(Notice::success("Token mint with success."));
                Ok(Completion::Done(token_id))
            }
            Err(e) => {
                self.notify(Notice::fail(MINT_FAILED_MESSAGE));
                Err(e)
            }
        }
    }

    pub async fn sell_asset(&self, signed_tx: &[u8]) -> Result<Completion<Transaction>, TrackerError> {
        self.market_operation(OperationKind::SellAsset, signed_tx).await
    }

    pub async fn buy_asset(&self, signed_tx: &[u8]) -> Result<Completion<Transaction>, TrackerError> {
        self.market_operation(OperationKind::BuyAsset, signed_tx).await
    }

    pub async fn remove_asset(&self, signed_tx: &[u8]) -> Result<Completion<Transaction>, TrackerError> {
        self.market_operation(OperationKind::RemoveAsset, signed_tx).await
    }

    /// Cancel whatever operation was tracked last.
    pub async fn cancel_transaction(&self) -> Result<Operation, TrackerError> {
        match self.tracker.cancel().await {
            Ok(operation) => {
                self.notify(Notice::CancelResult {
                    status: Status::Success,
                    message: format!(
                        "The operation '{}' was canceled with success.",
                        operation.description()
                    ),
                });
                Ok(operation)
            }
            Err(TrackerError::AlreadyFinalized { operation }) => {
                self.notify(Notice::CancelResult {
                    status: Status::Fail,
                    message: format!(
                        "The transaction regarding the operation '{}' is already being processed by the blockchain and cannot be canceled anymore.",
                        operation.description()
                    ),
                });
                Err(TrackerError::AlreadyFinalized { operation })
            }
            Err(e) => {
                self.notify(Notice::CancelResult {
                    status: Status::Fail,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn market_operation(
        &self,
        kind: OperationKind,
        signed_tx: &[u8],
    ) -> Result<Completion<Transaction>, TrackerError> {
        let address = match self.require_session().await {
            Ok(address) => address,
            Err(e) => {
                self.notify(Notice::fail(e.to_string()));
                return Err(e);
            }
        };
        self.notify(Notice::progress(format!("Submitting operation '{}'...", kind.description())));

        let tx = match self
            .submit_and_track(kind, signed_tx, "Waiting for the blockchain to confirm...")
            .await?
        {
            Completion::Done(tx) => tx,
            Completion::Superseded => return Ok(Completion::Superseded),
        };

        // ownership moved on chain; rebuild the cache from the ledger's view
        if let Err(e) = self.sync_account(&address).await {
            warn!("⚠️ [MARKET] Account refresh after {} failed: {}", kind, e);
        }
        self.notify(Notice::success(format!(
            "The operation '{}' was confirmed.",
            kind.description()
        )));
        Ok(Completion::Done(tx))
    }

    /// Submit, then poll until the ledger settles the transaction. Remote
    /// failures and supersession are reported here; decoding the confirmed
    /// transaction is left to the caller. A cancelled poll is reported by
    /// `cancel_transaction` instead.
    async fn submit_and_track(
        &self,
        kind: OperationKind,
        signed_tx: &[u8],
        checking_message: &str,
    ) -> Result<Completion<Transaction>, TrackerError> {
        let hash = match self
            .ledger
            .submit_transaction(signed_tx, &self.settings.chain)
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                self.notify(Notice::fail(e.to_string()));
                return Err(e.into());
            }
        };

        self.notify(Notice::progress(checking_message));
        let poll = self.tracker.track(Operation::new(kind, hash));

        match poll.outcome().await {
            Some(PollOutcome::Confirmed(tx)) => Ok(Completion::Done(tx)),
            Some(PollOutcome::Failed(e)) => {
                self.notify(Notice::fail(e.to_string()));
                Err(e.into())
            }
            Some(PollOutcome::Superseded) => {
                self.notify(Notice::fail(format!(
                    "The operation '{}' was replaced by a newer operation.",
                    kind.description()
                )));
                Ok(Completion::Superseded)
            }
            None => Ok(Completion::Superseded),
        }
    }

    /// Registry reload without the user-facing notices of `load_tokens`.
    async fn refresh_registry(&self) -> Result<(), TrackerError> {
        let listed = self.ledger.list_tokens().await?;
        let created = listed.iter().any(|t| t.symbol == self.settings.token_symbol);
        {
            let mut tokens = self.tokens.write().await;
            tokens.clear();
            tokens.extend(listed.into_iter().map(|t| (t.symbol.clone(), t)));
        }
        self.session.write().await.is_token_created = created;
        Ok(())
    }
}

/// Display amount of a balance: fungible tokens are scaled down by their
/// decimals, everything else is a plain count.
fn balance_amount(balance: &Balance, token: Option<&TokenInfo>) -> Result<Decimal, TrackerError> {
    let mut amount = Decimal::from_str(balance.amount.trim())
        .map_err(|e| TrackerError::Decode(format!("amount {:?} of {}: {e}", balance.amount, balance.symbol)))?;

    if let Some(token) = token.filter(|t| t.is_fungible()) {
        amount
            .set_scale(token.decimals)
            .map_err(|e| TrackerError::Decode(format!("decimals of {}: {e}", token.symbol)))?;
    }
    Ok(amount)
}

fn summary_of(account: Account, balances: Vec<BalanceLine>) -> AccountSummary {
    AccountSummary {
        address: account.address,
        name: account.name,
        balances,
    }
}
