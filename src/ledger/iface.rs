use async_trait::async_trait;

use crate::error::LedgerError;
use crate::ledger::types::{Account, TokenData, TokenInfo, Transaction};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Remote ledger as seen by the tracker and the market facade.
///
/// `get_transaction` reports an unconfirmed transaction as
/// [`LedgerError::pending`], never as a success.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// Push an already signed transaction. Returns its hash.
    async fn submit_transaction(&self, signed_tx: &[u8], chain: &str) -> LedgerResult<String>;

    async fn get_transaction(&self, hash: &str) -> LedgerResult<Transaction>;

    async fn cancel_transaction(&self, hash: &str) -> LedgerResult<()>;

    async fn get_account(&self, address: &str) -> LedgerResult<Account>;

    async fn get_token_data(&self, symbol: &str, id: &str) -> LedgerResult<TokenData>;

    async fn list_tokens(&self) -> LedgerResult<Vec<TokenInfo>>;
}
