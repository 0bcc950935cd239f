#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use car_market::assets::{encode_hex, CarData, CarLocation, CarMutableData, CarRarity, TokenEventData, TokenId};
use car_market::config::settings::Settings;
use car_market::ledger::types::{Account, Balance, Event, TokenData, TokenInfo, Transaction};
use car_market::ledger::{Ledger, LedgerResult};
use car_market::market::notify::{ChannelNotifier, Notice};
use car_market::market::Marketplace;
use car_market::LedgerError;

/// Scripted ledger. Unscripted transaction queries answer "pending".
#[derive(Default)]
pub struct MockLedger {
    statuses: Mutex<HashMap<String, VecDeque<LedgerResult<Transaction>>>>,
    status_log: Mutex<Vec<String>>,
    status_gate: Mutex<Option<Arc<Notify>>>,
    submissions: Mutex<VecDeque<LedgerResult<String>>>,
    cancel_result: Mutex<Option<LedgerResult<()>>>,
    cancel_log: Mutex<Vec<String>>,
    accounts: Mutex<HashMap<String, Account>>,
    token_data: Mutex<HashMap<String, LedgerResult<TokenData>>>,
    token_data_log: Mutex<Vec<String>>,
    tokens: Mutex<Vec<TokenInfo>>,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_status(&self, hash: &str, responses: Vec<LedgerResult<Transaction>>) {
        self.statuses
            .lock()
            .unwrap()
            .entry(hash.to_string())
            .or_default()
            .extend(responses);
    }

    /// Every transaction query waits on the returned handle before answering.
    pub fn gate_statuses(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.status_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn queue_submission(&self, result: LedgerResult<String>) {
        self.submissions.lock().unwrap().push_back(result);
    }

    pub fn set_cancel_result(&self, result: LedgerResult<()>) {
        *self.cancel_result.lock().unwrap() = Some(result);
    }

    pub fn add_account(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.address.clone(), account);
    }

    pub fn add_token_data(&self, id: &str, result: LedgerResult<TokenData>) {
        self.token_data.lock().unwrap().insert(id.to_string(), result);
    }

    pub fn set_tokens(&self, tokens: Vec<TokenInfo>) {
        *self.tokens.lock().unwrap() = tokens;
    }

    pub fn status_log(&self) -> Vec<String> {
        self.status_log.lock().unwrap().clone()
    }

    pub fn queries_for(&self, hash: &str) -> usize {
        self.status_log.lock().unwrap().iter().filter(|h| *h == hash).count()
    }

    pub fn cancel_log(&self) -> Vec<String> {
        self.cancel_log.lock().unwrap().clone()
    }

    pub fn token_data_log(&self) -> Vec<String> {
        self.token_data_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn submit_transaction(&self, _signed_tx: &[u8], _chain: &str) -> LedgerResult<String> {
        self.submissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("HASH".to_string()))
    }

    async fn get_transaction(&self, hash: &str) -> LedgerResult<Transaction> {
        self.status_log.lock().unwrap().push(hash.to_string());
        let gate = self.status_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.statuses
            .lock()
            .unwrap()
            .get_mut(hash)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(LedgerError::pending()))
    }

    async fn cancel_transaction(&self, hash: &str) -> LedgerResult<()> {
        self.cancel_log.lock().unwrap().push(hash.to_string());
        self.cancel_result.lock().unwrap().clone().unwrap_or(Ok(()))
    }

    async fn get_account(&self, address: &str) -> LedgerResult<Account> {
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| LedgerError::api("account not found"))
    }

    async fn get_token_data(&self, _symbol: &str, id: &str) -> LedgerResult<TokenData> {
        self.token_data_log.lock().unwrap().push(id.to_string());
        // let the per-id fetches interleave
        tokio::task::yield_now().await;
        self.token_data
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(LedgerError::api("token not found")))
    }

    async fn list_tokens(&self) -> LedgerResult<Vec<TokenInfo>> {
        Ok(self.tokens.lock().unwrap().clone())
    }
}

pub const ALICE: &str = "P2KAlice";
pub const DELAY: Duration = Duration::from_secs(10);

pub fn confirmed(hash: &str, events: Vec<Event>) -> LedgerResult<Transaction> {
    Ok(Transaction {
        hash: hash.to_string(),
        block_height: 100,
        events,
        ..Default::default()
    })
}

pub fn mint_event(symbol: &str, id: u64) -> Event {
    let payload = TokenEventData {
        symbol: symbol.to_string(),
        value: TokenId::from(id).to_le_bytes(),
        chain_address: "main".to_string(),
    };
    Event {
        kind: "TokenMint".to_string(),
        address: ALICE.to_string(),
        data: encode_hex(&payload).unwrap(),
        ..Default::default()
    }
}

pub fn create_event(symbol: &str) -> Event {
    Event {
        kind: "TokenCreate".to_string(),
        address: ALICE.to_string(),
        data: encode_hex(&symbol.to_string()).unwrap(),
        ..Default::default()
    }
}

pub fn car_payload(name: &str) -> (CarData, CarMutableData) {
    (
        CarData {
            rarity: CarRarity::Common,
            image_id: 2,
        },
        CarMutableData {
            name: name.to_string(),
            power: 5,
            speed: 6,
            location: CarLocation::None,
        },
    )
}

pub fn token_data(id: &str, name: &str) -> LedgerResult<TokenData> {
    let (data, mutable) = car_payload(name);
    Ok(TokenData {
        id: id.to_string(),
        chain_name: "main".to_string(),
        owner_address: ALICE.to_string(),
        rom: encode_hex(&data).unwrap(),
        ram: encode_hex(&mutable).unwrap(),
        for_sale: false,
    })
}

pub fn car_account(ids: &[&str]) -> Account {
    Account {
        address: ALICE.to_string(),
        name: "alice".to_string(),
        balances: vec![
            Balance {
                chain: "main".to_string(),
                amount: "150000000".to_string(),
                symbol: "SOUL".to_string(),
                decimals: 8,
                ids: vec![],
            },
            Balance {
                chain: "main".to_string(),
                amount: ids.len().to_string(),
                symbol: "CAR".to_string(),
                decimals: 0,
                ids: ids.iter().map(|s| s.to_string()).collect(),
            },
        ],
    }
}

pub fn registry() -> Vec<TokenInfo> {
    vec![
        TokenInfo {
            symbol: "SOUL".to_string(),
            name: "Phantasma Stake".to_string(),
            decimals: 8,
            flags: "Transferable, Fungible, Finite".to_string(),
            ..Default::default()
        },
        TokenInfo {
            symbol: "CAR".to_string(),
            name: "Car Demo Token".to_string(),
            owner_address: ALICE.to_string(),
            flags: "Transferable, Finite".to_string(),
            ..Default::default()
        },
    ]
}

pub fn market(ledger: &Arc<MockLedger>) -> (Arc<Marketplace>, mpsc::UnboundedReceiver<Notice>) {
    let (notifier, rx) = ChannelNotifier::new();
    let ledger: Arc<dyn Ledger> = Arc::clone(ledger) as Arc<dyn Ledger>;
    let market = Marketplace::new(Settings::default(), ledger, Arc::new(notifier));
    (Arc::new(market), rx)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        out.push(notice);
    }
    out
}

pub fn terminal(notices: &[Notice]) -> Vec<Notice> {
    notices.iter().filter(|n| n.is_terminal()).cloned().collect()
}

/// Give spawned tasks a chance to run up to their next suspension point.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
