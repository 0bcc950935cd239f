//! Wire shapes of the ledger RPC results.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A confirmed transaction as returned by `getTransaction`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub hash: String,
    pub chain_address: String,
    pub timestamp: u64,
    pub block_height: u64,
    pub block_hash: String,
    pub events: Vec<Event>,
    pub result: String,
}

impl Transaction {
    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp as i64, 0).single()
    }
}

/// Tagged record emitted by a transaction. `data` is Base16 encoded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub address: String,
    pub contract: String,
    pub kind: String,
    pub data: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub address: String,
    pub name: String,
    pub balances: Vec<Balance>,
}

/// One balance line. `amount` is the raw integer amount; for non-fungible
/// tokens `ids` lists the owned token IDs in decimal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Balance {
    pub chain: String,
    pub amount: String,
    pub symbol: String,
    pub decimals: u32,
    pub ids: Vec<String>,
}

/// Token descriptor from `getTokens`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub current_supply: String,
    pub max_supply: String,
    pub owner_address: String,
    /// Comma separated flag names, e.g. `"Transferable, Fungible"`.
    pub flags: String,
}

impl TokenInfo {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.split(',').any(|f| f.trim() == flag)
    }

    pub fn is_fungible(&self) -> bool {
        self.has_flag("Fungible")
    }
}

/// Asset detail from `getTokenData`. `rom` and `ram` are Base16 blobs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenData {
    #[serde(rename = "ID")]
    pub id: String,
    pub chain_name: String,
    pub owner_address: String,
    pub rom: String,
    pub ram: String,
    pub for_sale: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_parses_camel_case_with_missing_fields() {
        let raw = r#"{
            "hash": "AB12",
            "blockHeight": 77,
            "events": [{"kind": "TokenMint", "address": "P2K", "data": "00"}]
        }"#;
        let tx: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.block_height, 77);
        assert_eq!(tx.events.len(), 1);
        assert_eq!(tx.events[0].kind, "TokenMint");
        assert!(tx.result.is_empty());
    }

    #[test]
    fn token_flags_are_matched_exactly() {
        let token = TokenInfo {
            flags: "Transferable, Fungible, Finite".into(),
            ..Default::default()
        };
        assert!(token.is_fungible());
        assert!(!token.has_flag("Fung"));

        let car = TokenInfo {
            flags: "Transferable, Finite".into(),
            ..Default::default()
        };
        assert!(!car.is_fungible());
    }

    #[test]
    fn token_data_reads_upper_case_id() {
        let raw = r#"{"ID": "42", "ownerAddress": "P2K", "rom": "00", "ram": "01"}"#;
        let data: TokenData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.id, "42");
        assert_eq!(data.owner_address, "P2K");
    }
}
