//! JSON-RPC ledger client over HTTP.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{ErrorKind, LedgerError};
use crate::ledger::iface::{Ledger, LedgerResult};
use crate::ledger::types::{Account, TokenData, TokenInfo, Transaction};

#[derive(Clone)]
pub struct RpcLedger {
    url: String,
    client: Client,
}

impl RpcLedger {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        info!("🔌 [LEDGER] RPC client initialized: {}", url);
        Ok(Self {
            url,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Value) -> LedgerResult<Value> {
        let start_time = Instant::now();

        let body = json!({
            "jsonrpc": "2.0",
            "id": "car-market",
            "method": method,
            "params": params,
        });

        let res = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::new(ErrorKind::WebRequestError, e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            warn!("⚠️ [LEDGER] {} HTTP {}: {}", method, status, err_text);
            return Err(LedgerError::new(
                ErrorKind::WebRequestError,
                format!("HTTP {status}: {err_text}"),
            ));
        }

        let text = res
            .text()
            .await
            .map_err(|e| LedgerError::new(ErrorKind::WebRequestError, e.to_string()))?;

        debug!(
            "[LEDGER] {} answered in {}ms",
            method,
            start_time.elapsed().as_millis()
        );

        parse_envelope(&text)
    }

    async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| LedgerError::new(ErrorKind::MalformedResponse, format!("{method}: {e}")))
    }
}

/// Split a JSON-RPC body into its `result`, or the API error it carries.
///
/// The node reports failures either as a top-level `error` or as an `error`
/// field inside `result`; both may be a bare string or an object with a
/// `message`.
pub(crate) fn parse_envelope(text: &str) -> LedgerResult<Value> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| LedgerError::new(ErrorKind::FailedParsingJson, e.to_string()))?;

    if let Some(err) = root.get("error").filter(|e| !e.is_null()) {
        return Err(LedgerError::api(error_message(err)));
    }

    let result = root
        .get("result")
        .cloned()
        .ok_or_else(|| LedgerError::new(ErrorKind::MalformedResponse, format!("missing 'result' in {root}")))?;

    if let Some(err) = result.get("error").filter(|e| !e.is_null()) {
        return Err(LedgerError::api(error_message(err)));
    }

    Ok(result)
}

fn error_message(err: &Value) -> String {
    match err {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn submit_transaction(&self, signed_tx: &[u8], chain: &str) -> LedgerResult<String> {
        info!("📤 [LEDGER] Submitting {} bytes on chain '{}'", signed_tx.len(), chain);
        let result = self
            .call("sendRawTransaction", json!([hex::encode(signed_tx)]))
            .await?;

        let hash = result
            .as_str()
            .ok_or_else(|| LedgerError::new(ErrorKind::MalformedResponse, format!("expected hash, got {result}")))?;

        info!("✅ [LEDGER] Accepted transaction {}", hash);
        Ok(hash.to_string())
    }

    async fn get_transaction(&self, hash: &str) -> LedgerResult<Transaction> {
        self.call_as("getTransaction", json!([hash])).await
    }

    async fn cancel_transaction(&self, hash: &str) -> LedgerResult<()> {
        self.call("cancelTransaction", json!([hash])).await.map(|_| ())
    }

    async fn get_account(&self, address: &str) -> LedgerResult<Account> {
        self.call_as("getAccount", json!([address])).await
    }

    async fn get_token_data(&self, symbol: &str, id: &str) -> LedgerResult<TokenData> {
        self.call_as("getTokenData", json!([symbol, id])).await
    }

    async fn list_tokens(&self) -> LedgerResult<Vec<TokenInfo>> {
        self.call_as("getTokens", json!([])).await
    }
}
