//! Runtime configuration loader and common helpers.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

/// Lower bound on the pause between two status queries.
pub const MIN_CONFIRMATION_DELAY_SECS: u64 = 1;

/// ------------------------------------------------------------------
/// Main Settings object
/// ------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /* -------- infrastructure ------------------------ */
    pub rpc_url: String,
    pub chain: String,
    pub request_timeout_secs: u64,

    /* -------- token --------------------------------- */
    pub token_symbol: String,
    pub token_name: String,
    pub soul_symbol: String,

    /* -------- tracking ------------------------------ */
    pub confirmation_delay_secs: u64,

    /* -------- assets -------------------------------- */
    pub car_image_count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:7077/rpc".to_string(),
            chain: "main".to_string(),
            request_timeout_secs: 5,
            token_symbol: "CAR".to_string(),
            token_name: "Car Demo Token".to_string(),
            soul_symbol: "SOUL".to_string(),
            confirmation_delay_secs: 10,
            car_image_count: 4,
        }
    }
}

impl Settings {
    /// --------------------------------------------------------------
    /// Read `settings.json` from disk. Missing keys take their defaults.
    /// --------------------------------------------------------------
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading settings file {:?}", path.as_ref()))?;
        let json: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings file {:?}", path.as_ref()))?;

        let defaults = Self::default();

        /* -------- plain strings ---------------------------------- */
        let rpc_url = json["rpc_url"]
            .as_str()
            .map(str::to_string)
            .unwrap_or(defaults.rpc_url);
        let chain = json["chain"]
            .as_str()
            .map(str::to_string)
            .unwrap_or(defaults.chain);
        let token_symbol = json["token_symbol"]
            .as_str()
            .map(str::to_string)
            .unwrap_or(defaults.token_symbol);
        let token_name = json["token_name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or(defaults.token_name);
        let soul_symbol = json["soul_symbol"]
            .as_str()
            .map(str::to_string)
            .unwrap_or(defaults.soul_symbol);

        /* -------- numeric parameters ----------------------------- */
        let request_timeout_secs = json["request_timeout_secs"]
            .as_u64()
            .unwrap_or(defaults.request_timeout_secs);
        let confirmation_delay_secs = json["confirmation_delay_secs"]
            .as_u64()
            .unwrap_or(defaults.confirmation_delay_secs);
        let car_image_count = json["car_image_count"]
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(defaults.car_image_count);

        Url::parse(&rpc_url).with_context(|| format!("invalid rpc_url {rpc_url:?}"))?;

        Ok(Self {
            rpc_url,
            chain,
            request_timeout_secs,
            token_symbol,
            token_name,
            soul_symbol,
            confirmation_delay_secs,
            car_image_count,
        })
    }

    /// --------------------------------------------------------------
    /// Load settings from default config/settings.json file.
    /// --------------------------------------------------------------
    pub fn load() -> Result<Self> {
        Self::load_from_file(DEFAULT_SETTINGS_PATH)
    }

    /// --------------------------------------------------------------
    /// Save settings to a specific file path.
    /// --------------------------------------------------------------
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(&path, json_string)
            .with_context(|| format!("writing settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Pause between status queries, never below one second.
    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_secs(self.confirmation_delay_secs.max(MIN_CONFIRMATION_DELAY_SECS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
