//! Car asset payloads and the Base16 + borsh codec used for token blobs.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use rand::Rng;

use crate::error::TrackerError;

/// Non-fungible token identifier. Arbitrary precision, decimal on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(BigUint);

impl TokenId {
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_le(bytes))
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.0.to_bytes_le()
    }
}

impl From<u64> for TokenId {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v))
    }
}

impl FromStr for TokenId {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigUint::from_str(s.trim())
            .map(Self)
            .map_err(|e| TrackerError::Decode(format!("token id {s:?}: {e}")))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum CarRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum CarLocation {
    None,
    Market,
}

/// Immutable part of a car, stored in the token ROM.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CarData {
    pub rarity: CarRarity,
    pub image_id: u32,
}

/// Mutable part of a car, stored in the token RAM.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CarMutableData {
    pub name: String,
    pub power: u8,
    pub speed: u8,
    pub location: CarLocation,
}

/// Freshly generated payload for a mint: common rarity, random picture and
/// stats in `1..10`.
pub fn random_car(name: &str, image_count: u32) -> (CarData, CarMutableData) {
    let mut rng = rand::thread_rng();
    let data = CarData {
        rarity: CarRarity::Common,
        image_id: rng.gen_range(0..image_count.max(1)),
    };
    let mutable = CarMutableData {
        name: name.to_string(),
        power: rng.gen_range(1..10),
        speed: rng.gen_range(1..10),
        location: CarLocation::None,
    };
    (data, mutable)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Car {
    pub owner_address: String,
    pub token_id: TokenId,
    pub data: CarData,
    pub mutable: CarMutableData,
}

impl Car {
    /// Build a car from the Base16 ROM/RAM blobs of a token.
    pub fn from_blobs(owner_address: &str, token_id: TokenId, rom: &str, ram: &str) -> Result<Self, TrackerError> {
        Ok(Self {
            owner_address: owner_address.to_string(),
            token_id,
            data: decode_hex(rom)?,
            mutable: decode_hex(ram)?,
        })
    }
}

/// Payload of a `TokenMint` / `TokenBurn` / `TokenSend` event.
/// `value` is the token id (or amount) as little-endian bytes.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TokenEventData {
    pub symbol: String,
    pub value: Vec<u8>,
    pub chain_address: String,
}

pub fn decode<T: BorshDeserialize>(bytes: &[u8]) -> Result<T, TrackerError> {
    Ok(borsh::from_slice(bytes)?)
}

pub fn encode<T: BorshSerialize>(value: &T) -> Result<Vec<u8>, TrackerError> {
    Ok(borsh::to_vec(value)?)
}

pub fn decode_hex<T: BorshDeserialize>(data: &str) -> Result<T, TrackerError> {
    decode(&hex::decode(data)?)
}

pub fn encode_hex<T: BorshSerialize>(value: &T) -> Result<String, TrackerError> {
    Ok(hex::encode_upper(encode(value)?))
}
