//! Owned Assets Cache - Tracks which cars the logged-in account holds
//!
//! Entries are only written from confirmed data: a decoded mint event or a
//! successful account fetch. Nothing is inserted speculatively.

use std::collections::HashMap;
use std::str::FromStr;

use futures::stream::{FuturesUnordered, StreamExt};
use log::info;
use tokio::sync::RwLock;

use crate::assets::{Car, TokenId};
use crate::error::TrackerError;
use crate::ledger::Ledger;

#[derive(Default)]
pub struct AssetCache {
    cars: RwLock<HashMap<TokenId, Car>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a car under its token id, returning any car it replaced.
    pub async fn insert(&self, car: Car) -> Option<Car> {
        let mut cars = self.cars.write().await;
        cars.insert(car.token_id.clone(), car)
    }

    pub async fn get(&self, id: &TokenId) -> Option<Car> {
        self.cars.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &TokenId) -> bool {
        self.cars.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.cars.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cars.read().await.is_empty()
    }

    /// Cached cars ordered by token id.
    pub async fn snapshot(&self) -> Vec<Car> {
        let mut cars: Vec<Car> = self.cars.read().await.values().cloned().collect();
        cars.sort_by(|a, b| a.token_id.cmp(&b.token_id));
        cars
    }

    pub async fn clear(&self) {
        let mut cars = self.cars.write().await;
        if !cars.is_empty() {
            info!("🧹 [CACHE] Dropping {} cached cars", cars.len());
        }
        cars.clear();
    }

    /// Rebuild the cache from the token ids an account reports for `symbol`.
    ///
    /// The cache is emptied first, then every id is fetched concurrently and
    /// inserted as its answer arrives. Ids whose fetch or decode fails are
    /// skipped without retry. Returns how many cars were stored.
    pub async fn reconcile<S: AsRef<str>>(&self, ledger: &dyn Ledger, symbol: &str, ids: &[S]) -> usize {
        self.clear().await;

        let mut pending: FuturesUnordered<_> = ids
            .iter()
            .map(|id| fetch_car(ledger, symbol, id.as_ref()))
            .collect();

        let mut stored = 0;
        while let Some(fetched) = pending.next().await {
            if let Ok(car) = fetched {
                self.insert(car).await;
                stored += 1;
            }
        }

        info!("🚗 [CACHE] Reconciled {}/{} {} tokens", stored, ids.len(), symbol);
        stored
    }
}

async fn fetch_car(ledger: &dyn Ledger, symbol: &str, id: &str) -> Result<Car, TrackerError> {
    let token_id = TokenId::from_str(id)?;
    let data = ledger.get_token_data(symbol, id).await?;
    Car::from_blobs(&data.owner_address, token_id, &data.rom, &data.ram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{CarData, CarLocation, CarMutableData, CarRarity};

    fn car(id: u64) -> Car {
        Car {
            owner_address: "P2KOwner".into(),
            token_id: TokenId::from(id),
            data: CarData {
                rarity: CarRarity::Rare,
                image_id: 1,
            },
            mutable: CarMutableData {
                name: format!("car-{id}"),
                power: 2,
                speed: 3,
                location: CarLocation::None,
            },
        }
    }

    #[tokio::test]
    async fn insert_replaces_same_id() {
        let cache = AssetCache::new();
        assert!(cache.insert(car(1)).await.is_none());
        assert!(cache.insert(car(1)).await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn missing_id_is_none() {
        let cache = AssetCache::new();
        cache.insert(car(1)).await;
        assert!(cache.get(&TokenId::from(2)).await.is_none());
        assert!(cache.contains(&TokenId::from(1)).await);
    }

    #[tokio::test]
    async fn snapshot_is_sorted_and_clear_empties() {
        let cache = AssetCache::new();
        for id in [9, 3, 5] {
            cache.insert(car(id)).await;
        }
        let ids: Vec<String> = cache
            .snapshot()
            .await
            .iter()
            .map(|c| c.token_id.to_string())
            .collect();
        assert_eq!(ids, ["3", "5", "9"]);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
