pub mod asset_cache;
