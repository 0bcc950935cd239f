//! Operation kinds and their user-facing descriptions.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateToken,
    MintToken,
    SellAsset,
    BuyAsset,
    RemoveAsset,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::CreateToken,
        OperationKind::MintToken,
        OperationKind::SellAsset,
        OperationKind::BuyAsset,
        OperationKind::RemoveAsset,
    ];

    /// Text used in cancellation and result messages.
    pub fn description(self) -> &'static str {
        match self {
            OperationKind::CreateToken => "Create new token.",
            OperationKind::MintToken => "Mint new token.",
            OperationKind::SellAsset => "Sell asset on the market.",
            OperationKind::BuyAsset => "Buy asset from the market.",
            OperationKind::RemoveAsset => "Remove asset from the market.",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A submitted operation, identified by the hash the ledger acknowledged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub hash: String,
}

impl Operation {
    pub fn new(kind: OperationKind, hash: impl Into<String>) -> Self {
        Self {
            kind,
            hash: hash.into(),
        }
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}
