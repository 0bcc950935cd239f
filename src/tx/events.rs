//! Reading typed outcomes out of confirmed transaction events.

use log::debug;
use strum_macros::{Display, EnumString};

use crate::assets::{self, TokenEventData, TokenId};
use crate::error::TrackerError;
use crate::ledger::types::{Event, Transaction};

/// Event tags the ledger emits. Tags outside this list never match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum EventKind {
    ChainCreate,
    TokenCreate,
    TokenSend,
    TokenReceive,
    TokenMint,
    TokenBurn,
    TokenEscrow,
    TokenStake,
    TokenClaim,
    AddressRegister,
    GasEscrow,
    GasPayment,
    OrderCreated,
    OrderCancelled,
    OrderFilled,
    AuctionCreated,
    AuctionCancelled,
    AuctionFilled,
    Metadata,
}

impl Event {
    /// Parsed tag, or `None` for kinds this client does not know.
    pub fn event_kind(&self) -> Option<EventKind> {
        self.kind.parse().ok()
    }
}

/// First event of `kind`, in emission order.
pub fn find_event(events: &[Event], kind: EventKind) -> Option<&Event> {
    events.iter().find(|evt| evt.event_kind() == Some(kind))
}

/// Symbol announced by the first `TokenCreate` event, provided it is
/// `expected_symbol`.
pub fn decode_token_create(tx: &Transaction, expected_symbol: &str) -> Result<String, TrackerError> {
    let kind = EventKind::TokenCreate;
    let evt = find_event(&tx.events, kind).ok_or(TrackerError::OutcomeNotFound { kind })?;

    let symbol: String = assets::decode_hex(&evt.data)?;
    debug!("[EVENTS] {} - {}", evt.kind, symbol);

    if symbol != expected_symbol {
        return Err(TrackerError::OutcomeNotFound { kind });
    }
    Ok(symbol)
}

/// Token id minted by the first `TokenMint` event, provided it was minted
/// for `expected_symbol`.
pub fn decode_token_mint(tx: &Transaction, expected_symbol: &str) -> Result<TokenId, TrackerError> {
    let kind = EventKind::TokenMint;
    let evt = find_event(&tx.events, kind).ok_or(TrackerError::OutcomeNotFound { kind })?;

    let payload: TokenEventData = assets::decode_hex(&evt.data)?;
    let token_id = TokenId::from_le_bytes(&payload.value);
    debug!("[EVENTS] {} - {} #{}", evt.kind, payload.symbol, token_id);

    if payload.symbol != expected_symbol {
        return Err(TrackerError::OutcomeNotFound { kind });
    }
    Ok(token_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::encode_hex;

    fn event(kind: &str, data: String) -> Event {
        Event {
            kind: kind.to_string(),
            data,
            ..Default::default()
        }
    }

    fn mint_event(symbol: &str, id: u64) -> Event {
        let payload = TokenEventData {
            symbol: symbol.into(),
            value: TokenId::from(id).to_le_bytes(),
            chain_address: "main".into(),
        };
        event("TokenMint", encode_hex(&payload).unwrap())
    }

    fn tx(events: Vec<Event>) -> Transaction {
        Transaction {
            hash: "AA".into(),
            events,
            ..Default::default()
        }
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let events = vec![event("Other", String::new()), mint_event("CAR", 1)];
        assert!(events[0].event_kind().is_none());
        let found = find_event(&events, EventKind::TokenMint).unwrap();
        assert_eq!(found.kind, "TokenMint");
    }

    #[test]
    fn first_mint_wins() {
        let t = tx(vec![
            event("Other", "FF".into()),
            mint_event("CAR", 42),
            mint_event("CAR", 43),
        ]);
        assert_eq!(decode_token_mint(&t, "CAR").unwrap(), TokenId::from(42));
    }

    #[test]
    fn mint_for_another_symbol_is_not_ours() {
        let t = tx(vec![mint_event("XYZ", 42)]);
        assert!(matches!(
            decode_token_mint(&t, "CAR"),
            Err(TrackerError::OutcomeNotFound { kind: EventKind::TokenMint })
        ));
    }

    #[test]
    fn create_symbol_mismatch_is_outcome_not_found() {
        let t = tx(vec![event("TokenCreate", encode_hex(&"XYZ".to_string()).unwrap())]);
        assert!(matches!(
            decode_token_create(&t, "CAR"),
            Err(TrackerError::OutcomeNotFound { kind: EventKind::TokenCreate })
        ));
    }

    #[test]
    fn create_with_expected_symbol() {
        let t = tx(vec![
            event("GasEscrow", "00".into()),
            event("TokenCreate", encode_hex(&"CAR".to_string()).unwrap()),
        ]);
        assert_eq!(decode_token_create(&t, "CAR").unwrap(), "CAR");
    }

    #[test]
    fn no_events_means_outcome_not_found() {
        assert!(matches!(
            decode_token_create(&tx(vec![]), "CAR"),
            Err(TrackerError::OutcomeNotFound { .. })
        ));
    }

    #[test]
    fn corrupt_payload_is_a_decode_error() {
        let t = tx(vec![event("TokenMint", "ZZ".into())]);
        assert!(matches!(decode_token_mint(&t, "CAR"), Err(TrackerError::Decode(_))));
    }
}
