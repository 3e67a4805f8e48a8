//! Events emitted while pricing and settling transactions.
//!
//! Events are collected on the transaction outcome and surfaced to
//! indexers as JSON.

use serde::{Deserialize, Serialize};

/// Envelope for all events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub height: u64,
    pub payload: serde_json::Value,
}

impl Event {
    /// Build an event from any serializable payload.
    ///
    /// Payload types in this workspace are plain structs of strings and
    /// integers; a serialization failure degrades to a `null` payload.
    pub fn new(event_type: EventType, height: u64, payload: impl Serialize) -> Self {
        Self {
            event_type,
            height,
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// All event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Fee events
    FeePay,
    TaxBurn,
    RewardDistribute,
    FeederReward,

    // Oracle events
    PriceStamp,
    MedianStamp,
    BallotDropped,
}

impl EventType {
    /// The wire name, e.g. `"tax_burn"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::FeePay => "fee_pay",
            EventType::TaxBurn => "tax_burn",
            EventType::RewardDistribute => "reward_distribute",
            EventType::FeederReward => "feeder_reward",
            EventType::PriceStamp => "price_stamp",
            EventType::MedianStamp => "median_stamp",
            EventType::BallotDropped => "ballot_dropped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_wire_name_matches_serde() {
        for ty in [
            EventType::FeePay,
            EventType::TaxBurn,
            EventType::RewardDistribute,
            EventType::FeederReward,
            EventType::PriceStamp,
            EventType::MedianStamp,
            EventType::BallotDropped,
        ] {
            let json = serde_json::to_value(ty).expect("serialize");
            assert_eq!(json, ty.as_str());
        }
    }

    #[test]
    fn test_event_payload() {
        #[derive(Serialize)]
        struct Burn {
            amount: String,
        }
        let event = Event::new(
            EventType::TaxBurn,
            7,
            Burn {
                amount: "25000000000ncheq".into(),
            },
        );
        assert_eq!(event.height, 7);
        assert_eq!(event.payload["amount"], "25000000000ncheq");
    }
}
