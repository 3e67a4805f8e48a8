//! Transactions, messages and the taxable operations they map to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Address, Coin};

/// Media type prefix that selects the image resource tariff.
pub const IMAGE_MEDIA_PREFIX: &str = "image/";

/// Media type that selects the JSON resource tariff.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// An operation with its own fee schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxableOperation {
    CreateDid,
    UpdateDid,
    DeactivateDid,
    CreateResourceImage,
    CreateResourceJson,
    CreateResourceDefault,
}

impl TaxableOperation {
    /// All operations, in schedule order.
    pub const ALL: [TaxableOperation; 6] = [
        TaxableOperation::CreateDid,
        TaxableOperation::UpdateDid,
        TaxableOperation::DeactivateDid,
        TaxableOperation::CreateResourceImage,
        TaxableOperation::CreateResourceJson,
        TaxableOperation::CreateResourceDefault,
    ];
}

impl fmt::Display for TaxableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaxableOperation::CreateDid => "create_did",
            TaxableOperation::UpdateDid => "update_did",
            TaxableOperation::DeactivateDid => "deactivate_did",
            TaxableOperation::CreateResourceImage => "create_resource_image",
            TaxableOperation::CreateResourceJson => "create_resource_json",
            TaxableOperation::CreateResourceDefault => "create_resource_default",
        };
        f.write_str(name)
    }
}

/// A message carried by a transaction.
///
/// Only the fields that drive fee classification are modeled; record
/// payloads are opaque to the fee engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    CreateDid { id: String },
    UpdateDid { id: String },
    DeactivateDid { id: String },
    CreateResource { collection_id: String, media_type: String },
    /// Any message outside the fee schedule (bank sends, votes, ...).
    Other { type_url: String },
}

impl Msg {
    /// The fee schedule this message is charged under, if any.
    pub fn taxable_operation(&self) -> Option<TaxableOperation> {
        match self {
            Msg::CreateDid { .. } => Some(TaxableOperation::CreateDid),
            Msg::UpdateDid { .. } => Some(TaxableOperation::UpdateDid),
            Msg::DeactivateDid { .. } => Some(TaxableOperation::DeactivateDid),
            Msg::CreateResource { media_type, .. } => Some(resource_operation(media_type)),
            Msg::Other { .. } => None,
        }
    }
}

fn resource_operation(media_type: &str) -> TaxableOperation {
    let media_type = media_type.trim().to_ascii_lowercase();
    if media_type.starts_with(IMAGE_MEDIA_PREFIX) {
        TaxableOperation::CreateResourceImage
    } else if media_type == JSON_MEDIA_TYPE {
        TaxableOperation::CreateResourceJson
    } else {
        TaxableOperation::CreateResourceDefault
    }
}

/// A signed transaction as seen by the fee engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub msgs: Vec<Msg>,
    /// Offered fee. Taxable transactions must carry exactly one coin.
    pub fee: Vec<Coin>,
    pub gas_limit: u64,
    /// First signer; pays the fee unless a granter is set.
    pub signer: Address,
    #[serde(default)]
    pub fee_granter: Option<Address>,
}

impl Tx {
    /// Taxable operations in message order. Empty for untaxed transactions.
    pub fn taxable_operations(&self) -> Vec<TaxableOperation> {
        self.msgs.iter().filter_map(Msg::taxable_operation).collect()
    }

    /// Whether any message is charged under a fee schedule.
    pub fn is_taxable(&self) -> bool {
        self.msgs.iter().any(|m| m.taxable_operation().is_some())
    }
}
