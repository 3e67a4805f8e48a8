//! Account addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{Result, TypesError};

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

const MODULE_ACCOUNT_CONTEXT: &str = "tessera v1 module-account";
const USER_ACCOUNT_CONTEXT: &str = "tessera v1 user-account";

/// A 20-byte account address, displayed as lowercase hex.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(#[serde_as(as = "serde_with::hex::Hex")] [u8; ADDRESS_LEN]);

impl Address {
    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Deterministic address of a module account.
    ///
    /// ```
    /// use tessera_types::Address;
    ///
    /// assert_eq!(Address::module("oracle"), Address::module("oracle"));
    /// assert_ne!(Address::module("oracle"), Address::module("fee_collector"));
    /// ```
    pub fn module(name: &str) -> Self {
        Self::derive(MODULE_ACCOUNT_CONTEXT, name.as_bytes())
    }

    /// Deterministic user address from a seed label. Used for genesis
    /// accounts and tests.
    pub fn from_seed(seed: &str) -> Self {
        Self::derive(USER_ACCOUNT_CONTEXT, seed.as_bytes())
    }

    fn derive(context: &str, material: &[u8]) -> Self {
        let key = blake3::derive_key(context, material);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&key[..ADDRESS_LEN]);
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let addr = Address::from_seed("alice");
        let text = addr.to_string();
        assert_eq!(text.len(), ADDRESS_LEN * 2);
        assert_eq!(text.parse::<Address>().expect("parse"), addr);
    }

    #[test]
    fn test_module_and_user_namespaces_differ() {
        assert_ne!(Address::module("oracle"), Address::from_seed("oracle"));
    }

    #[test]
    fn test_rejects_bad_hex() {
        assert!("zz".parse::<Address>().is_err());
        assert!("abcd".parse::<Address>().is_err());
    }

    #[test]
    fn test_serde_hex() {
        let addr = Address::from_bytes([0xab; ADDRESS_LEN]);
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, format!("\"{}\"", "ab".repeat(ADDRESS_LEN)));
        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }
}
