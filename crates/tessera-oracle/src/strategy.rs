//! Moving-average strategy selection.
//!
//! Strategies arrive as text tags (`"sma"`, `"ema"`, `"wma"` plus a WMA
//! kind such as `"BALANCED"`) and are parsed once into [`MaStrategy`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OracleError, Result};

/// How a stamp window is combined into one price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaStrategy {
    /// Simple moving average.
    Sma,
    /// Exponential moving average with a fixed smoothing period.
    Ema,
    /// Weighted moving average.
    Wma(WmaKind),
}

/// Weight profile of a weighted moving average.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WmaKind {
    /// Linear weights, newest stamp heaviest.
    Recent,
    /// Linear weights, oldest stamp heaviest.
    Oldest,
    /// Triangular weights peaking at the middle of the window.
    Balanced,
    /// Caller-supplied weights, oldest first.
    Custom(Vec<u64>),
}

impl MaStrategy {
    /// Parse a strategy from its text tags.
    ///
    /// `ma_type` is one of `sma`, `ema`, `wma`. For `wma`, `wma_kind` is one
    /// of `RECENT`, `OLDEST`, `BALANCED` (the default) or `CUSTOM`, the last
    /// taking `weights`. Tags are case-insensitive.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidMaType`] for an unknown tag, or `CUSTOM`
    ///   without weights
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_oracle::{MaStrategy, WmaKind};
    ///
    /// let s = MaStrategy::parse("wma", Some("recent"), None).unwrap();
    /// assert_eq!(s, MaStrategy::Wma(WmaKind::Recent));
    /// ```
    pub fn parse(ma_type: &str, wma_kind: Option<&str>, weights: Option<Vec<u64>>) -> Result<Self> {
        match ma_type.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(MaStrategy::Sma),
            "ema" => Ok(MaStrategy::Ema),
            "wma" => {
                let kind = match wma_kind.map(|k| k.trim().to_ascii_uppercase()).as_deref() {
                    None | Some("BALANCED") => WmaKind::Balanced,
                    Some("RECENT") => WmaKind::Recent,
                    Some("OLDEST") => WmaKind::Oldest,
                    Some("CUSTOM") => WmaKind::Custom(weights.ok_or_else(|| {
                        OracleError::InvalidMaType("wma CUSTOM requires weights".into())
                    })?),
                    Some(other) => {
                        return Err(OracleError::InvalidMaType(format!("wma {other}")));
                    }
                };
                Ok(MaStrategy::Wma(kind))
            }
            other => Err(OracleError::InvalidMaType(other.to_string())),
        }
    }

    /// The `ma_type` tag.
    pub fn ma_type(&self) -> &'static str {
        match self {
            MaStrategy::Sma => "sma",
            MaStrategy::Ema => "ema",
            MaStrategy::Wma(_) => "wma",
        }
    }
}

impl Default for MaStrategy {
    fn default() -> Self {
        MaStrategy::Wma(WmaKind::Balanced)
    }
}

impl fmt::Display for MaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaStrategy::Sma | MaStrategy::Ema => f.write_str(self.ma_type()),
            MaStrategy::Wma(WmaKind::Recent) => f.write_str("wma RECENT"),
            MaStrategy::Wma(WmaKind::Oldest) => f.write_str("wma OLDEST"),
            MaStrategy::Wma(WmaKind::Balanced) => f.write_str("wma BALANCED"),
            MaStrategy::Wma(WmaKind::Custom(w)) => write!(f, "wma CUSTOM {w:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(MaStrategy::parse("sma", None, None).expect("sma"), MaStrategy::Sma);
        assert_eq!(MaStrategy::parse(" EMA ", None, None).expect("ema"), MaStrategy::Ema);
        assert_eq!(
            MaStrategy::parse("wma", None, None).expect("wma"),
            MaStrategy::Wma(WmaKind::Balanced)
        );
        assert_eq!(
            MaStrategy::parse("wma", Some("oldest"), None).expect("wma"),
            MaStrategy::Wma(WmaKind::Oldest)
        );
        assert_eq!(
            MaStrategy::parse("wma", Some("CUSTOM"), Some(vec![1, 2])).expect("wma"),
            MaStrategy::Wma(WmaKind::Custom(vec![1, 2]))
        );
    }

    #[test]
    fn test_unknown_tags_rejected() {
        assert!(matches!(
            MaStrategy::parse("hma", None, None),
            Err(OracleError::InvalidMaType(_))
        ));
        assert!(matches!(
            MaStrategy::parse("wma", Some("FAST"), None),
            Err(OracleError::InvalidMaType(_))
        ));
        assert!(matches!(
            MaStrategy::parse("wma", Some("custom"), None),
            Err(OracleError::InvalidMaType(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(MaStrategy::default().to_string(), "wma BALANCED");
        assert_eq!(MaStrategy::Sma.to_string(), "sma");
    }
}
