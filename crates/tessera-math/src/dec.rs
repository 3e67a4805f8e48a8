//! Fixed-point decimal with a pinned scale and a pinned truncation rule.
//!
//! A [`Dec`] stores `value × 10^18` in a 256-bit unsigned integer. Products
//! and quotients are formed in 512 bits and truncated toward zero exactly
//! once, then narrowed back:
//!
//! ```text
//! a * b = floor(raw_a * raw_b / 10^18)
//! a / b = floor(raw_a * 10^18 / raw_b)
//! ```
//!
//! Overflow, underflow and division by zero are returned as errors; nothing
//! wraps or saturates silently.

use std::fmt;
use std::str::FromStr;

use primitive_types::{U256, U512};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{MathError, Result};

/// Number of fractional decimal digits carried by every [`Dec`].
pub const PRECISION: usize = 18;

fn scale() -> U256 {
    U256::exp10(PRECISION)
}

fn narrow(wide: U512) -> Result<U256> {
    U256::try_from(wide).map_err(|_| MathError::Overflow)
}

/// Unsigned fixed-point decimal with 18 fractional digits.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(U256);

impl Dec {
    /// The value `0`.
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// The value `1`.
    pub fn one() -> Self {
        Self(scale())
    }

    /// Build a decimal from its raw scaled representation.
    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// The raw scaled representation (`value × 10^18`).
    pub fn raw(&self) -> U256 {
        self.0
    }

    /// Build a decimal from a whole number.
    pub fn from_int(value: u128) -> Self {
        // u128 * 10^18 < 2^188, always fits.
        Self(U256::from(value) * scale())
    }

    /// Build `num / den`, truncated to 18 digits.
    ///
    /// # Errors
    ///
    /// - [`MathError::DivisionByZero`] if `den` is zero
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_math::Dec;
    ///
    /// let rate = Dec::from_ratio(5, 1000).unwrap();
    /// assert_eq!(rate.to_string(), "0.005000000000000000");
    /// ```
    pub fn from_ratio(num: u128, den: u128) -> Result<Self> {
        if den == 0 {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self(U256::from(num) * scale() / U256::from(den)))
    }

    /// Whether the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self + rhs`.
    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    /// `self - rhs`.
    ///
    /// # Errors
    ///
    /// - [`MathError::Underflow`] if `rhs > self`
    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or_else(|| MathError::Underflow {
                lhs: self.to_string(),
                rhs: rhs.to_string(),
            })
    }

    /// `|self - rhs|`.
    pub fn abs_diff(self, rhs: Self) -> Self {
        if self >= rhs {
            Self(self.0 - rhs.0)
        } else {
            Self(rhs.0 - self.0)
        }
    }

    /// `self × rhs`, truncated toward zero.
    pub fn checked_mul(self, rhs: Self) -> Result<Self> {
        let wide = self.0.full_mul(rhs.0) / U512::from(scale());
        narrow(wide).map(Self)
    }

    /// `self ÷ rhs`, truncated toward zero.
    ///
    /// # Errors
    ///
    /// - [`MathError::DivisionByZero`] if `rhs` is zero
    /// - [`MathError::Overflow`] if the quotient exceeds 256 bits
    pub fn checked_quo(self, rhs: Self) -> Result<Self> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        let wide = self.0.full_mul(scale()) / U512::from(rhs.0);
        narrow(wide).map(Self)
    }

    /// `self × n` for a whole number `n`. Exact.
    pub fn checked_mul_int(self, n: u128) -> Result<Self> {
        self.0
            .checked_mul(U256::from(n))
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    /// `self ÷ n` for a whole number `n`, truncated toward zero.
    pub fn checked_quo_int(self, n: u128) -> Result<Self> {
        if n == 0 {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self(self.0 / U256::from(n)))
    }

    /// Drop the fractional digits.
    pub fn truncate(self) -> U256 {
        self.0 / scale()
    }

    /// Drop the fractional digits and narrow to `u128`.
    ///
    /// # Errors
    ///
    /// - [`MathError::IntOutOfRange`] if the integer part exceeds `u128::MAX`
    pub fn truncate_u128(self) -> Result<u128> {
        let int = self.truncate();
        if int.bits() > 128 {
            return Err(MathError::IntOutOfRange(int.to_string()));
        }
        Ok(int.low_u128())
    }

    /// Square root, truncated toward zero.
    pub fn approx_sqrt(self) -> Result<Self> {
        // sqrt(raw / 10^18) * 10^18 == sqrt(raw * 10^18)
        let root = self.0.full_mul(scale()).integer_sqrt();
        narrow(root).map(Self)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / scale();
        let frac = self.0 % scale();
        write!(f, "{}.{:0>width$}", int, frac.to_string(), width = PRECISION)
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

impl FromStr for Dec {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self> {
        let parse_err = |reason| MathError::Parse {
            input: s.to_string(),
            reason,
        };

        let trimmed = s.trim();
        if trimmed.starts_with('-') {
            return Err(parse_err("negative decimals are not representable"));
        }
        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (trimmed, ""),
        };
        if int_part.is_empty() {
            return Err(parse_err("missing integer part"));
        }
        if trimmed.contains('.') && frac_part.is_empty() {
            return Err(parse_err("missing fractional digits"));
        }
        if frac_part.len() > PRECISION {
            return Err(parse_err("more than 18 fractional digits"));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(parse_err("non-digit character"));
        }

        let int = U256::from_dec_str(int_part).map_err(|_| parse_err("integer part too large"))?;
        let frac = if frac_part.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(frac_part).map_err(|_| parse_err("fraction too large"))?
                * U256::exp10(PRECISION - frac_part.len())
        };

        int.checked_mul(scale())
            .and_then(|v| v.checked_add(frac))
            .map(Self)
            .ok_or_else(|| parse_err("value exceeds 256 bits"))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
