//! Fixed-point token amounts
//!
//! Vote counts, funds received and campaign pools are integers with 18
//! implied decimals. Arithmetic that stays linear (fees, sums) is done on the
//! integer; anything non-linear converts to decimal first.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Fixed-point token amount (scale 10^18)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TokenAmount(pub u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);
    /// Implied decimal scale
    pub const SCALE: u128 = 1_000_000_000_000_000_000;
    pub const DECIMALS: u32 = 18;

    #[inline]
    pub fn from_raw(raw: u128) -> Self {
        TokenAmount(raw)
    }

    /// Whole tokens, scaled up
    #[inline]
    pub fn from_tokens(tokens: u64) -> Self {
        TokenAmount(tokens as u128 * Self::SCALE)
    }

    #[inline]
    pub fn raw(self) -> u128 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Lenient conversion from whatever the chain reader produced.
    /// Negative, non-numeric or overflowing input is treated as zero.
    pub fn parse_lenient(raw: &RawAmount) -> Self {
        match raw {
            RawAmount::Integer(value) => {
                if *value < 0 {
                    TokenAmount::ZERO
                } else {
                    TokenAmount(*value as u128)
                }
            }
            RawAmount::Text(text) => TokenAmount(parse_u128(text).unwrap_or(0)),
        }
    }

    /// Convert to decimal units (÷10^18).
    /// Whole and fractional parts are converted separately so large pools
    /// keep their sub-token digits.
    pub fn to_decimal(self) -> f64 {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        whole as f64 + frac as f64 / Self::SCALE as f64
    }

    /// `pct` percent of this amount, rounded down. `pct` is clamped to 100.
    pub fn percent_of(self, pct: u64) -> Self {
        let pct = pct.min(100) as u128;
        // raw = 100q + r, so raw * pct / 100 = q * pct + r * pct / 100 without overflow
        let q = self.0 / 100;
        let r = self.0 % 100;
        TokenAmount(q * pct + r * pct / 100)
    }

    #[inline]
    pub fn saturating_add(self, rhs: TokenAmount) -> Self {
        TokenAmount(self.0.saturating_add(rhs.0))
    }
}

impl Add for TokenAmount {
    type Output = TokenAmount;

    #[inline]
    fn add(self, rhs: TokenAmount) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = TokenAmount>>(iter: I) -> Self {
        iter.fold(TokenAmount::ZERO, TokenAmount::saturating_add)
    }
}

impl<'a> Sum<&'a TokenAmount> for TokenAmount {
    fn sum<I: Iterator<Item = &'a TokenAmount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tokens({})", self)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Numeric value as handed over by a contract reader
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawAmount {
    Integer(i128),
    Text(String),
}

impl From<u128> for RawAmount {
    fn from(value: u128) -> Self {
        match i128::try_from(value) {
            Ok(v) => RawAmount::Integer(v),
            Err(_) => RawAmount::Text(value.to_string()),
        }
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<TokenAmount> for RawAmount {
    fn from(value: TokenAmount) -> Self {
        RawAmount::from(value.0)
    }
}

fn parse_u128(text: &str) -> Option<u128> {
    let trimmed = text.trim();
    if let Some(hex) = trimmed.strip_prefix("0x") {
        return u128::from_str_radix(hex, 16).ok();
    }
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
