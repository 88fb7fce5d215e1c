use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const DECIMALS: usize = 18;
const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// An amount of the ledger's native token, in its smallest unit (18 decimals).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Wei(pub u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    /// Parse a decimal ether amount such as `"0.5"` or `"12"`.
    pub fn parse_ether(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let invalid = || TypeError::InvalidAmount(s.to_string());

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > DECIMALS {
            return Err(invalid());
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_value: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = DECIMALS);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|w| w.checked_add(frac_value))
            .map(Wei)
            .ok_or_else(invalid)
    }

    /// Decimal ether rendering without trailing zeros.
    pub fn format_ether(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        if frac == 0 {
            return whole.to_string();
        }
        let digits = format!("{frac:0width$}", width = DECIMALS);
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }

    pub fn checked_sub(self, other: Wei) -> Option<Wei> {
        self.0.checked_sub(other.0).map(Wei)
    }

    pub fn checked_mul(self, factor: u128) -> Option<Wei> {
        self.0.checked_mul(factor).map(Wei)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_ether())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fractional() {
        assert_eq!(Wei::parse_ether("0.5").unwrap(), Wei(WEI_PER_ETHER / 2));
        assert_eq!(Wei::parse_ether(".25").unwrap(), Wei(WEI_PER_ETHER / 4));
        assert_eq!(Wei::parse_ether("1.").unwrap(), Wei(WEI_PER_ETHER));
    }

    #[test]
    fn parse_whole() {
        assert_eq!(Wei::parse_ether("3").unwrap(), Wei(3 * WEI_PER_ETHER));
        assert_eq!(Wei::parse_ether("0").unwrap(), Wei::ZERO);
    }

    #[test]
    fn parse_smallest_unit() {
        assert_eq!(Wei::parse_ether("0.000000000000000001").unwrap(), Wei(1));
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", ".", "-1", "1e18", "abc", "0.0000000000000000001", "1.2.3"] {
            assert!(Wei::parse_ether(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(Wei::parse_ether("999999999999999999999999999").is_err());
    }

    #[test]
    fn format_trims_trailing_zeros() {
        assert_eq!(Wei(WEI_PER_ETHER / 2).format_ether(), "0.5");
        assert_eq!(Wei(7 * WEI_PER_ETHER).format_ether(), "7");
        assert_eq!(Wei(1).format_ether(), "0.000000000000000001");
        assert_eq!(Wei::parse_ether("12.034").unwrap().to_string(), "12.034");
    }

    #[test]
    fn checked_arithmetic() {
        let half = Wei::parse_ether("0.5").unwrap();
        assert_eq!(half.checked_add(half), Some(Wei(WEI_PER_ETHER)));
        assert_eq!(Wei::ZERO.checked_sub(half), None);
        assert_eq!(Wei(u128::MAX).checked_mul(2), None);
    }
}
