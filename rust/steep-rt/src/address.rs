//! Address validation used by the `address` declared type.

use crate::config::DispatchOptions;
use regex::Regex;

/// Bech32 data alphabet.
const DATA_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

pub trait AddressValidator {
    fn is_valid_address(&self, candidate: &str) -> bool;
}

/// Accepts `<prefix><data>` where data is exactly `data_len` bech32
/// characters.
#[derive(Debug, Clone)]
pub struct PrefixValidator {
    pattern: Regex,
}

impl PrefixValidator {
    pub fn new(options: &DispatchOptions) -> Result<Self, regex::Error> {
        let pattern = format!(
            "^{}[{}]{{{}}}$",
            regex::escape(&options.address_prefix),
            DATA_CHARSET,
            options.address_data_len
        );
        Ok(Self { pattern: Regex::new(&pattern)? })
    }
}

impl AddressValidator for PrefixValidator {
    fn is_valid_address(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate)
    }
}

/// Accepts no address at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl AddressValidator for RejectAll {
    fn is_valid_address(&self, _candidate: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape() {
        let v = PrefixValidator::new(&DispatchOptions::default()).unwrap();
        let good = format!("tea1{}", "q".repeat(38));
        assert!(v.is_valid_address(&good));
        assert!(!v.is_valid_address(&format!("tea1{}", "q".repeat(37))));
        assert!(!v.is_valid_address(&format!("teb1{}", "q".repeat(38))));
        // 'b' is outside the bech32 alphabet
        assert!(!v.is_valid_address(&format!("tea1{}b", "q".repeat(37))));
    }

    #[test]
    fn test_prefix_is_escaped() {
        let opts = DispatchOptions { address_prefix: "a.b".into(), address_data_len: 2 };
        let v = PrefixValidator::new(&opts).unwrap();
        assert!(v.is_valid_address("a.bqq"));
        assert!(!v.is_valid_address("axbqq"));
    }

    #[test]
    fn test_reject_all() {
        assert!(!RejectAll.is_valid_address("tea1qqqq"));
    }
}
