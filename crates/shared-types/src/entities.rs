//! # Core Value Types
//!
//! - **Identity**: `Address` (20-byte contract or account address),
//!   `TxHash` (32-byte transaction hash)
//! - **Quantities**: `Amount` (256-bit unsigned token amount), `Timestamp`
//!   (chain time in seconds)

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ParseError;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A token amount in base units. Arbitrary precision up to 2^256 - 1.
pub type Amount = U256;

/// Chain time in seconds since the Unix epoch.
pub type Timestamp = u64;

/// Decode a `0x`-prefixed (or bare) hex string into exactly `N` bytes.
fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], ParseError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(ParseError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

macro_rules! hex_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Byte length of this type.
            pub const LEN: usize = $len;

            /// All-zero value.
            pub const ZERO: Self = Self([0u8; $len]);

            /// Build from raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Build a value whose every byte is `byte`. Handy in tests.
            pub const fn repeat_byte(byte: u8) -> Self {
                Self([byte; $len])
            }

            /// Parse from `0x`-prefixed or bare hex.
            pub fn from_hex(input: &str) -> Result<Self, ParseError> {
                decode_fixed::<{ $len }>(input).map(Self)
            }

            /// Lowercase `0x`-prefixed hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::from_hex(&text).map_err(de::Error::custom)
            }
        }
    };
}

hex_newtype!(
    /// A 20-byte Ethereum-style address (organization contract, employee,
    /// owner, token or protocol).
    Address,
    20
);

hex_newtype!(
    /// A 32-byte transaction hash. Stable identifier of the transaction
    /// that emitted an event.
    TxHash,
    32
);

/// Parse a decimal amount string.
pub fn parse_amount(input: &str) -> Result<Amount, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidAmount(input.to_string()));
    }
    U256::from_dec_str(trimmed).map_err(|_| ParseError::InvalidAmount(input.to_string()))
}

/// Serde adapter that writes amounts as decimal strings and reads either
/// decimal strings or JSON integers.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Deposit {
///     #[serde(with = "shared_types::amount")]
///     amount: Amount,
/// }
/// ```
pub mod amount {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal string or a non-negative integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(U256::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            u64::try_from(v)
                .map(U256::from)
                .map_err(|_| E::custom(format!("negative amount: {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            parse_amount(v).map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_round_trip() {
        let addr = Address::repeat_byte(0xAB);
        let text = addr.to_hex();
        assert_eq!(text.len(), 2 + 40);
        assert_eq!(Address::from_hex(&text).unwrap(), addr);
    }

    #[test]
    fn test_address_accepts_bare_and_uppercase_prefix() {
        let bare = "11".repeat(20);
        assert_eq!(Address::from_hex(&bare).unwrap(), Address::repeat_byte(0x11));
        let upper = format!("0X{}", bare);
        assert_eq!(Address::from_hex(&upper).unwrap(), Address::repeat_byte(0x11));
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        let err = Address::from_hex("0x1234").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidLength {
                expected: 20,
                actual: 2
            }
        );
    }

    #[test]
    fn test_tx_hash_rejects_non_hex() {
        let err = TxHash::from_hex("0xzz").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHex(_)));
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr = Address::repeat_byte(0x01);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_amount_accepts_string_and_integer() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(with = "amount")]
            value: Amount,
        }

        let big: Wrapper =
            serde_json::from_str(r#"{"value":"340282366920938463463374607431768211456"}"#).unwrap();
        assert_eq!(big.value, U256::from(u128::MAX) + U256::one());

        let small: Wrapper = serde_json::from_str(r#"{"value":42}"#).unwrap();
        assert_eq!(small.value, U256::from(42u64));

        assert!(serde_json::from_str::<Wrapper>(r#"{"value":-1}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"value":"1.5"}"#).is_err());
    }

    #[test]
    fn test_parse_amount_rejects_empty() {
        assert!(matches!(parse_amount("  "), Err(ParseError::InvalidAmount(_))));
    }
}
