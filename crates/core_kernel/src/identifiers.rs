//! Strongly-typed identifiers for domain entities
//!
//! Identifiers are assigned by the store as positive integers. Newtype
//! wrappers keep a claim id from being passed where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store-assigned value
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw integer value
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                raw.parse::<i64>()
                    .map(Self)
                    .map_err(|_| CoreError::InvalidIdentifier(s.to_string()))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(ClaimId, "CLM");
define_id!(UserId, "USR");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_id_display() {
        let id = ClaimId::new(42);
        assert_eq!(id.to_string(), "CLM-42");
    }

    #[test]
    fn test_id_parsing_accepts_bare_and_prefixed() {
        assert_eq!("USR-7".parse::<UserId>().unwrap(), UserId::new(7));
        assert_eq!("7".parse::<UserId>().unwrap(), UserId::new(7));
    }

    #[test]
    fn test_id_parsing_rejects_garbage() {
        assert!("CLM-abc".parse::<ClaimId>().is_err());
        assert!("".parse::<ClaimId>().is_err());
    }
}
