//! Unit tests for the Identifiers module
//!
//! Covers construction, parsing, conversion, ordering and serde shape.

use core_kernel::{ClaimId, UserId};
use proptest::prelude::*;

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_value_roundtrip() {
        let id = ClaimId::new(17);
        assert_eq!(id.value(), 17);
        let raw: i64 = id.into();
        assert_eq!(raw, 17);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(ClaimId::prefix(), "CLM");
        assert_eq!(UserId::prefix(), "USR");
    }

    #[test]
    fn test_display_uses_prefix() {
        assert_eq!(ClaimId::new(5).to_string(), "CLM-5");
        assert_eq!(UserId::new(5).to_string(), "USR-5");
    }

    #[test]
    fn test_foreign_prefix_is_rejected() {
        assert!("USR-5".parse::<ClaimId>().is_err());
    }

    #[test]
    fn test_ordering_follows_value() {
        assert!(ClaimId::new(1) < ClaimId::new(2));
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&ClaimId::new(9)).unwrap();
        assert_eq!(json, "9");

        let parsed: UserId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, UserId::new(12));
    }
}

proptest! {
    #[test]
    fn display_parses_back(raw in any::<i64>()) {
        let id = UserId::new(raw);
        prop_assert_eq!(id.to_string().parse::<UserId>().unwrap(), id);
    }
}
