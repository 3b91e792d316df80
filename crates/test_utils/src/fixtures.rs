//! Pre-built Test Fixtures
//!
//! Provides ready-to-use principals and claim content. Ids are fixed so that
//! assertions on ownership stay readable.

use core_kernel::{Principal, UserId};
use domain_reimbursement::{ClaimContent, ExpenseCategory};
use fake::faker::lorem::en::{Sentence, Words};
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture for principals of every role
pub struct PrincipalFixtures;

impl PrincipalFixtures {
    pub const EMPLOYEE_ID: i64 = 1;
    pub const OTHER_EMPLOYEE_ID: i64 = 2;
    pub const MANAGER_ID: i64 = 10;
    pub const FINANCE_ID: i64 = 20;

    /// The employee who owns most test claims
    pub fn employee() -> Principal {
        Principal::employee(Self::EMPLOYEE_ID)
    }

    /// An employee who owns none of the default claims
    pub fn other_employee() -> Principal {
        Principal::employee(Self::OTHER_EMPLOYEE_ID)
    }

    pub fn manager() -> Principal {
        Principal::manager(Self::MANAGER_ID)
    }

    pub fn finance() -> Principal {
        Principal::finance(Self::FINANCE_ID)
    }

    pub fn employee_id() -> UserId {
        UserId::new(Self::EMPLOYEE_ID)
    }
}

/// Fixture for claim content
pub struct ContentFixtures;

impl ContentFixtures {
    /// A $50 taxi ride
    pub fn taxi() -> ClaimContent {
        Self::with_amount(dec!(50))
    }

    /// A two-night hotel stay
    pub fn hotel() -> ClaimContent {
        ClaimContent {
            title: "Hotel".to_string(),
            description: "Two nights during the client visit".to_string(),
            category: ExpenseCategory::Accommodation,
            amount: dec!(240.00),
            receipt_reference: "/uploads/20240301-hotel.pdf".to_string(),
        }
    }

    /// Transport content with the given amount
    pub fn with_amount(amount: Decimal) -> ClaimContent {
        ClaimContent {
            title: "Taxi".to_string(),
            description: "Airport to office".to_string(),
            category: ExpenseCategory::Transport,
            amount,
            receipt_reference: "/uploads/20240301-taxi.jpg".to_string(),
        }
    }

    /// Randomised but valid content
    pub fn random() -> ClaimContent {
        let words: Vec<String> = Words(1..4).fake();
        let cents: i64 = (1..5_000_000).fake();
        ClaimContent {
            title: words.join(" "),
            description: Sentence(3..10).fake(),
            category: ExpenseCategory::Meals,
            amount: Decimal::new(cents, 2),
            receipt_reference: format!("/uploads/{}.png", cents),
        }
    }
}
