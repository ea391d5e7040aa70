//! Property-based tests for domain value objects
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::{EmailAddress, Password, Quadrant, WorkflowId};
use proptest::prelude::*;

// ============================================================================
// WorkflowId Property Tests
// ============================================================================

mod workflow_id_tests {
    use super::*;

    proptest! {
        #[test]
        fn display_parses_back(position in 0usize..100_000) {
            let id = WorkflowId::from_position(position);
            let parsed: WorkflowId = id.to_string().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }

        #[test]
        fn ids_are_strictly_increasing(position in 0usize..100_000) {
            prop_assert!(WorkflowId::from_position(position) < WorkflowId::from_position(position + 1));
        }

        #[test]
        fn display_has_at_least_three_digits(position in 0usize..100_000) {
            let text = WorkflowId::from_position(position).to_string();
            prop_assert!(text.starts_with('W'));
            prop_assert!(text.len() >= 4);
        }
    }
}

// ============================================================================
// Password Property Tests
// ============================================================================

mod password_tests {
    use super::*;

    proptest! {
        #[test]
        fn compliant_passwords_are_accepted(
            upper in "[A-Z]{1,4}",
            lower in "[a-z]{1,4}",
            digit in "[0-9]{1,4}",
            symbol in "[!@#$%^&*?]{1,4}",
            filler in "[a-z]{4,8}",
        ) {
            let raw = format!("{upper}{lower}{digit}{symbol}{filler}");
            prop_assert!(Password::new(raw).is_ok());
        }

        #[test]
        fn passwords_without_digits_are_rejected(raw in "[A-Za-z!@#]{8,20}") {
            prop_assert!(Password::new(raw).is_err());
        }

        #[test]
        fn short_passwords_are_rejected(raw in ".{0,7}") {
            prop_assert!(Password::new(raw).is_err());
        }
    }
}

// ============================================================================
// EmailAddress Property Tests
// ============================================================================

mod email_tests {
    use super::*;

    proptest! {
        #[test]
        fn email_is_always_lowercase(input in "[A-Za-z]{1,10}@[A-Za-z]{1,10}\\.[a-z]{2,3}") {
            if let Ok(email) = EmailAddress::new(&input) {
                prop_assert_eq!(email.as_str(), email.as_str().to_lowercase());
            }
        }

        #[test]
        fn strings_without_at_are_rejected(s in "[a-zA-Z0-9.]+") {
            prop_assert!(EmailAddress::new(&s).is_err());
        }
    }
}

// ============================================================================
// Quadrant Property Tests
// ============================================================================

mod quadrant_tests {
    use super::*;

    proptest! {
        #[test]
        fn raising_automation_never_leaves_the_high_side(
            automation in 3.0f64..=5.0,
            bump in 0.0f64..=2.0,
            load in 1.0f64..=5.0,
        ) {
            let before = Quadrant::classify(automation, load);
            let after = Quadrant::classify(automation + bump, load);
            prop_assert_eq!(before, after);
        }
    }
}
