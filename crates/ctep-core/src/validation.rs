//! # Validation Module
//!
//! Input validation for payment requests coming from the POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler                                                 │
//! │  ├── JSON-RPC envelope shape (deserialization)                         │
//! │  └── payment_info present                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── amount parses exactly and is > 0                                  │
//! │  └── terminal id / order reference are usable                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Terminal                                                     │
//! │  └── card, limits, PIN (reported back as incident codes)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amount failures are reported as `PaymentError::InvalidAmount`, because
//! that is the category callers branch on; other fields use
//! `ValidationError`.

use serde_json::Value;

use crate::error::{PaymentError, ValidationError};
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest merchant reference forwarded to a terminal.
pub const MAX_ORDER_REFERENCE_LEN: usize = 100;

/// Longest terminal identifier accepted from the POS.
pub const MAX_TERMINAL_ID_LEN: usize = 64;

// =============================================================================
// Amount
// =============================================================================

/// Validates that a sale amount is strictly positive.
///
/// ## Example
/// ```rust
/// use ctep_core::money::Money;
/// use ctep_core::validation::validate_amount;
///
/// assert!(validate_amount(Money::from_cents(1000)).is_ok());
/// assert!(validate_amount(Money::from_cents(-500)).is_err());
/// ```
pub fn validate_amount(amount: Money) -> Result<(), PaymentError> {
    if !amount.is_positive() {
        return Err(PaymentError::InvalidAmount {
            reason: format!("amount must be positive, got {}", amount),
        });
    }
    Ok(())
}

/// Parses the `amount` field of a POS payment payload.
///
/// Accepts a JSON number (`10.5`) or a numeric string (`"10.50"`). The
/// number is read from its decimal text, never through `f64` arithmetic.
///
/// ## Example
/// ```rust
/// use ctep_core::validation::parse_amount;
/// use serde_json::json;
///
/// assert_eq!(parse_amount(Some(&json!(10.0))).unwrap().cents(), 1000);
/// assert_eq!(parse_amount(Some(&json!("7.25"))).unwrap().cents(), 725);
/// assert!(parse_amount(None).is_err());
/// assert!(parse_amount(Some(&json!(-5))).is_err());
/// ```
pub fn parse_amount(value: Option<&Value>) -> Result<Money, PaymentError> {
    let text = match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            return Err(PaymentError::InvalidAmount {
                reason: "amount is required".to_string(),
            })
        }
        Some(other) => {
            return Err(PaymentError::InvalidAmount {
                reason: format!("expected a number, got {}", other),
            })
        }
    };

    let amount = Money::parse_decimal(&text).map_err(|e| PaymentError::InvalidAmount {
        reason: e.to_string(),
    })?;
    validate_amount(amount)?;
    Ok(amount)
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an order (merchant) reference.
///
/// ## Rules
/// - Must not be blank
/// - At most 100 characters
pub fn validate_order_reference(reference: &str) -> ValidationResult<()> {
    if reference.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "order_id".to_string(),
        });
    }

    if reference.chars().count() > MAX_ORDER_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: "order_id".to_string(),
            max: MAX_ORDER_REFERENCE_LEN,
        });
    }

    Ok(())
}

/// Validates a terminal identifier.
pub fn validate_terminal_id(terminal_id: &str) -> ValidationResult<()> {
    if terminal_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "terminal_id".to_string(),
        });
    }

    if terminal_id.len() > MAX_TERMINAL_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "terminal_id".to_string(),
            max: MAX_TERMINAL_ID_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Money::from_cents(1)).is_ok());
        assert!(matches!(
            validate_amount(Money::zero()),
            Err(PaymentError::InvalidAmount { .. })
        ));
        assert!(matches!(
            validate_amount(Money::from_cents(-500)),
            Err(PaymentError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_parse_amount_number_and_string() {
        assert_eq!(parse_amount(Some(&json!(10))).unwrap().cents(), 1000);
        assert_eq!(parse_amount(Some(&json!(10.1))).unwrap().cents(), 1010);
        assert_eq!(parse_amount(Some(&json!("0.99"))).unwrap().cents(), 99);
    }

    #[test]
    fn test_parse_amount_rejections() {
        for value in [json!(null), json!(true), json!([]), json!("abc"), json!(-5), json!(0)] {
            assert!(
                matches!(parse_amount(Some(&value)), Err(PaymentError::InvalidAmount { .. })),
                "{value} should be rejected"
            );
        }
        assert!(matches!(parse_amount(None), Err(PaymentError::InvalidAmount { .. })));
    }

    #[test]
    fn test_validate_order_reference() {
        assert!(validate_order_reference("Order 00042-001-0007").is_ok());
        assert!(validate_order_reference("").is_err());
        assert!(validate_order_reference(&"X".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_terminal_id() {
        assert!(validate_terminal_id("0").is_ok());
        assert!(validate_terminal_id(" ").is_err());
        assert!(validate_terminal_id(&"9".repeat(65)).is_err());
    }
}
