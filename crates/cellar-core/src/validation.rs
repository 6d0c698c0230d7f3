//! # Validation Module
//!
//! Input validation applied before anything is written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screens (TypeScript)                                         │
//! │  ├── Digits-only price inputs, empty-field alerts                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (Rust)                                           │
//! │  └── Names, credentials, amounts, quantities, ranges                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE(username)                                                  │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cellar_core::validation::{validate_username, validate_quantity};
//!
//! validate_username("admin").unwrap();
//! validate_quantity(2).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{NewCategory, NewOrderItem, NewProduct};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length accepted at registration and password change.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// String Validators
// =============================================================================

fn validate_display_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace
///
/// ## Example
/// ```rust
/// use cellar_core::validation::validate_username;
///
/// assert!(validate_username("sommelier").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("two words").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_display_name("username", username, 50)?;

    if username.trim().chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a raw password before it is hashed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_display_name("name", name, 200)
}

/// Validates a category name (1-100 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_display_name("category name", name, 100)
}

/// Validates a delivery address.
pub fn validate_address(address: &str) -> ValidationResult<()> {
    validate_display_name("address", address, 500)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a monetary amount.
///
/// ## Rules
/// - Must be finite
/// - Must be non-negative (zero is allowed)
///
/// ## Example
/// ```rust
/// use cellar_core::validation::validate_price;
///
/// assert!(validate_price(15_000_000.0).is_ok());
/// assert!(validate_price(0.0).is_ok());
/// assert!(validate_price(-1.0).is_err());
/// assert!(validate_price(f64::NAN).is_err());
/// ```
pub fn validate_price(price: f64) -> ValidationResult<()> {
    validate_amount("price", price)
}

/// Same rules as [`validate_price`], reported against `field`.
pub fn validate_amount(field: &str, amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::InvalidAmount {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price range before it reaches the catalog.
///
/// The catalog query itself performs no validation; callers use this to
/// reject inverted or negative bounds.
pub fn validate_price_range(min: f64, max: f64) -> ValidationResult<()> {
    validate_price(min)?;
    validate_price(max)?;

    if min > max {
        return Err(ValidationError::InvertedRange { min, max });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates the fields of a new or replacement category.
pub fn validate_new_category(category: &NewCategory) -> ValidationResult<()> {
    validate_category_name(&category.name)
}

/// Validates the fields of a new product.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price(product.price)
}

/// Validates the line items of an order.
///
/// ## Rules
/// - At least one item
/// - Every quantity passes [`validate_quantity`]
/// - Every captured unit price passes [`validate_price`]
pub fn validate_order_items(items: &[NewOrderItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::required("order items"));
    }

    for item in items {
        validate_quantity(item.quantity)?;
        validate_price(item.price)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("  padded  ").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("admin123").is_ok());
        assert_eq!(
            validate_password("abc"),
            Err(ValidationError::TooShort {
                field: "password".to_string(),
                min: MIN_PASSWORD_LEN
            })
        );
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_names_count_characters() {
        // 200 accented characters are more than 200 bytes but still valid
        assert!(validate_product_name(&"â".repeat(200)).is_ok());
        assert!(validate_product_name(&"â".repeat(201)).is_err());
        assert!(validate_category_name("Château Margaux").is_ok());
        assert!(validate_category_name("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_range() {
        assert!(validate_price_range(15.0, 25.0).is_ok());
        assert!(validate_price_range(20.0, 20.0).is_ok());
        assert_eq!(
            validate_price_range(25.0, 15.0),
            Err(ValidationError::InvertedRange { min: 25.0, max: 15.0 })
        );
        assert!(validate_price_range(-1.0, 10.0).is_err());
    }

    #[test]
    fn test_validate_order_items() {
        assert!(validate_order_items(&[]).is_err());

        let ok = NewOrderItem {
            product_id: 1,
            quantity: 2,
            price: 10.0,
        };
        assert!(validate_order_items(std::slice::from_ref(&ok)).is_ok());

        let zero_qty = NewOrderItem { quantity: 0, ..ok };
        assert!(validate_order_items(&[zero_qty]).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let product = NewProduct {
            name: "Penfolds Grange 2017".to_string(),
            price: 22_000_000.0,
            img: None,
            category_id: 3,
        };
        assert!(validate_new_product(&product).is_ok());

        let free_but_nameless = NewProduct {
            name: " ".to_string(),
            price: 0.0,
            ..product
        };
        assert!(validate_new_product(&free_but_nameless).is_err());
    }
}
