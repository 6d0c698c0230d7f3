//! # Cart
//!
//! In-memory shopping cart built on the product and cart screens and turned
//! into order lines at checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Screen Action            Cart Method              Change               │
//! │  ─────────────            ───────────              ──────               │
//! │  "Add to cart" ─────────► add_item() ─────────────► push or qty += n    │
//! │  Quantity stepper ──────► update_quantity() ──────► qty = n (0 removes) │
//! │  Swipe to remove ───────► remove_item() ──────────► items.remove(i)     │
//! │  Place order ───────────► order_items() + total() ► create_order(...)   │
//! │                           clear() after success                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart lives on the single foreground context; callers that share it
//! across tasks wrap it in their own lock.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{NewOrderItem, Product};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the shopping cart.
///
/// Name, image and unit price are frozen when the product is added, so the
/// cart keeps showing (and charging) what the customer saw even if an admin
/// edits the product meanwhile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub name: String,
    pub img: Option<String>,
    pub unit_price: f64,
    pub quantity: i64,
}

impl CartItem {
    /// Creates a cart item from a product, capturing its current price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id,
            name: product.name.clone(),
            img: product.img.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product increases quantity)
/// - Every quantity is in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Adds a product or increases its quantity if already present.
    ///
    /// A product already in the cart keeps the unit price it was first
    /// added with.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CoreError::NotInCart(product_id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product id.
    pub fn remove_item(&mut self, product_id: i64) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id))
        } else {
            Ok(())
        }
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Order total: sum of line totals at the frozen unit prices.
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Converts the cart into order lines for checkout.
    pub fn order_items(&self) -> CoreResult<Vec<NewOrderItem>> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        Ok(self
            .items
            .iter()
            .map(|item| NewOrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.unit_price,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wine(id: i64, price: f64) -> Product {
        Product {
            id,
            name: format!("Wine {}", id),
            price,
            img: None,
            category_id: 1,
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        cart.add_item(&wine(1, 250.0), 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total(), 500.0);
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = wine(1, 100.0);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_keeps_first_price() {
        let mut cart = Cart::new();
        cart.add_item(&wine(1, 100.0), 1).unwrap();
        cart.add_item(&wine(1, 150.0), 1).unwrap();

        assert_eq!(cart.items()[0].unit_price, 100.0);
        assert_eq!(cart.total(), 200.0);
    }

    #[test]
    fn test_cart_quantity_limits() {
        let mut cart = Cart::new();
        let product = wine(1, 10.0);

        assert!(cart.add_item(&product, 0).is_err());
        cart.add_item(&product, MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add_item(&product, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(&wine(1, 10.0), 3).unwrap();
        cart.add_item(&wine(2, 20.0), 1).unwrap();

        cart.update_quantity(1, 5).unwrap();
        assert_eq!(cart.total(), 70.0);

        cart.update_quantity(1, 0).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert!(matches!(cart.update_quantity(1, 2), Err(CoreError::NotInCart(1))));
    }

    #[test]
    fn test_order_items_from_cart() {
        let mut cart = Cart::new();
        assert!(matches!(cart.order_items(), Err(CoreError::EmptyCart)));

        cart.add_item(&wine(7, 15_000_000.0), 2).unwrap();
        let items = cart.order_items().unwrap();
        assert_eq!(
            items,
            vec![NewOrderItem {
                product_id: 7,
                quantity: 2,
                price: 15_000_000.0
            }]
        );

        cart.clear();
        assert!(cart.is_empty());
    }
}
