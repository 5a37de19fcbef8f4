//! Order placement.
//!
//! Placing an order touches four things: the new order record, the product's
//! inventory, the user's balance and the user's order history. All
//! preconditions are checked first; the writes happen only after every check
//! passed, inside the same reducer call, so no caller ever observes some of
//! them without the others.

use crate::error::{MarketError, MarketResult, Resource};
use crate::state::MarketState;
use crate::types::{ApiKey, Money, Order, OrderStatus, ProductId, UserId};
use chrono::{DateTime, Utc};

/// The order placement workflow
pub struct OrderTransaction;

impl OrderTransaction {
    /// Check every precondition and build the order
    ///
    /// Checks run in this order and stop at the first failure:
    /// 1. key bound, else `Unauthorized`
    /// 2. quantity at least one, else `InvalidQuantity`
    /// 3. user, product and customer account exist, else `NotFound`
    /// 4. `inventory >= quantity`, else `InsufficientInventory`
    /// 5. `balance >= price * quantity`, else `InsufficientFunds`
    ///
    /// # Errors
    ///
    /// The first failing precondition.
    pub fn validate(
        state: &MarketState,
        key: &ApiKey,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
        placed_at: DateTime<Utc>,
    ) -> MarketResult<Order> {
        state.caller(key)?;

        if quantity == 0 {
            return Err(MarketError::InvalidQuantity);
        }

        let user = state.user(user_id)?;
        let product = state
            .products
            .get(&product_id)
            .ok_or(MarketError::NotFound(Resource::Product))?;
        state.account(user_id)?;

        if product.inventory < u64::from(quantity) {
            return Err(MarketError::InsufficientInventory {
                available: product.inventory,
                requested: quantity,
            });
        }

        // An unrepresentable total is more than any balance can hold
        let total = product.price.checked_times(quantity);
        match total {
            Some(total) if user.balance >= total => Ok(Order {
                id: state.ids.peek_order(),
                user: user_id.clone(),
                product: product_id,
                quantity,
                total,
                status: OrderStatus::Pending,
                placed_at,
            }),
            _ => Err(MarketError::InsufficientFunds {
                balance: user.balance,
                required: total.unwrap_or(Money::MAX),
            }),
        }
    }

    /// Perform the four writes of a validated order
    pub fn commit(state: &mut MarketState, order: &Order) {
        state.ids.claim_order(order.id);

        if let Some(product) = state.products.get_mut(&order.product) {
            product.inventory = product.inventory.saturating_sub(u64::from(order.quantity));
        }
        if let Some(user) = state.users.get_mut(&order.user) {
            user.balance = user.balance.saturating_sub(order.total);
        }
        if let Some(account) = state.accounts.get_mut(&order.user) {
            account.record_order(order.id);
        }

        state.orders.put(order.id, order.clone());
    }
}
