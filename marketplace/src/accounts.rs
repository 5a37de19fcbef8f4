//! Customer accounts: wishlist, saved addresses and order history.
//!
//! Each list is push-to-front and reads most-recent-first. Nothing is
//! deduplicated and wished products are not checked for existence.

use crate::actions::MarketEvent;
use crate::error::{MarketError, MarketResult, Resource};
use crate::state::MarketState;
use crate::types::{ApiKey, CustomerAccount, OrderId, ProductId, UserId};
use std::collections::VecDeque;

impl CustomerAccount {
    /// A fresh account with empty lists
    #[must_use]
    pub const fn open(user: UserId) -> Self {
        Self {
            user,
            wishlist: VecDeque::new(),
            saved_addresses: VecDeque::new(),
            order_history: VecDeque::new(),
        }
    }

    /// Push a product to the front of the wishlist
    pub fn add_to_wishlist(&mut self, product: ProductId) {
        self.wishlist.push_front(product);
    }

    /// Push an address to the front of the saved addresses
    pub fn save_address(&mut self, address: String) {
        self.saved_addresses.push_front(address);
    }

    /// Push an order to the front of the order history
    pub fn record_order(&mut self, order: OrderId) {
        self.order_history.push_front(order);
    }

    /// Wishlist, most recent first
    #[must_use]
    pub fn wishlist(&self) -> Vec<ProductId> {
        self.wishlist.iter().copied().collect()
    }

    /// Saved addresses, most recent first
    #[must_use]
    pub fn saved_addresses(&self) -> Vec<String> {
        self.saved_addresses.iter().cloned().collect()
    }

    /// Order history, most recent first
    #[must_use]
    pub fn order_history(&self) -> Vec<OrderId> {
        self.order_history.iter().copied().collect()
    }
}

/// Commands over customer accounts
///
/// Exactly one account per user; every list operation needs the account.
pub struct CustomerAccountAggregate;

impl CustomerAccountAggregate {
    /// Validate opening an account for `user`
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound(User)` or `AlreadyExists(CustomerAccount)`.
    pub fn validate_open(
        state: &MarketState,
        key: &ApiKey,
        user: &UserId,
    ) -> MarketResult<MarketEvent> {
        state.caller(key)?;
        state.user(user)?;
        if state.accounts.contains(user) {
            return Err(MarketError::AlreadyExists(Resource::CustomerAccount));
        }
        Ok(MarketEvent::CustomerAccountOpened { user: user.clone() })
    }

    /// Validate adding a wishlist item
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    pub fn validate_wishlist_item(
        state: &MarketState,
        key: &ApiKey,
        user: &UserId,
        product: ProductId,
    ) -> MarketResult<MarketEvent> {
        state.caller(key)?;
        state.account(user)?;
        Ok(MarketEvent::WishlistItemAdded {
            user: user.clone(),
            product,
        })
    }

    /// Validate saving an address
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    pub fn validate_address(
        state: &MarketState,
        key: &ApiKey,
        user: &UserId,
        address: String,
    ) -> MarketResult<MarketEvent> {
        state.caller(key)?;
        state.account(user)?;
        Ok(MarketEvent::AddressSaved {
            user: user.clone(),
            address,
        })
    }

    /// Apply an account event
    ///
    /// Events for accounts that do not exist are ignored; validation rules
    /// them out.
    pub fn apply(state: &mut MarketState, event: &MarketEvent) {
        match event {
            MarketEvent::CustomerAccountOpened { user } => {
                state
                    .accounts
                    .put(user.clone(), CustomerAccount::open(user.clone()));
            },
            MarketEvent::WishlistItemAdded { user, product } => {
                if let Some(account) = state.accounts.get_mut(user) {
                    account.add_to_wishlist(*product);
                }
            },
            MarketEvent::AddressSaved { user, address } => {
                if let Some(account) = state.accounts.get_mut(user) {
                    account.save_address(address.clone());
                }
            },
            _ => {},
        }
    }
}
