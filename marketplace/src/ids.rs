//! Id allocation and token minting.
//!
//! Integer ids come from three independent counters. Tokens (API keys, link
//! tokens) come from the injected [`TokenSource`]; this module only makes
//! sure a fresh token is not already bound.

use crate::error::MarketError;
use crate::types::{CategoryId, OrderId, ProductId};
use bazaar_core::environment::TokenSource;

/// How many times minting is retried before giving up
pub const MAX_MINT_ATTEMPTS: usize = 8;

/// Monotonic per-kind id counters
///
/// Validation peeks at the next id; only applying a committed event claims
/// it, so a rejected command never consumes an id.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next_product: u64,
    next_order: u64,
    next_category: u64,
}

impl IdGenerator {
    /// Counters starting at zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_product: 0,
            next_order: 0,
            next_category: 0,
        }
    }

    /// Id the next product will get
    #[must_use]
    pub const fn peek_product(&self) -> ProductId {
        ProductId::new(self.next_product)
    }

    /// Id the next order will get
    #[must_use]
    pub const fn peek_order(&self) -> OrderId {
        OrderId::new(self.next_order)
    }

    /// Id the next category will get
    #[must_use]
    pub const fn peek_category(&self) -> CategoryId {
        CategoryId::new(self.next_category)
    }

    /// Marks `id` as used
    pub fn claim_product(&mut self, id: ProductId) {
        self.next_product = self.next_product.max(id.value().saturating_add(1));
    }

    /// Marks `id` as used
    pub fn claim_order(&mut self, id: OrderId) {
        self.next_order = self.next_order.max(id.value().saturating_add(1));
    }

    /// Marks `id` as used
    pub fn claim_category(&mut self, id: CategoryId) {
        self.next_category = self.next_category.max(id.value().saturating_add(1));
    }
}

/// Mint a token that `is_taken` does not already know
///
/// # Errors
///
/// Returns [`MarketError::TokenCollision`] when every attempt collides.
pub fn mint_unique(
    tokens: &dyn TokenSource,
    is_taken: impl Fn(&str) -> bool,
) -> Result<String, MarketError> {
    for attempt in 1..=MAX_MINT_ATTEMPTS {
        let token = tokens.mint();
        if !is_taken(&token) {
            return Ok(token);
        }
        tracing::warn!(attempt, "Minted token already bound, retrying");
    }
    Err(MarketError::TokenCollision)
}
