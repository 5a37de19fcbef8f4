//! Secondary index from opaque link tokens to stores and products.

use crate::types::{LinkTarget, LinkToken, ProductId};
use std::collections::BTreeMap;

/// Token → target index
///
/// Many tokens may alias one target and none is ever removed, so repeated
/// link requests grow the index without bound. Iteration order is
/// lexicographic by token.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    entries: BTreeMap<LinkToken, LinkTarget>,
}

impl LinkIndex {
    /// Creates an empty index
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Binds `token` to `target`
    ///
    /// Callers mint tokens with a uniqueness check first; rebinding an
    /// existing token replaces its target.
    pub fn bind(&mut self, token: LinkToken, target: LinkTarget) {
        self.entries.insert(token, target);
    }

    /// Resolves a token
    #[must_use]
    pub fn resolve(&self, token: &LinkToken) -> Option<&LinkTarget> {
        self.entries.get(token)
    }

    /// Whether `token` is bound
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(&LinkToken::new(token))
    }

    /// First token (in index order) pointing at `product`
    ///
    /// Linear scan over the whole index.
    #[must_use]
    pub fn first_for_product(&self, product: ProductId) -> Option<&LinkToken> {
        self.entries
            .iter()
            .find(|(_, target)| **target == LinkTarget::Product(product))
            .map(|(token, _)| token)
    }

    /// Number of live tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no token is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
