//! Domain types for the marketplace.
//!
//! Identifiers are newtypes so a product id can never be passed where an
//! order id is expected. Entities are plain data; the rules that change them
//! live in the reducer and its validators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Caller identity handed to us by the upstream identity provider
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from the upstream caller identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store identifier, derived from the owner and the store name
///
/// Neither part may contain [`StoreId::SEPARATOR`], so every id splits back
/// into exactly one owner and one name. Two stores with the same owner and
/// name would share an id, so creation of the second one is refused.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    /// Joins owner and store name
    pub const SEPARATOR: char = '/';

    /// Wraps an existing store id (e.g. from a request path)
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the id of the store `name` owned by `owner`
    ///
    /// Returns `None` when either part contains the separator.
    #[must_use]
    pub fn for_owner(owner: &UserId, name: &str) -> Option<Self> {
        if owner.as_str().contains(Self::SEPARATOR) || name.contains(Self::SEPARATOR) {
            return None;
        }
        Some(Self(format!("{owner}{}{name}", Self::SEPARATOR)))
    }

    /// Whether this id names a store `user` could own
    ///
    /// `"alice/shop"` is in alice's namespace; `"alice/b/shop"` is in nobody's.
    #[must_use]
    pub fn is_namespaced_to(&self, user: &UserId) -> bool {
        self.0
            .strip_prefix(user.as_str())
            .and_then(|rest| rest.strip_prefix(Self::SEPARATOR))
            .is_some_and(|name| !name.contains(Self::SEPARATOR))
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw id
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw id
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

sequential_id!(
    /// Product identifier, allocated in creation order starting at 0
    ProductId
);
sequential_id!(
    /// Order identifier, allocated in creation order starting at 0
    OrderId
);
sequential_id!(
    /// Category identifier, allocated in creation order starting at 0
    CategoryId
);

/// Bearer credential bound to exactly one user
///
/// The `Debug` output never contains the key itself.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a presented key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Opaque token addressing a store or a product
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkToken(String);

impl LinkToken {
    /// Wraps a token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LinkToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlates a command with its outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative amount of currency in the smallest unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// The zero amount
    pub const ZERO: Self = Self(0);

    /// Largest representable amount
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an amount
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Returns the raw amount
    #[must_use]
    pub const fn amount(self) -> u64 {
        self.0
    }

    /// Adds two amounts, `None` on overflow
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Subtracts, flooring at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiplies a unit price by a quantity, `None` on overflow
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(u64::from(quantity)).map(Self)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Caller identity
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Spendable balance
    pub balance: Money,
}

/// A store owned by one user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Derived identifier (`owner/name`)
    pub id: StoreId,
    /// Owning user
    pub owner: UserId,
    /// Store name
    pub name: String,
}

/// Input for adding a product to a store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Units in stock
    pub inventory: u64,
    /// Optional category (not checked for existence)
    #[serde(default)]
    pub category: Option<CategoryId>,
}

/// A product listed in a store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Owning store, fixed for the product's lifetime
    pub store: StoreId,
    /// Product name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Units in stock
    pub inventory: u64,
    /// Optional category
    pub category: Option<CategoryId>,
}

impl Product {
    /// Builds the product record for a new listing
    #[must_use]
    pub fn from_new(id: ProductId, store: StoreId, new: NewProduct) -> Self {
        Self {
            id,
            store,
            name: new.name,
            price: new.price,
            inventory: new.inventory,
            category: new.category,
        }
    }
}

/// A product category, shared across stores
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier
    pub id: CategoryId,
    /// Category name
    pub name: String,
    /// Free-form description
    pub description: String,
}

/// Order status
///
/// Orders are written once as `Pending`; no transitions exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order recorded, payment taken, inventory reserved
    Pending,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
        }
    }
}

/// A placed order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Paying user
    pub user: UserId,
    /// Ordered product
    pub product: ProductId,
    /// Units ordered
    pub quantity: u32,
    /// Amount charged (`price * quantity`)
    pub total: Money,
    /// Current status
    pub status: OrderStatus,
    /// When the order was committed
    pub placed_at: DateTime<Utc>,
}

/// Per-user shopping lists
///
/// Every list reads most-recent-first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAccount {
    /// Owning user
    pub user: UserId,
    /// Wished products, newest first (duplicates allowed)
    pub wishlist: VecDeque<ProductId>,
    /// Saved addresses, newest first
    pub saved_addresses: VecDeque<String>,
    /// Orders placed for this user, newest first
    pub order_history: VecDeque<OrderId>,
}

/// What a link token points at
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    /// A store
    Store(StoreId),
    /// A product
    Product(ProductId),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn store_id_is_owner_slash_name() {
        let owner = UserId::new("alice");
        let id = StoreId::for_owner(&owner, "books").unwrap();
        assert_eq!(id.as_str(), "alice/books");
        assert!(id.is_namespaced_to(&owner));
        assert!(!id.is_namespaced_to(&UserId::new("ali")));
    }

    #[test]
    fn store_id_parts_cannot_contain_the_separator() {
        assert_eq!(StoreId::for_owner(&UserId::new("a/b"), "c"), None);
        assert_eq!(StoreId::for_owner(&UserId::new("a"), "b/c"), None);

        let alice = UserId::new("alice");
        assert!(!StoreId::new("alice/b/missing").is_namespaced_to(&alice));
        assert!(!StoreId::new("alice/").is_namespaced_to(&UserId::new("alice/")));
    }

    #[test]
    fn money_multiplication_detects_overflow() {
        assert_eq!(Money::new(10).checked_times(3), Some(Money::new(30)));
        assert_eq!(Money::MAX.checked_times(2), None);
        assert_eq!(Money::new(5).saturating_sub(Money::new(9)), Money::ZERO);
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert!(!format!("{key:?}").contains("super-secret"));
    }

    #[test]
    fn order_status_displays_pending() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
    }
}
