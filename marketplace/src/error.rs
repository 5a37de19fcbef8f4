//! Error types for marketplace operations.

use crate::types::Money;
use bazaar_runtime::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Entity kinds named in errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resource {
    /// A user
    User,
    /// A store
    Store,
    /// A product
    Product,
    /// A category
    Category,
    /// An order
    Order,
    /// A customer account
    CustomerAccount,
    /// A link token
    Link,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Store => "store",
            Self::Product => "product",
            Self::Category => "category",
            Self::Order => "order",
            Self::CustomerAccount => "customer account",
            Self::Link => "link",
        };
        f.write_str(name)
    }
}

/// Every way a marketplace operation can fail
///
/// Errors are values: a rejected command leaves state untouched and the
/// error travels back to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MarketError {
    /// Referenced entity does not exist, or a link token does not resolve
    #[error("{0} not found")]
    NotFound(Resource),

    /// API key not bound, or the caller does not own the targeted store
    #[error("unauthorized")]
    Unauthorized,

    /// Balance below the order total
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        /// Current balance
        balance: Money,
        /// Amount the order needs (saturated when `price * quantity` overflows)
        required: Money,
    },

    /// Inventory below the requested quantity
    #[error("insufficient inventory: available {available}, requested {requested}")]
    InsufficientInventory {
        /// Units in stock
        available: u64,
        /// Units requested
        requested: u32,
    },

    /// The entity this command would create already exists
    #[error("{0} already exists")]
    AlreadyExists(Resource),

    /// Order quantity must be at least one
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A caller id or store name contains the store id separator `/`
    #[error("{0} name must not contain '/'")]
    InvalidName(Resource),

    /// Balance would exceed the representable maximum
    #[error("amount overflow")]
    AmountOverflow,

    /// The token source kept producing tokens that are already bound
    #[error("could not mint a unique token")]
    TokenCollision,

    /// The service could not process the request (timeout, shutdown)
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl MarketError {
    /// Stable machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InsufficientInventory { .. } => "INSUFFICIENT_INVENTORY",
            Self::AlreadyExists(_) => "CONFLICT",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::TokenCollision => "TOKEN_COLLISION",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Result alias for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_resource() {
        assert_eq!(
            MarketError::NotFound(Resource::CustomerAccount).to_string(),
            "customer account not found"
        );
        assert_eq!(
            MarketError::AlreadyExists(Resource::Store).to_string(),
            "store already exists"
        );
    }

    #[test]
    fn codes_are_distinct_for_conflict_kinds() {
        let funds = MarketError::InsufficientFunds {
            balance: Money::new(1),
            required: Money::new(2),
        };
        let inventory = MarketError::InsufficientInventory {
            available: 1,
            requested: 2,
        };
        assert_eq!(funds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(inventory.code(), "INSUFFICIENT_INVENTORY");
        assert_ne!(MarketError::Unauthorized.code(), MarketError::AlreadyExists(Resource::User).code());
    }

    #[test]
    fn store_errors_become_unavailable() {
        let err = MarketError::from(StoreError::ShutdownInProgress);
        assert!(matches!(err, MarketError::Unavailable(_)));
    }
}
