//! Marketplace - an in-memory commerce backend
//!
//! Users register with a caller identity and receive an API key. With that
//! key they open stores, list products, manage categories, fund balances,
//! keep customer accounts (wishlist, saved addresses, order history) and
//! place orders.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)          Marketplace facade
//! ┌──────────────┐     ┌──────────────────┐
//! │   handlers   │ ──▶ │  send + wait for │ ──┐
//! └──────────────┘     │  outcome by id   │   │ Execute { request_id, command }
//!                      └──────────────────┘   ▼
//!                                      ┌───────────────┐
//!                                      │ Store runtime │  write lock
//!                                      │  ┌─────────┐  │
//!                                      │  │ reducer │  │  validate → event → apply
//!                                      │  └─────────┘  │
//!                                      └───────────────┘
//!                                             │ Committed / Rejected
//!                                             ▼
//!                          action broadcast (observers, best effort)
//!                          + reply channel of the waiting caller
//! ```
//!
//! # Key Properties
//!
//! ## Atomic multi-entity commands
//!
//! Placing an order writes four things: the order, the product's inventory,
//! the user's balance and the account's order history. The reducer checks
//! every precondition before writing anything and runs under the store's
//! write lock, so readers see either none of the writes or all of them.
//!
//! ```text
//! if inventory < quantity        → InsufficientInventory, nothing changed
//! if balance < price * quantity  → InsufficientFunds, nothing changed
//! otherwise                      → all four writes, one new OrderId
//! ```
//!
//! ## Capability tokens
//!
//! API keys and link tokens are minted from a CSPRNG (see
//! [`environment::SecureTokens`]) and checked for uniqueness before they are
//! bound.

pub mod accounts;
pub mod actions;
pub mod auth;
pub mod config;
pub mod entity_store;
pub mod environment;
pub mod error;
pub mod ids;
pub mod links;
pub mod orders;
pub mod reducer;
pub mod service;
pub mod state;
pub mod types;

#[cfg(feature = "http")]
pub mod handlers;
#[cfg(feature = "http")]
pub mod router;

pub use accounts::CustomerAccountAggregate;
pub use actions::{Command, MarketAction, MarketEvent};
pub use auth::AuthGate;
pub use config::Config;
pub use entity_store::EntityStore;
pub use environment::{MarketEnvironment, SecureTokens, TokenFormat};
pub use error::{MarketError, MarketResult, Resource};
pub use ids::IdGenerator;
pub use links::LinkIndex;
pub use orders::OrderTransaction;
pub use reducer::MarketReducer;
pub use service::{MarketStore, Marketplace};
pub use state::MarketState;
pub use types::{
    ApiKey, Category, CategoryId, CustomerAccount, LinkTarget, LinkToken, Money, NewProduct, Order,
    OrderId, OrderStatus, Product, ProductId, RequestId, Store, StoreId, User, UserId,
};
