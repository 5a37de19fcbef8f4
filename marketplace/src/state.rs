//! The marketplace aggregate and its read operations.
//!
//! Every read takes the caller's key first and performs validate-then-resolve
//! before looking at any entity. The runtime runs these under the store's
//! read lock, so a read always sees one consistent snapshot.

use crate::auth::AuthGate;
use crate::entity_store::{EntityStore, page_bounds};
use crate::error::{MarketError, MarketResult, Resource};
use crate::ids::IdGenerator;
use crate::links::LinkIndex;
use crate::types::{
    ApiKey, Category, CategoryId, CustomerAccount, LinkTarget, LinkToken, Order, OrderId,
    Product, ProductId, Store, StoreId, User, UserId,
};

/// All marketplace state
///
/// Owned by the store runtime; mutated only by the reducer.
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    /// Users by caller identity
    pub users: EntityStore<UserId, User>,
    /// Stores by derived id
    pub stores: EntityStore<StoreId, Store>,
    /// Products by id
    pub products: EntityStore<ProductId, Product>,
    /// Categories by id
    pub categories: EntityStore<CategoryId, Category>,
    /// Orders by id
    pub orders: EntityStore<OrderId, Order>,
    /// Customer accounts by owning user
    pub accounts: EntityStore<UserId, CustomerAccount>,
    /// API key bindings
    pub auth: AuthGate,
    /// Link tokens
    pub links: LinkIndex,
    /// Id counters
    pub ids: IdGenerator,
}

impl MarketState {
    /// Creates an empty marketplace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Building blocks ==========

    /// Validate `key` and resolve the calling user
    ///
    /// # Errors
    ///
    /// [`MarketError::Unauthorized`] if the key is not bound.
    pub fn caller(&self, key: &ApiKey) -> MarketResult<&UserId> {
        if !self.auth.validate(key) {
            return Err(MarketError::Unauthorized);
        }
        self.auth.resolve_owner(key)
    }

    /// A user that must exist
    ///
    /// # Errors
    ///
    /// [`MarketError::NotFound`] if there is no such user.
    pub fn user(&self, id: &UserId) -> MarketResult<&User> {
        self.users.get(id).ok_or(MarketError::NotFound(Resource::User))
    }

    /// A customer account that must exist
    ///
    /// # Errors
    ///
    /// [`MarketError::NotFound`] if the user has no account.
    pub fn account(&self, user: &UserId) -> MarketResult<&CustomerAccount> {
        self.accounts
            .get(user)
            .ok_or(MarketError::NotFound(Resource::CustomerAccount))
    }

    /// A store the caller owns
    ///
    /// Ownership is decided before existence: a store id outside the
    /// caller's namespace is `Unauthorized` whether or not it exists.
    ///
    /// # Errors
    ///
    /// [`MarketError::Unauthorized`] for someone else's store,
    /// [`MarketError::NotFound`] for a missing store of the caller's own.
    pub fn owned_store(&self, caller: &UserId, id: &StoreId) -> MarketResult<&Store> {
        match self.stores.get(id) {
            Some(store) if &store.owner == caller => Ok(store),
            Some(_) => Err(MarketError::Unauthorized),
            None if id.is_namespaced_to(caller) => Err(MarketError::NotFound(Resource::Store)),
            None => Err(MarketError::Unauthorized),
        }
    }

    /// A product in a store the caller owns (the ownership chain)
    ///
    /// # Errors
    ///
    /// As [`owned_store`](Self::owned_store), plus [`MarketError::NotFound`]
    /// when the product is missing or belongs to another store.
    pub fn owned_product(
        &self,
        caller: &UserId,
        store: &StoreId,
        id: ProductId,
    ) -> MarketResult<&Product> {
        let store = self.owned_store(caller, store)?;
        self.products
            .get(&id)
            .filter(|product| product.store == store.id)
            .ok_or(MarketError::NotFound(Resource::Product))
    }

    // ========== Reads ==========

    /// The caller's own profile and balance
    ///
    /// # Errors
    ///
    /// `Unauthorized` for an unbound key.
    pub fn get_user(&self, key: &ApiKey) -> MarketResult<&User> {
        let caller = self.caller(key)?;
        self.user(caller)
    }

    /// A product by id, through the ownership chain
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound`.
    pub fn get_product(
        &self,
        key: &ApiKey,
        store: &StoreId,
        id: ProductId,
    ) -> MarketResult<&Product> {
        let caller = self.caller(key)?;
        self.owned_product(caller, store, id)
    }

    /// A product by link token, through the ownership chain
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `NotFound` when the token does not resolve to a
    /// product of `store`.
    pub fn get_product_by_link(
        &self,
        key: &ApiKey,
        store: &StoreId,
        token: &LinkToken,
    ) -> MarketResult<&Product> {
        let caller = self.caller(key)?;
        self.owned_store(caller, store)?;
        match self.links.resolve(token) {
            Some(LinkTarget::Product(id)) => self.owned_product(caller, store, *id),
            _ => Err(MarketError::NotFound(Resource::Link)),
        }
    }

    /// One page of a store's products, in id order
    ///
    /// Scans every product of every store and filters by `store`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Store)`.
    pub fn list_products(
        &self,
        key: &ApiKey,
        store: &StoreId,
        start: usize,
        limit: usize,
    ) -> MarketResult<Vec<&Product>> {
        let caller = self.caller(key)?;
        let store = self.owned_store(caller, store)?;
        let filtered: Vec<&Product> = self
            .products
            .values()
            .filter(|product| product.store == store.id)
            .collect();
        let range = page_bounds(start, limit, filtered.len());
        Ok(filtered[range].to_vec())
    }

    /// First link token of a product, in index order
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `NotFound` for a missing product or link.
    pub fn get_product_link(
        &self,
        key: &ApiKey,
        store: &StoreId,
        id: ProductId,
    ) -> MarketResult<&LinkToken> {
        let caller = self.caller(key)?;
        let product = self.owned_product(caller, store, id)?;
        self.links
            .first_for_product(product.id)
            .ok_or(MarketError::NotFound(Resource::Link))
    }

    /// A store by link token; the caller must own it
    ///
    /// # Errors
    ///
    /// `NotFound(Link)` for a token that does not name a store,
    /// `Unauthorized` for someone else's store.
    pub fn get_store_by_link(&self, key: &ApiKey, token: &LinkToken) -> MarketResult<&Store> {
        let caller = self.caller(key)?;
        match self.links.resolve(token) {
            Some(LinkTarget::Store(id)) => self.owned_store(caller, id),
            _ => Err(MarketError::NotFound(Resource::Link)),
        }
    }

    /// Stores owned by the caller, in id order
    ///
    /// # Errors
    ///
    /// `Unauthorized` for an unbound key.
    pub fn list_stores(&self, key: &ApiKey) -> MarketResult<Vec<&Store>> {
        let caller = self.caller(key)?;
        Ok(self
            .stores
            .values()
            .filter(|store| &store.owner == caller)
            .collect())
    }

    /// An order by id
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Order)`.
    pub fn get_order(&self, key: &ApiKey, id: OrderId) -> MarketResult<&Order> {
        self.caller(key)?;
        self.orders
            .get(&id)
            .ok_or(MarketError::NotFound(Resource::Order))
    }

    /// A category by id
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Category)`.
    pub fn get_category(&self, key: &ApiKey, id: CategoryId) -> MarketResult<&Category> {
        self.caller(key)?;
        self.categories
            .get(&id)
            .ok_or(MarketError::NotFound(Resource::Category))
    }

    /// Every category, in id order
    ///
    /// # Errors
    ///
    /// `Unauthorized` for an unbound key.
    pub fn list_categories(&self, key: &ApiKey) -> MarketResult<Vec<&Category>> {
        self.caller(key)?;
        Ok(self.categories.values().collect())
    }

    /// A user's customer account
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    pub fn get_customer_account(
        &self,
        key: &ApiKey,
        user: &UserId,
    ) -> MarketResult<&CustomerAccount> {
        self.caller(key)?;
        self.account(user)
    }

    /// Wishlist, most recent first
    ///
    /// # Errors
    ///
    /// As [`get_customer_account`](Self::get_customer_account).
    pub fn get_wishlist(&self, key: &ApiKey, user: &UserId) -> MarketResult<Vec<ProductId>> {
        Ok(self.get_customer_account(key, user)?.wishlist())
    }

    /// Saved addresses, most recent first
    ///
    /// # Errors
    ///
    /// As [`get_customer_account`](Self::get_customer_account).
    pub fn get_saved_addresses(&self, key: &ApiKey, user: &UserId) -> MarketResult<Vec<String>> {
        Ok(self.get_customer_account(key, user)?.saved_addresses())
    }

    /// Order history, most recent first
    ///
    /// # Errors
    ///
    /// As [`get_customer_account`](Self::get_customer_account).
    pub fn get_order_history(&self, key: &ApiKey, user: &UserId) -> MarketResult<Vec<OrderId>> {
        Ok(self.get_customer_account(key, user)?.order_history())
    }
}
