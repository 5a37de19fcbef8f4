//! Request/response facade over the marketplace store.
//!
//! Commands go through the reducer: each one is tagged with a fresh
//! [`RequestId`] and the facade waits for the matching outcome on the reply
//! channel the store keeps for that request. Reads run as closures under the store's read lock and return
//! owned clones.

use crate::actions::{Command, MarketAction, MarketEvent};
use crate::environment::MarketEnvironment;
use crate::error::{MarketError, MarketResult};
use crate::reducer::MarketReducer;
use crate::state::MarketState;
use crate::types::{
    ApiKey, Category, CategoryId, CustomerAccount, LinkToken, Money, NewProduct, Order, OrderId,
    Product, ProductId, RequestId, Store, StoreId, User, UserId,
};
use bazaar_runtime::metrics::MarketMetrics;
use bazaar_runtime::{HealthCheck, Store as Runtime, StoreConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Store runtime specialised to the marketplace
pub type MarketStore = Runtime<MarketState, MarketAction, MarketEnvironment, MarketReducer>;

/// Default time a caller waits for a command outcome
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The marketplace service
///
/// Cheap to clone; every clone drives the same store.
#[derive(Clone)]
pub struct Marketplace {
    store: Arc<MarketStore>,
    request_timeout: Duration,
}

impl Marketplace {
    /// Creates an empty marketplace with default store settings
    #[must_use]
    pub fn new(env: MarketEnvironment) -> Self {
        Self::with_config(env, StoreConfig::default(), DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates an empty marketplace with explicit store settings
    #[must_use]
    pub fn with_config(
        env: MarketEnvironment,
        config: StoreConfig,
        request_timeout: Duration,
    ) -> Self {
        let store = Runtime::with_config(MarketState::new(), MarketReducer::new(), env, config);
        Self {
            store: Arc::new(store),
            request_timeout,
        }
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<MarketStore> {
        &self.store
    }

    /// Health of the underlying store
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        self.store.health()
    }

    /// Stops accepting commands and waits for in-flight outcomes
    ///
    /// # Errors
    ///
    /// `Unavailable` if effects are still running when `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> MarketResult<()> {
        self.store.shutdown(timeout).await.map_err(MarketError::from)
    }

    async fn execute(&self, command: Command) -> MarketResult<MarketEvent> {
        let started = Instant::now();
        let action = MarketAction::execute(command);
        let request_id = action.request_id();
        tracing::debug!(%request_id, "Dispatching command");

        let outcome = self
            .store
            .send_and_wait_for(
                action,
                move |action| action.is_outcome_of(request_id),
                self.request_timeout,
            )
            .await;
        MarketMetrics::record_command(started.elapsed());

        match outcome? {
            MarketAction::Committed { event, .. } => Ok(event),
            MarketAction::Rejected { error, .. } => Err(error),
            MarketAction::Execute { .. } => Err(MarketError::Unavailable(format!(
                "request {request_id} produced no outcome"
            ))),
        }
    }

    async fn read<T, F>(&self, f: F) -> MarketResult<T>
    where
        F: FnOnce(&MarketState) -> MarketResult<T>,
    {
        self.store.state(f).await
    }

    // ========== Users ==========

    /// Registers `caller_id` and returns a fresh API key
    ///
    /// Calling again for a known caller rotates the key.
    ///
    /// # Errors
    ///
    /// `InvalidName(User)` if `caller_id` contains `/`, `TokenCollision` or
    /// `Unavailable`.
    #[tracing::instrument(skip(self, name))]
    pub async fn create_user(&self, caller_id: UserId, name: String) -> MarketResult<ApiKey> {
        match self.execute(Command::CreateUser { caller_id, name }).await? {
            MarketEvent::UserRegistered { api_key, .. } => Ok(api_key),
            other => Err(unexpected(&other)),
        }
    }

    /// The caller's own profile
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    pub async fn get_user(&self, api_key: &ApiKey) -> MarketResult<User> {
        self.read(|state| state.get_user(api_key).cloned()).await
    }

    /// Credits `amount` to a user's balance
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound(User)` or `AmountOverflow`.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn add_user_balance(
        &self,
        api_key: ApiKey,
        user: UserId,
        amount: Money,
    ) -> MarketResult<Money> {
        match self
            .execute(Command::AddUserBalance {
                api_key,
                user,
                amount,
            })
            .await?
        {
            MarketEvent::BalanceAdded { balance, .. } => Ok(balance),
            other => Err(unexpected(&other)),
        }
    }

    // ========== Stores ==========

    /// Creates a store owned by the caller
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidName(Store)` if `name` contains `/`, or
    /// `AlreadyExists(Store)`.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn create_store(
        &self,
        api_key: ApiKey,
        name: String,
    ) -> MarketResult<(StoreId, LinkToken)> {
        match self.execute(Command::CreateStore { api_key, name }).await? {
            MarketEvent::StoreCreated { store, link } => Ok((store.id, link)),
            other => Err(unexpected(&other)),
        }
    }

    /// Mints an additional link token for one of the caller's stores
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Store)`.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn get_store_link(&self, api_key: ApiKey, store: StoreId) -> MarketResult<LinkToken> {
        match self.execute(Command::MintStoreLink { api_key, store }).await? {
            MarketEvent::StoreLinkMinted { link, .. } => Ok(link),
            other => Err(unexpected(&other)),
        }
    }

    /// Resolves a store link token
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Link)`.
    pub async fn get_store_by_link(&self, api_key: &ApiKey, token: &LinkToken) -> MarketResult<Store> {
        self.read(|state| state.get_store_by_link(api_key, token).cloned())
            .await
    }

    /// The caller's stores
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    pub async fn list_stores(&self, api_key: &ApiKey) -> MarketResult<Vec<Store>> {
        self.read(|state| Ok(state.list_stores(api_key)?.into_iter().cloned().collect()))
            .await
    }

    // ========== Products ==========

    /// Adds a product to one of the caller's stores
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Store)`.
    #[tracing::instrument(skip(self, api_key, product))]
    pub async fn add_product(
        &self,
        api_key: ApiKey,
        store: StoreId,
        product: NewProduct,
    ) -> MarketResult<(ProductId, LinkToken)> {
        match self
            .execute(Command::AddProduct {
                api_key,
                store,
                product,
            })
            .await?
        {
            MarketEvent::ProductAdded { product, link } => Ok((product.id, link)),
            other => Err(unexpected(&other)),
        }
    }

    /// A product by id
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound`.
    pub async fn get_product(
        &self,
        api_key: &ApiKey,
        store: &StoreId,
        id: ProductId,
    ) -> MarketResult<Product> {
        self.read(|state| state.get_product(api_key, store, id).cloned())
            .await
    }

    /// A product by link token
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound`.
    pub async fn get_product_by_link(
        &self,
        api_key: &ApiKey,
        store: &StoreId,
        token: &LinkToken,
    ) -> MarketResult<Product> {
        self.read(|state| state.get_product_by_link(api_key, store, token).cloned())
            .await
    }

    /// One page of a store's products
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Store)`.
    pub async fn list_products(
        &self,
        api_key: &ApiKey,
        store: &StoreId,
        start: usize,
        limit: usize,
    ) -> MarketResult<Vec<Product>> {
        self.read(|state| {
            Ok(state
                .list_products(api_key, store, start, limit)?
                .into_iter()
                .cloned()
                .collect())
        })
        .await
    }

    /// The product's first link token
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound`.
    pub async fn get_product_link(
        &self,
        api_key: &ApiKey,
        store: &StoreId,
        id: ProductId,
    ) -> MarketResult<LinkToken> {
        self.read(|state| state.get_product_link(api_key, store, id).cloned())
            .await
    }

    // ========== Orders ==========

    /// Places an order
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidQuantity`, `NotFound`, `InsufficientInventory`
    /// or `InsufficientFunds`; on any of them nothing changed.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn create_order(
        &self,
        api_key: ApiKey,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> MarketResult<OrderId> {
        match self
            .execute(Command::CreateOrder {
                api_key,
                user,
                product,
                quantity,
            })
            .await?
        {
            MarketEvent::OrderPlaced { order } => Ok(order.id),
            other => Err(unexpected(&other)),
        }
    }

    /// An order by id
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Order)`.
    pub async fn get_order(&self, api_key: &ApiKey, id: OrderId) -> MarketResult<Order> {
        self.read(|state| state.get_order(api_key, id).cloned()).await
    }

    // ========== Categories ==========

    /// Creates a category
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    #[tracing::instrument(skip(self, api_key, description))]
    pub async fn create_category(
        &self,
        api_key: ApiKey,
        name: String,
        description: String,
    ) -> MarketResult<CategoryId> {
        match self
            .execute(Command::CreateCategory {
                api_key,
                name,
                description,
            })
            .await?
        {
            MarketEvent::CategoryCreated { category } => Ok(category.id),
            other => Err(unexpected(&other)),
        }
    }

    /// Replaces a category's name and description
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Category)`.
    #[tracing::instrument(skip(self, api_key, description))]
    pub async fn update_category(
        &self,
        api_key: ApiKey,
        id: CategoryId,
        name: String,
        description: String,
    ) -> MarketResult<Category> {
        match self
            .execute(Command::UpdateCategory {
                api_key,
                id,
                name,
                description,
            })
            .await?
        {
            MarketEvent::CategoryUpdated { category } => Ok(category),
            other => Err(unexpected(&other)),
        }
    }

    /// Deletes a category; its id is never reused
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Category)`.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn delete_category(&self, api_key: ApiKey, id: CategoryId) -> MarketResult<()> {
        match self.execute(Command::DeleteCategory { api_key, id }).await? {
            MarketEvent::CategoryDeleted { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// A category by id
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(Category)`.
    pub async fn get_category(&self, api_key: &ApiKey, id: CategoryId) -> MarketResult<Category> {
        self.read(|state| state.get_category(api_key, id).cloned())
            .await
    }

    /// Every category
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    pub async fn list_categories(&self, api_key: &ApiKey) -> MarketResult<Vec<Category>> {
        self.read(|state| Ok(state.list_categories(api_key)?.into_iter().cloned().collect()))
            .await
    }

    // ========== Customer accounts ==========

    /// Opens the customer account of `user`
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound(User)` or `AlreadyExists(CustomerAccount)`.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn create_customer_account(&self, api_key: ApiKey, user: UserId) -> MarketResult<()> {
        match self
            .execute(Command::CreateCustomerAccount { api_key, user })
            .await?
        {
            MarketEvent::CustomerAccountOpened { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Pushes a product to the front of the wishlist
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn add_to_wishlist(
        &self,
        api_key: ApiKey,
        user: UserId,
        product: ProductId,
    ) -> MarketResult<()> {
        match self
            .execute(Command::AddToWishlist {
                api_key,
                user,
                product,
            })
            .await?
        {
            MarketEvent::WishlistItemAdded { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Pushes an address to the front of the saved addresses
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    #[tracing::instrument(skip(self, api_key, address))]
    pub async fn add_saved_address(
        &self,
        api_key: ApiKey,
        user: UserId,
        address: String,
    ) -> MarketResult<()> {
        match self
            .execute(Command::AddSavedAddress {
                api_key,
                user,
                address,
            })
            .await?
        {
            MarketEvent::AddressSaved { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// A user's customer account
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    pub async fn get_customer_account(
        &self,
        api_key: &ApiKey,
        user: &UserId,
    ) -> MarketResult<CustomerAccount> {
        self.read(|state| state.get_customer_account(api_key, user).cloned())
            .await
    }

    /// Wishlist, most recent first
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    pub async fn get_wishlist(&self, api_key: &ApiKey, user: &UserId) -> MarketResult<Vec<ProductId>> {
        self.read(|state| state.get_wishlist(api_key, user)).await
    }

    /// Saved addresses, most recent first
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    pub async fn get_saved_addresses(
        &self,
        api_key: &ApiKey,
        user: &UserId,
    ) -> MarketResult<Vec<String>> {
        self.read(|state| state.get_saved_addresses(api_key, user))
            .await
    }

    /// Order history, most recent first
    ///
    /// # Errors
    ///
    /// `Unauthorized` or `NotFound(CustomerAccount)`.
    pub async fn get_order_history(
        &self,
        api_key: &ApiKey,
        user: &UserId,
    ) -> MarketResult<Vec<OrderId>> {
        self.read(|state| state.get_order_history(api_key, user))
            .await
    }
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn unexpected(event: &MarketEvent) -> MarketError {
    tracing::error!(event = event.event_type(), "Command committed an unexpected event");
    MarketError::Unavailable(format!("unexpected outcome {}", event.event_type()))
}
