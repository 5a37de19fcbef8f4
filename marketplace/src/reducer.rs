//! Marketplace reducer.
//!
//! Each command is validated against the current state and turned into a
//! [`MarketEvent`], which is then applied with [`MarketReducer::apply_event`].
//! Validation never mutates; applying never fails. The outcome (committed
//! event or error) is published back through one `Effect` so the caller that
//! sent the command can pick it up by request id.

use crate::accounts::CustomerAccountAggregate;
use crate::actions::{Command, MarketAction, MarketEvent};
use crate::environment::MarketEnvironment;
use crate::error::{MarketError, MarketResult, Resource};
use crate::ids::mint_unique;
use crate::orders::OrderTransaction;
use crate::state::MarketState;
use crate::types::{
    ApiKey, Category, CategoryId, LinkTarget, LinkToken, Money, NewProduct, Product, Store,
    StoreId, User, UserId,
};
use bazaar_core::effect::Effect;
use bazaar_core::reducer::Reducer;
use bazaar_core::{SmallVec, smallvec};
use bazaar_runtime::metrics::MarketMetrics;

/// Reducer implementing the marketplace rules
#[derive(Clone, Debug, Default)]
pub struct MarketReducer;

impl MarketReducer {
    /// Creates a new marketplace reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies a validated event to state
    ///
    /// Deterministic: replaying the same events over the same starting
    /// state yields the same state.
    pub fn apply_event(state: &mut MarketState, event: &MarketEvent) {
        match event {
            MarketEvent::UserRegistered { user, api_key } => {
                state.auth.bind(user.id.clone(), api_key.clone());
                state.users.put(user.id.clone(), user.clone());
            },
            MarketEvent::StoreCreated { store, link } => {
                state
                    .links
                    .bind(link.clone(), LinkTarget::Store(store.id.clone()));
                state.stores.put(store.id.clone(), store.clone());
            },
            MarketEvent::ProductAdded { product, link } => {
                state.ids.claim_product(product.id);
                state.links.bind(link.clone(), LinkTarget::Product(product.id));
                state.products.put(product.id, product.clone());
            },
            MarketEvent::StoreLinkMinted { store, link } => {
                state.links.bind(link.clone(), LinkTarget::Store(store.clone()));
            },
            MarketEvent::BalanceAdded { user, balance } => {
                if let Some(user) = state.users.get_mut(user) {
                    user.balance = *balance;
                }
            },
            MarketEvent::OrderPlaced { order } => OrderTransaction::commit(state, order),
            MarketEvent::CategoryCreated { category } => {
                state.ids.claim_category(category.id);
                state.categories.put(category.id, category.clone());
            },
            MarketEvent::CategoryUpdated { category } => {
                state.categories.put(category.id, category.clone());
            },
            MarketEvent::CategoryDeleted { id } => {
                state.categories.remove(id);
            },
            MarketEvent::CustomerAccountOpened { .. }
            | MarketEvent::WishlistItemAdded { .. }
            | MarketEvent::AddressSaved { .. } => CustomerAccountAggregate::apply(state, event),
        }
    }

    /// Validates a command and produces the event it would commit
    ///
    /// # Errors
    ///
    /// The first precondition the command fails.
    pub fn validate(
        state: &MarketState,
        command: Command,
        env: &MarketEnvironment,
    ) -> MarketResult<MarketEvent> {
        match command {
            Command::CreateUser { caller_id, name } => {
                Self::validate_create_user(state, caller_id, name, env)
            },
            Command::CreateStore { api_key, name } => {
                Self::validate_create_store(state, &api_key, name, env)
            },
            Command::AddProduct {
                api_key,
                store,
                product,
            } => Self::validate_add_product(state, &api_key, &store, product, env),
            Command::MintStoreLink { api_key, store } => {
                let caller = state.caller(&api_key)?;
                let store = state.owned_store(caller, &store)?;
                Ok(MarketEvent::StoreLinkMinted {
                    store: store.id.clone(),
                    link: Self::mint_link(state, env)?,
                })
            },
            Command::AddUserBalance {
                api_key,
                user,
                amount,
            } => Self::validate_add_balance(state, &api_key, user, amount),
            Command::CreateOrder {
                api_key,
                user,
                product,
                quantity,
            } => {
                let order = OrderTransaction::validate(
                    state,
                    &api_key,
                    &user,
                    product,
                    quantity,
                    env.clock.now(),
                )?;
                Ok(MarketEvent::OrderPlaced { order })
            },
            Command::CreateCategory {
                api_key,
                name,
                description,
            } => {
                state.caller(&api_key)?;
                Ok(MarketEvent::CategoryCreated {
                    category: Category {
                        id: state.ids.peek_category(),
                        name,
                        description,
                    },
                })
            },
            Command::UpdateCategory {
                api_key,
                id,
                name,
                description,
            } => {
                Self::existing_category(state, &api_key, id)?;
                Ok(MarketEvent::CategoryUpdated {
                    category: Category {
                        id,
                        name,
                        description,
                    },
                })
            },
            Command::DeleteCategory { api_key, id } => {
                Self::existing_category(state, &api_key, id)?;
                Ok(MarketEvent::CategoryDeleted { id })
            },
            Command::CreateCustomerAccount { api_key, user } => {
                CustomerAccountAggregate::validate_open(state, &api_key, &user)
            },
            Command::AddToWishlist {
                api_key,
                user,
                product,
            } => CustomerAccountAggregate::validate_wishlist_item(state, &api_key, &user, product),
            Command::AddSavedAddress {
                api_key,
                user,
                address,
            } => CustomerAccountAggregate::validate_address(state, &api_key, &user, address),
        }
    }

    /// Registers a new caller, or rotates the key of a known one
    ///
    /// A returning caller keeps their balance; the name is refreshed and the
    /// previous key stops working.
    fn validate_create_user(
        state: &MarketState,
        caller_id: UserId,
        name: String,
        env: &MarketEnvironment,
    ) -> MarketResult<MarketEvent> {
        if caller_id.as_str().contains(StoreId::SEPARATOR) {
            return Err(MarketError::InvalidName(Resource::User));
        }
        let api_key = ApiKey::new(mint_unique(env.tokens.as_ref(), |token| {
            state.auth.is_bound(token)
        })?);
        let balance = state
            .users
            .get(&caller_id)
            .map_or(Money::ZERO, |user| user.balance);

        Ok(MarketEvent::UserRegistered {
            user: User {
                id: caller_id,
                name,
                balance,
            },
            api_key,
        })
    }

    fn validate_create_store(
        state: &MarketState,
        api_key: &ApiKey,
        name: String,
        env: &MarketEnvironment,
    ) -> MarketResult<MarketEvent> {
        let owner = state.caller(api_key)?;
        let id = StoreId::for_owner(owner, &name)
            .ok_or(MarketError::InvalidName(Resource::Store))?;
        if state.stores.contains(&id) {
            return Err(MarketError::AlreadyExists(Resource::Store));
        }

        Ok(MarketEvent::StoreCreated {
            store: Store {
                id,
                owner: owner.clone(),
                name,
            },
            link: Self::mint_link(state, env)?,
        })
    }

    fn validate_add_product(
        state: &MarketState,
        api_key: &ApiKey,
        store: &StoreId,
        product: NewProduct,
        env: &MarketEnvironment,
    ) -> MarketResult<MarketEvent> {
        let caller = state.caller(api_key)?;
        let store = state.owned_store(caller, store)?;

        Ok(MarketEvent::ProductAdded {
            product: Product::from_new(state.ids.peek_product(), store.id.clone(), product),
            link: Self::mint_link(state, env)?,
        })
    }

    fn validate_add_balance(
        state: &MarketState,
        api_key: &ApiKey,
        user: UserId,
        amount: Money,
    ) -> MarketResult<MarketEvent> {
        state.caller(api_key)?;
        let balance = state
            .user(&user)?
            .balance
            .checked_add(amount)
            .ok_or(MarketError::AmountOverflow)?;

        Ok(MarketEvent::BalanceAdded { user, balance })
    }

    fn existing_category(
        state: &MarketState,
        api_key: &ApiKey,
        id: CategoryId,
    ) -> MarketResult<()> {
        state.caller(api_key)?;
        if !state.categories.contains(&id) {
            return Err(MarketError::NotFound(Resource::Category));
        }
        Ok(())
    }

    fn mint_link(state: &MarketState, env: &MarketEnvironment) -> MarketResult<LinkToken> {
        mint_unique(env.tokens.as_ref(), |token| state.links.contains(token)).map(LinkToken::new)
    }
}

impl Reducer for MarketReducer {
    type State = MarketState;
    type Action = MarketAction;
    type Environment = MarketEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            MarketAction::Execute {
                request_id,
                command,
            } => {
                let command_name = command.name();
                match Self::validate(state, command, env) {
                    Ok(event) => {
                        Self::apply_event(state, &event);
                        tracing::info!(
                            %request_id,
                            command = command_name,
                            event = event.event_type(),
                            "Command committed"
                        );
                        if event.placed_order().is_some() {
                            MarketMetrics::record_order_placed();
                        }
                        smallvec![Effect::emit(MarketAction::Committed { request_id, event })]
                    },
                    Err(error) => {
                        tracing::warn!(
                            %request_id,
                            command = command_name,
                            code = error.code(),
                            "Command rejected: {error}"
                        );
                        MarketMetrics::record_rejection(error.code());
                        smallvec![Effect::emit(MarketAction::Rejected { request_id, error })]
                    },
                }
            },

            // ========== Outcomes ==========
            // Broadcast to callers; nothing left to change
            MarketAction::Committed { .. } | MarketAction::Rejected { .. } => SmallVec::new(),
        }
    }
}
