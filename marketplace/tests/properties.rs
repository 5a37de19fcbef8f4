//! Property tests for pagination and order atomicity.

#![allow(clippy::unwrap_used)]

use bazaar_core::reducer::Reducer;
use bazaar_testing::{SequentialTokens, test_clock};
use marketplace::entity_store::page_bounds;
use marketplace::{
    ApiKey, Command, MarketAction, MarketEnvironment, MarketError, MarketReducer, MarketState,
    Money, NewProduct, ProductId, StoreId, UserId,
};
use proptest::prelude::*;
use std::sync::Arc;

fn env() -> MarketEnvironment {
    MarketEnvironment::new(Arc::new(test_clock()), Arc::new(SequentialTokens::new("p")))
}

fn run(state: &mut MarketState, env: &MarketEnvironment, command: Command) {
    MarketReducer.reduce(state, MarketAction::execute(command), env);
}

/// Alice with key `p-0001`, one product (id 0) and an account.
fn seeded(price: u64, inventory: u64, balance: u64) -> (MarketState, MarketEnvironment) {
    let env = env();
    let mut state = MarketState::new();
    let key = ApiKey::new("p-0001");
    let alice = UserId::new("alice");

    run(
        &mut state,
        &env,
        Command::CreateUser {
            caller_id: alice.clone(),
            name: "Alice".to_string(),
        },
    );
    run(
        &mut state,
        &env,
        Command::CreateStore {
            api_key: key.clone(),
            name: "shop".to_string(),
        },
    );
    run(
        &mut state,
        &env,
        Command::AddProduct {
            api_key: key.clone(),
            store: StoreId::new("alice/shop"),
            product: NewProduct {
                name: "Widget".to_string(),
                price: Money::new(price),
                inventory,
                category: None,
            },
        },
    );
    run(
        &mut state,
        &env,
        Command::CreateCustomerAccount {
            api_key: key.clone(),
            user: alice.clone(),
        },
    );
    run(
        &mut state,
        &env,
        Command::AddUserBalance {
            api_key: key,
            user: alice,
            amount: Money::new(balance),
        },
    );
    (state, env)
}

struct Snapshot {
    inventory: u64,
    balance: Money,
    history: usize,
    orders: usize,
}

fn snapshot(state: &MarketState) -> Snapshot {
    let alice = UserId::new("alice");
    Snapshot {
        inventory: state.products.get(&ProductId::new(0)).unwrap().inventory,
        balance: state.users.get(&alice).unwrap().balance,
        history: state.accounts.get(&alice).unwrap().order_history().len(),
        orders: state.orders.len(),
    }
}

/// Places an order and checks all-or-nothing; returns whether it was rejected.
fn place_and_check(state: &mut MarketState, env: &MarketEnvironment, quantity: u32) -> bool {
    let before = snapshot(state);
    let order = marketplace::OrderTransaction::validate(
        state,
        &ApiKey::new("p-0001"),
        &UserId::new("alice"),
        ProductId::new(0),
        quantity,
        chrono::Utc::now(),
    );
    run(
        state,
        env,
        Command::CreateOrder {
            api_key: ApiKey::new("p-0001"),
            user: UserId::new("alice"),
            product: ProductId::new(0),
            quantity,
        },
    );
    let after = snapshot(state);

    match order {
        Ok(order) => {
            assert_eq!(after.inventory, before.inventory - u64::from(quantity));
            assert_eq!(after.balance, before.balance.saturating_sub(order.total));
            assert_eq!(after.history, before.history + 1);
            assert_eq!(after.orders, before.orders + 1);
            false
        },
        Err(err) => {
            assert!(matches!(
                err,
                MarketError::InvalidQuantity
                    | MarketError::InsufficientInventory { .. }
                    | MarketError::InsufficientFunds { .. }
            ));
            assert_eq!(after.inventory, before.inventory);
            assert_eq!(after.balance, before.balance);
            assert_eq!(after.history, before.history);
            assert_eq!(after.orders, before.orders);
            true
        },
    }
}

proptest! {
    #[test]
    fn page_bounds_stay_inside_the_sequence(start in 0usize..200, limit in 0usize..200, len in 0usize..100) {
        let range = page_bounds(start, limit, len);

        prop_assert!(range.start <= range.end);
        prop_assert!(range.end <= len);
        prop_assert_eq!(range.len(), limit.min(len.saturating_sub(start)));
        if start >= len {
            prop_assert!(range.is_empty());
        }
        if start == 0 && limit >= len {
            prop_assert_eq!(range, 0..len);
        }
    }

    #[test]
    fn orders_apply_all_writes_or_none(
        price in 0u64..1_000,
        inventory in 0u64..20,
        balance in 0u64..5_000,
        quantities in proptest::collection::vec(0u32..8, 1..12),
    ) {
        let (mut state, env) = seeded(price, inventory, balance);

        for quantity in quantities {
            place_and_check(&mut state, &env, quantity);
        }

        let end = snapshot(&state);
        prop_assert!(end.inventory <= inventory);
        prop_assert_eq!(end.history, end.orders);
        let spent: u64 = state.orders.values().map(|o| o.total.amount()).sum();
        prop_assert_eq!(end.balance.amount() + spent, balance);
        let sold: u64 = state.orders.values().map(|o| u64::from(o.quantity)).sum();
        prop_assert_eq!(end.inventory + sold, inventory);
    }

    #[test]
    fn overflowing_totals_are_rejected_as_insufficient_funds(
        price in (u64::MAX / 2)..u64::MAX,
        quantity in 3u32..1_000,
    ) {
        let (mut state, env) = seeded(price, u64::MAX, u64::MAX);

        prop_assert!(place_and_check(&mut state, &env, quantity));
        prop_assert!(state.orders.is_empty());
    }
}
