//! Integration tests for the `Marketplace` facade.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bazaar_runtime::StoreConfig;
use bazaar_testing::{ConstantToken, SequentialTokens, init_test_tracing, test_clock};
use marketplace::{
    ApiKey, MarketEnvironment, MarketError, Marketplace, Money, NewProduct, OrderStatus,
    ProductId, Resource, StoreId, UserId,
};
use std::sync::Arc;
use std::time::Duration;

fn market() -> Marketplace {
    init_test_tracing();
    Marketplace::new(MarketEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(SequentialTokens::new("tok")),
    ))
}

fn lamp(price: u64, inventory: u64) -> NewProduct {
    NewProduct {
        name: "Lamp".to_string(),
        price: Money::new(price),
        inventory,
        category: None,
    }
}

/// A registered user with one store, one product, an account and a balance.
struct Shop {
    market: Marketplace,
    key: ApiKey,
    user: UserId,
    store: StoreId,
    product: ProductId,
}

async fn shop(price: u64, inventory: u64, balance: u64) -> Shop {
    let market = market();
    let user = UserId::new("alice");
    let key = market
        .create_user(user.clone(), "Alice".to_string())
        .await
        .unwrap();
    let (store, _) = market
        .create_store(key.clone(), "shop".to_string())
        .await
        .unwrap();
    let (product, _) = market
        .add_product(key.clone(), store.clone(), lamp(price, inventory))
        .await
        .unwrap();
    market
        .create_customer_account(key.clone(), user.clone())
        .await
        .unwrap();
    if balance > 0 {
        market
            .add_user_balance(key.clone(), user.clone(), Money::new(balance))
            .await
            .unwrap();
    }

    Shop {
        market,
        key,
        user,
        store,
        product,
    }
}

// ========== Stores ==========

#[tokio::test]
async fn list_stores_returns_only_the_callers_stores() {
    let market = market();
    let alice = market
        .create_user(UserId::new("alice"), "Alice".to_string())
        .await
        .unwrap();
    let bob = market
        .create_user(UserId::new("bob"), "Bob".to_string())
        .await
        .unwrap();

    for name in ["books", "lamps"] {
        market.create_store(alice.clone(), name.to_string()).await.unwrap();
    }
    market.create_store(bob.clone(), "tools".to_string()).await.unwrap();

    let stores = market.list_stores(&alice).await.unwrap();
    assert_eq!(stores.len(), 2);
    assert!(stores.iter().all(|s| s.owner == UserId::new("alice")));

    let stores = market.list_stores(&bob).await.unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].id, StoreId::new("bob/tools"));
}

#[tokio::test]
async fn store_link_round_trips() {
    let market = market();
    let key = market
        .create_user(UserId::new("alice"), "Alice".to_string())
        .await
        .unwrap();

    let (id, link) = market.create_store(key.clone(), "shop".to_string()).await.unwrap();
    let store = market.get_store_by_link(&key, &link).await.unwrap();

    assert_eq!(store.id, id);
    assert_eq!(store.name, "shop");
}

#[tokio::test]
async fn duplicate_store_is_rejected() {
    let market = market();
    let key = market
        .create_user(UserId::new("alice"), "Alice".to_string())
        .await
        .unwrap();
    market.create_store(key.clone(), "shop".to_string()).await.unwrap();

    let result = market.create_store(key.clone(), "shop".to_string()).await;

    assert_eq!(result, Err(MarketError::AlreadyExists(Resource::Store)));
    assert_eq!(market.list_stores(&key).await.unwrap().len(), 1);
}

#[tokio::test]
async fn store_ids_never_collide_across_owners() {
    let market = market();

    // "a/b" + "c" and "a" + "b/c" would both spell "a/b/c"
    assert_eq!(
        market
            .create_user(UserId::new("a/b"), "Slash".to_string())
            .await,
        Err(MarketError::InvalidName(Resource::User))
    );

    let a = market
        .create_user(UserId::new("a"), "A".to_string())
        .await
        .unwrap();
    assert_eq!(
        market.create_store(a.clone(), "b/c".to_string()).await,
        Err(MarketError::InvalidName(Resource::Store))
    );
    assert!(market.list_stores(&a).await.unwrap().is_empty());
}

#[tokio::test]
async fn nested_store_ids_are_outside_every_namespace() {
    let market = market();
    let key = market
        .create_user(UserId::new("alice"), "Alice".to_string())
        .await
        .unwrap();

    assert_eq!(
        market
            .add_product(key, StoreId::new("alice/b/missing"), lamp(1, 1))
            .await,
        Err(MarketError::Unauthorized)
    );
}

#[tokio::test]
async fn every_store_link_request_mints_a_new_alias() {
    let Shop {
        market, key, store, ..
    } = shop(10, 5, 0).await;

    let first = market.get_store_link(key.clone(), store.clone()).await.unwrap();
    let second = market.get_store_link(key.clone(), store.clone()).await.unwrap();

    assert_ne!(first, second);
    for link in [first, second] {
        assert_eq!(market.get_store_by_link(&key, &link).await.unwrap().id, store);
    }
}

#[tokio::test]
async fn store_links_of_other_users_are_unauthorized() {
    let Shop { market, key, .. } = shop(10, 5, 0).await;
    let (_, link) = market.create_store(key, "second".to_string()).await.unwrap();
    let bob = market
        .create_user(UserId::new("bob"), "Bob".to_string())
        .await
        .unwrap();

    assert_eq!(
        market.get_store_by_link(&bob, &link).await,
        Err(MarketError::Unauthorized)
    );
}

// ========== Ownership ==========

#[tokio::test]
async fn cannot_add_products_to_another_users_store() {
    let Shop { market, store, .. } = shop(10, 5, 0).await;
    let bob = market
        .create_user(UserId::new("bob"), "Bob".to_string())
        .await
        .unwrap();

    // Existing store of alice
    assert_eq!(
        market.add_product(bob.clone(), store, lamp(1, 1)).await,
        Err(MarketError::Unauthorized)
    );
    // Store that does not exist in alice's namespace
    assert_eq!(
        market
            .add_product(bob.clone(), StoreId::new("alice/ghost"), lamp(1, 1))
            .await,
        Err(MarketError::Unauthorized)
    );
    // Missing store of bob's own
    assert_eq!(
        market
            .add_product(bob, StoreId::new("bob/ghost"), lamp(1, 1))
            .await,
        Err(MarketError::NotFound(Resource::Store))
    );
}

#[tokio::test]
async fn products_are_only_readable_through_the_owning_store() {
    let Shop {
        market,
        key,
        store,
        product,
        ..
    } = shop(10, 5, 0).await;
    let (other, _) = market.create_store(key.clone(), "other".to_string()).await.unwrap();

    assert!(market.get_product(&key, &store, product).await.is_ok());
    assert_eq!(
        market.get_product(&key, &other, product).await,
        Err(MarketError::NotFound(Resource::Product))
    );
}

#[tokio::test]
async fn unbound_keys_are_unauthorized_everywhere() {
    let Shop {
        market,
        user,
        store,
        product,
        ..
    } = shop(10, 5, 100).await;
    let stranger = ApiKey::new("stranger");

    assert_eq!(market.list_stores(&stranger).await, Err(MarketError::Unauthorized));
    assert_eq!(
        market.create_order(stranger.clone(), user.clone(), product, 1).await,
        Err(MarketError::Unauthorized)
    );
    assert_eq!(
        market.get_product(&stranger, &store, product).await,
        Err(MarketError::Unauthorized)
    );
    assert_eq!(
        market.get_wishlist(&stranger, &user).await,
        Err(MarketError::Unauthorized)
    );
}

// ========== Products ==========

#[tokio::test]
async fn product_links_resolve_to_the_product() {
    let market = market();
    let key = market
        .create_user(UserId::new("alice"), "Alice".to_string())
        .await
        .unwrap();
    let (store, _) = market.create_store(key.clone(), "shop".to_string()).await.unwrap();
    let (product, link) = market
        .add_product(key.clone(), store.clone(), lamp(10, 5))
        .await
        .unwrap();

    assert_eq!(market.get_product_link(&key, &store, product).await.unwrap(), link);
    let resolved = market.get_product_by_link(&key, &store, &link).await.unwrap();
    assert_eq!(resolved.id, product);
    assert_eq!(resolved.store, store);
}

#[tokio::test]
async fn store_token_is_not_a_product_link() {
    let market = market();
    let key = market
        .create_user(UserId::new("alice"), "Alice".to_string())
        .await
        .unwrap();
    let (store, store_link) = market.create_store(key.clone(), "shop".to_string()).await.unwrap();

    assert_eq!(
        market.get_product_by_link(&key, &store, &store_link).await,
        Err(MarketError::NotFound(Resource::Link))
    );
}

#[tokio::test]
async fn list_products_clamps_pages() {
    let Shop {
        market, key, store, ..
    } = shop(10, 5, 0).await;
    for _ in 0..4 {
        market
            .add_product(key.clone(), store.clone(), lamp(1, 1))
            .await
            .unwrap();
    }

    // Five products in total
    assert!(market.list_products(&key, &store, 5, 10).await.unwrap().is_empty());
    assert!(market.list_products(&key, &store, 50, 10).await.unwrap().is_empty());
    assert_eq!(market.list_products(&key, &store, 0, 100).await.unwrap().len(), 5);

    let page = market.list_products(&key, &store, 3, 10).await.unwrap();
    let ids: Vec<u64> = page.iter().map(|p| p.id.value()).collect();
    assert_eq!(ids, vec![3, 4]);
}

#[tokio::test]
async fn list_products_filters_by_store() {
    let Shop {
        market, key, store, ..
    } = shop(10, 5, 0).await;
    let (other, _) = market.create_store(key.clone(), "other".to_string()).await.unwrap();
    market
        .add_product(key.clone(), other.clone(), lamp(1, 1))
        .await
        .unwrap();

    assert_eq!(market.list_products(&key, &store, 0, 10).await.unwrap().len(), 1);
    assert_eq!(market.list_products(&key, &other, 0, 10).await.unwrap().len(), 1);
}

// ========== Orders ==========

#[tokio::test]
async fn successful_order_updates_inventory_balance_and_history() {
    let Shop {
        market,
        key,
        user,
        store,
        product,
    } = shop(10, 5, 100).await;

    let order_id = market
        .create_order(key.clone(), user.clone(), product, 2)
        .await
        .unwrap();

    let order = market.get_order(&key, order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Money::new(20));
    assert_eq!(order.placed_at, test_clock_now());
    assert_eq!(market.get_product(&key, &store, product).await.unwrap().inventory, 3);
    assert_eq!(market.get_user(&key).await.unwrap().balance, Money::new(80));
    assert_eq!(
        market.get_order_history(&key, &user).await.unwrap().first(),
        Some(&order_id)
    );
}

fn test_clock_now() -> chrono::DateTime<chrono::Utc> {
    use bazaar_core::environment::Clock;
    test_clock().now()
}

#[tokio::test]
async fn insufficient_inventory_changes_nothing() {
    let Shop {
        market,
        key,
        user,
        store,
        product,
    } = shop(10, 5, 1000).await;

    let result = market.create_order(key.clone(), user.clone(), product, 10).await;

    assert_eq!(
        result,
        Err(MarketError::InsufficientInventory {
            available: 5,
            requested: 10
        })
    );
    assert_eq!(market.get_product(&key, &store, product).await.unwrap().inventory, 5);
    assert_eq!(market.get_user(&key).await.unwrap().balance, Money::new(1000));
    assert!(market.get_order_history(&key, &user).await.unwrap().is_empty());
}

#[tokio::test]
async fn insufficient_funds_changes_nothing() {
    let Shop {
        market,
        key,
        user,
        store,
        product,
    } = shop(5, 10, 10).await;

    let result = market.create_order(key.clone(), user.clone(), product, 3).await;

    assert_eq!(
        result,
        Err(MarketError::InsufficientFunds {
            balance: Money::new(10),
            required: Money::new(15)
        })
    );
    assert_eq!(market.get_product(&key, &store, product).await.unwrap().inventory, 10);
    assert_eq!(market.get_user(&key).await.unwrap().balance, Money::new(10));
    assert!(market.get_order_history(&key, &user).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_orders_do_not_consume_ids() {
    let Shop {
        market,
        key,
        user,
        product,
        ..
    } = shop(10, 5, 100).await;

    market
        .create_order(key.clone(), user.clone(), product, 0)
        .await
        .unwrap_err();
    let id = market.create_order(key.clone(), user, product, 1).await.unwrap();

    assert_eq!(id.value(), 0);
}

#[tokio::test]
async fn order_history_is_most_recent_first() {
    let Shop {
        market,
        key,
        user,
        product,
        ..
    } = shop(1, 10, 100).await;

    let first = market.create_order(key.clone(), user.clone(), product, 1).await.unwrap();
    let second = market.create_order(key.clone(), user.clone(), product, 1).await.unwrap();

    assert_eq!(
        market.get_order_history(&key, &user).await.unwrap(),
        vec![second, first]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_committed_command_reports_success_under_load() {
    let market = Marketplace::with_config(
        MarketEnvironment::new(Arc::new(test_clock()), Arc::new(SequentialTokens::new("tok"))),
        StoreConfig::default().with_broadcast_capacity(1),
        Duration::from_secs(10),
    );
    // An observer that never reads keeps the action broadcast saturated
    let _idle = market.store().subscribe_actions();
    let key = market
        .create_user(UserId::new("dana"), "Dana".to_string())
        .await
        .unwrap();

    let attempts: Vec<_> = (0..1000)
        .map(|i| {
            let market = market.clone();
            let key = key.clone();
            tokio::spawn(async move {
                market
                    .create_category(key, format!("category {i}"), String::new())
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for attempt in attempts {
        attempt.await.unwrap().unwrap();
        created += 1;
    }

    assert_eq!(created, 1000);
    assert_eq!(market.list_categories(&key).await.unwrap().len(), 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell() {
    let Shop {
        market,
        key,
        user,
        store,
        product,
    } = shop(10, 5, 1000).await;

    let attempts: Vec<_> = (0..20)
        .map(|_| {
            let market = market.clone();
            let key = key.clone();
            let user = user.clone();
            tokio::spawn(async move { market.create_order(key, user, product, 1).await })
        })
        .collect();

    let mut placed = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => placed += 1,
            Err(err) => assert!(matches!(err, MarketError::InsufficientInventory { .. })),
        }
    }

    assert_eq!(placed, 5);
    assert_eq!(market.get_product(&key, &store, product).await.unwrap().inventory, 0);
    assert_eq!(market.get_user(&key).await.unwrap().balance, Money::new(950));
    assert_eq!(market.get_order_history(&key, &user).await.unwrap().len(), 5);
}

// ========== Users and balances ==========

#[tokio::test]
async fn re_registering_rotates_the_key() {
    let market = market();
    let user = UserId::new("alice");
    let old = market.create_user(user.clone(), "Alice".to_string()).await.unwrap();
    market
        .add_user_balance(old.clone(), user.clone(), Money::new(40))
        .await
        .unwrap();

    let new = market.create_user(user, "Alice B.".to_string()).await.unwrap();

    assert_ne!(old, new);
    assert_eq!(market.get_user(&old).await, Err(MarketError::Unauthorized));
    let profile = market.get_user(&new).await.unwrap();
    assert_eq!(profile.name, "Alice B.");
    assert_eq!(profile.balance, Money::new(40));
}

#[tokio::test]
async fn balance_overflow_is_rejected() {
    let Shop {
        market, key, user, ..
    } = shop(10, 5, 100).await;

    assert_eq!(
        market.add_user_balance(key.clone(), user, Money::MAX).await,
        Err(MarketError::AmountOverflow)
    );
    assert_eq!(market.get_user(&key).await.unwrap().balance, Money::new(100));
}

#[tokio::test]
async fn crediting_an_unknown_user_is_not_found() {
    let Shop { market, key, .. } = shop(10, 5, 0).await;
    assert_eq!(
        market
            .add_user_balance(key, UserId::new("ghost"), Money::new(1))
            .await,
        Err(MarketError::NotFound(Resource::User))
    );
}

#[tokio::test]
async fn token_collisions_surface_as_errors() {
    let market = Marketplace::new(MarketEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(ConstantToken("same".to_string())),
    ));

    market
        .create_user(UserId::new("alice"), "Alice".to_string())
        .await
        .unwrap();
    let result = market.create_user(UserId::new("bob"), "Bob".to_string()).await;

    assert_eq!(result, Err(MarketError::TokenCollision));
}

// ========== Categories ==========

#[tokio::test]
async fn category_crud() {
    let Shop { market, key, .. } = shop(10, 5, 0).await;

    let id = market
        .create_category(key.clone(), "Books".to_string(), "Paper".to_string())
        .await
        .unwrap();
    market
        .update_category(key.clone(), id, "Books".to_string(), "Paper and ink".to_string())
        .await
        .unwrap();
    assert_eq!(
        market.get_category(&key, id).await.unwrap().description,
        "Paper and ink"
    );

    market.delete_category(key.clone(), id).await.unwrap();
    assert_eq!(
        market.get_category(&key, id).await,
        Err(MarketError::NotFound(Resource::Category))
    );
    assert_eq!(
        market.delete_category(key.clone(), id).await,
        Err(MarketError::NotFound(Resource::Category))
    );

    let next = market
        .create_category(key, "Music".to_string(), String::new())
        .await
        .unwrap();
    assert_ne!(next, id);
}

#[tokio::test]
async fn listing_categories_is_idempotent() {
    let Shop { market, key, .. } = shop(10, 5, 0).await;
    for name in ["Books", "Music", "Tools"] {
        market
            .create_category(key.clone(), name.to_string(), String::new())
            .await
            .unwrap();
    }

    let first = market.list_categories(&key).await.unwrap();
    let second = market.list_categories(&key).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

// ========== Customer accounts ==========

#[tokio::test]
async fn account_lists_read_most_recent_first() {
    let Shop {
        market,
        key,
        user,
        product,
        ..
    } = shop(10, 5, 0).await;

    market.add_to_wishlist(key.clone(), user.clone(), product).await.unwrap();
    market
        .add_to_wishlist(key.clone(), user.clone(), ProductId::new(99))
        .await
        .unwrap();
    market
        .add_saved_address(key.clone(), user.clone(), "1 Old Road".to_string())
        .await
        .unwrap();
    market
        .add_saved_address(key.clone(), user.clone(), "2 New Street".to_string())
        .await
        .unwrap();

    assert_eq!(
        market.get_wishlist(&key, &user).await.unwrap(),
        vec![ProductId::new(99), product]
    );
    assert_eq!(
        market.get_saved_addresses(&key, &user).await.unwrap(),
        vec!["2 New Street", "1 Old Road"]
    );
    let account = market.get_customer_account(&key, &user).await.unwrap();
    assert_eq!(account.user, user);
}

#[tokio::test]
async fn second_account_is_a_conflict() {
    let Shop {
        market, key, user, ..
    } = shop(10, 5, 0).await;

    assert_eq!(
        market.create_customer_account(key, user).await,
        Err(MarketError::AlreadyExists(Resource::CustomerAccount))
    );
}

#[tokio::test]
async fn orders_need_a_customer_account() {
    let market = market();
    let user = UserId::new("alice");
    let key = market.create_user(user.clone(), "Alice".to_string()).await.unwrap();
    let (store, _) = market.create_store(key.clone(), "shop".to_string()).await.unwrap();
    let (product, _) = market.add_product(key.clone(), store, lamp(1, 1)).await.unwrap();
    market
        .add_user_balance(key.clone(), user.clone(), Money::new(10))
        .await
        .unwrap();

    assert_eq!(
        market.create_order(key, user, product, 1).await,
        Err(MarketError::NotFound(Resource::CustomerAccount))
    );
}

// ========== Lifecycle ==========

#[tokio::test]
async fn commands_after_shutdown_are_unavailable() {
    let Shop {
        market, key, user, ..
    } = shop(10, 5, 0).await;

    market.shutdown(Duration::from_secs(1)).await.unwrap();

    assert!(market.health().status.is_unhealthy());
    assert!(matches!(
        market.add_user_balance(key.clone(), user, Money::new(1)).await,
        Err(MarketError::Unavailable(_))
    ));
    // Reads keep working against the final state
    assert!(market.get_user(&key).await.is_ok());
}
