//! Actions for the marketplace store (commands and outcomes).

use crate::error::MarketError;
use crate::types::{
    ApiKey, Category, CategoryId, LinkToken, Money, NewProduct, Order, OrderId, Product,
    ProductId, RequestId, Store, StoreId, User, UserId,
};

/// A state-changing request
///
/// Every command except [`Command::CreateUser`] carries the caller's key.
#[derive(Clone, Debug)]
pub enum Command {
    /// Register a caller (or rotate their key) and bind a fresh API key
    CreateUser {
        /// Identity from the upstream identity provider
        caller_id: UserId,
        /// Display name
        name: String,
    },
    /// Open a store owned by the caller
    CreateStore {
        /// Caller key
        api_key: ApiKey,
        /// Store name
        name: String,
    },
    /// List a product in one of the caller's stores
    AddProduct {
        /// Caller key
        api_key: ApiKey,
        /// Target store
        store: StoreId,
        /// Product details
        product: NewProduct,
    },
    /// Mint a new link token for one of the caller's stores
    MintStoreLink {
        /// Caller key
        api_key: ApiKey,
        /// Target store
        store: StoreId,
    },
    /// Credit a user's balance
    AddUserBalance {
        /// Caller key
        api_key: ApiKey,
        /// Credited user
        user: UserId,
        /// Amount to add
        amount: Money,
    },
    /// Place an order on behalf of a user
    CreateOrder {
        /// Caller key
        api_key: ApiKey,
        /// Paying user
        user: UserId,
        /// Ordered product
        product: ProductId,
        /// Units ordered
        quantity: u32,
    },
    /// Create a category
    CreateCategory {
        /// Caller key
        api_key: ApiKey,
        /// Category name
        name: String,
        /// Category description
        description: String,
    },
    /// Replace a category's name and description
    UpdateCategory {
        /// Caller key
        api_key: ApiKey,
        /// Target category
        id: CategoryId,
        /// New name
        name: String,
        /// New description
        description: String,
    },
    /// Remove a category
    DeleteCategory {
        /// Caller key
        api_key: ApiKey,
        /// Target category
        id: CategoryId,
    },
    /// Open the customer account of a user
    CreateCustomerAccount {
        /// Caller key
        api_key: ApiKey,
        /// Account owner
        user: UserId,
    },
    /// Push a product to the front of a wishlist
    AddToWishlist {
        /// Caller key
        api_key: ApiKey,
        /// Account owner
        user: UserId,
        /// Wished product (not checked for existence)
        product: ProductId,
    },
    /// Push an address to the front of the saved addresses
    AddSavedAddress {
        /// Caller key
        api_key: ApiKey,
        /// Account owner
        user: UserId,
        /// Address text
        address: String,
    },
}

impl Command {
    /// Short name for logs and metrics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateUser { .. } => "create_user",
            Self::CreateStore { .. } => "create_store",
            Self::AddProduct { .. } => "add_product",
            Self::MintStoreLink { .. } => "mint_store_link",
            Self::AddUserBalance { .. } => "add_user_balance",
            Self::CreateOrder { .. } => "create_order",
            Self::CreateCategory { .. } => "create_category",
            Self::UpdateCategory { .. } => "update_category",
            Self::DeleteCategory { .. } => "delete_category",
            Self::CreateCustomerAccount { .. } => "create_customer_account",
            Self::AddToWishlist { .. } => "add_to_wishlist",
            Self::AddSavedAddress { .. } => "add_saved_address",
        }
    }
}

/// A validated state change
///
/// Produced only after every precondition of a command holds; applying it
/// cannot fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarketEvent {
    /// A user was registered or re-registered with a new key
    UserRegistered {
        /// User record after registration
        user: User,
        /// Newly bound key
        api_key: ApiKey,
    },
    /// A store was opened along with its first link
    StoreCreated {
        /// The new store
        store: Store,
        /// Link token for the store
        link: LinkToken,
    },
    /// A product was listed along with its link
    ProductAdded {
        /// The new product
        product: Product,
        /// Link token for the product
        link: LinkToken,
    },
    /// Another link token now points at a store
    StoreLinkMinted {
        /// Linked store
        store: StoreId,
        /// New token
        link: LinkToken,
    },
    /// A balance was credited
    BalanceAdded {
        /// Credited user
        user: UserId,
        /// Balance after the credit
        balance: Money,
    },
    /// An order was placed: order recorded, inventory and balance reduced,
    /// order history updated
    OrderPlaced {
        /// The new order
        order: Order,
    },
    /// A category was created
    CategoryCreated {
        /// The new category
        category: Category,
    },
    /// A category was replaced
    CategoryUpdated {
        /// Category after the update
        category: Category,
    },
    /// A category was removed
    CategoryDeleted {
        /// Removed category
        id: CategoryId,
    },
    /// A customer account was opened
    CustomerAccountOpened {
        /// Account owner
        user: UserId,
    },
    /// A product was pushed onto a wishlist
    WishlistItemAdded {
        /// Account owner
        user: UserId,
        /// Wished product
        product: ProductId,
    },
    /// An address was pushed onto the saved addresses
    AddressSaved {
        /// Account owner
        user: UserId,
        /// Address text
        address: String,
    },
}

impl MarketEvent {
    /// Event name for logs
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "UserRegistered",
            Self::StoreCreated { .. } => "StoreCreated",
            Self::ProductAdded { .. } => "ProductAdded",
            Self::StoreLinkMinted { .. } => "StoreLinkMinted",
            Self::BalanceAdded { .. } => "BalanceAdded",
            Self::OrderPlaced { .. } => "OrderPlaced",
            Self::CategoryCreated { .. } => "CategoryCreated",
            Self::CategoryUpdated { .. } => "CategoryUpdated",
            Self::CategoryDeleted { .. } => "CategoryDeleted",
            Self::CustomerAccountOpened { .. } => "CustomerAccountOpened",
            Self::WishlistItemAdded { .. } => "WishlistItemAdded",
            Self::AddressSaved { .. } => "AddressSaved",
        }
    }

    /// Id of the order this event placed, if any
    #[must_use]
    pub const fn placed_order(&self) -> Option<OrderId> {
        match self {
            Self::OrderPlaced { order } => Some(order.id),
            _ => None,
        }
    }
}

/// Everything the marketplace store processes
#[derive(Clone, Debug)]
pub enum MarketAction {
    // ========== Input ==========
    /// Run a command
    Execute {
        /// Correlation id echoed in the outcome
        request_id: RequestId,
        /// The command
        command: Command,
    },

    // ========== Outcomes (delivered to the waiting caller) ==========
    /// The command was applied
    Committed {
        /// Correlation id of the command
        request_id: RequestId,
        /// What changed
        event: MarketEvent,
    },
    /// The command was refused and nothing changed
    Rejected {
        /// Correlation id of the command
        request_id: RequestId,
        /// Why
        error: MarketError,
    },
}

impl MarketAction {
    /// Wraps a command with a fresh correlation id
    #[must_use]
    pub fn execute(command: Command) -> Self {
        Self::Execute {
            request_id: RequestId::new(),
            command,
        }
    }

    /// Correlation id, for any variant
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Execute { request_id, .. }
            | Self::Committed { request_id, .. }
            | Self::Rejected { request_id, .. } => *request_id,
        }
    }

    /// Whether this is the outcome of `request_id`
    #[must_use]
    pub fn is_outcome_of(&self, request_id: RequestId) -> bool {
        match self {
            Self::Committed { request_id: id, .. } | Self::Rejected { request_id: id, .. } => {
                *id == request_id
            },
            Self::Execute { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_matches_only_its_request() {
        let id = RequestId::new();
        let committed = MarketAction::Committed {
            request_id: id,
            event: MarketEvent::CategoryDeleted { id: CategoryId::new(1) },
        };
        let command = MarketAction::Execute {
            request_id: id,
            command: Command::CreateUser {
                caller_id: UserId::new("u"),
                name: "U".to_string(),
            },
        };

        assert!(committed.is_outcome_of(id));
        assert!(!committed.is_outcome_of(RequestId::new()));
        assert!(!command.is_outcome_of(id));
        assert_eq!(command.request_id(), id);
    }
}
