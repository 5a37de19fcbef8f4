//! # Bazaar Core
//!
//! Core traits and types for the Bazaar marketplace backend.
//!
//! The backend is written as a functional core driven by an imperative shell:
//!
//! - **State**: the owned domain aggregate (every entity collection lives here)
//! - **Action**: every input to a reducer (commands, and the outcome events
//!   the runtime broadcasts back to callers)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of work for the runtime, never executed here
//! - **Environment**: injected dependencies (clock, token source)
//!
//! The runtime crate owns the state behind a single lock and runs one reducer
//! call at a time, which is what makes multi-entity commands atomic.
//!
//! ## Example
//!
//! ```ignore
//! use bazaar_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for StockReducer {
//!     type State = Stock;
//!     type Action = StockAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         stock: &mut Stock,
//!         action: StockAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<StockAction>; 4]> {
//!         match action {
//!             StockAction::Take(units) if units > stock.units => {
//!                 smallvec![Effect::emit(StockAction::Short(units))]
//!             }
//!             StockAction::Take(units) => {
//!                 stock.units -= units;
//!                 smallvec![Effect::emit(StockAction::Taken(units))]
//!             }
//!             _ => SmallVec::new(),
//!         }
//!     }
//! }
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the core trait for business logic
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Implementations validate the action first and only then mutate
        /// `state`; a rejected action must leave `state` untouched.
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned from reducers. The runtime executes them and
/// feeds any action they produce back into the store.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is broadcast to
        /// observers and fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action>
    where
        Action: Send + 'static,
    {
        /// Wrap an already known action as an effect
        ///
        /// The action is produced immediately once the runtime polls the
        /// effect. Reducers use this to publish the outcome of a command.
        #[must_use]
        pub fn emit(action: Action) -> Self {
            Effect::Future(Box::pin(async move { Some(action) }))
        }
    }
}

/// Environment module - dependency injection traits
///
/// All non-deterministic inputs to a reducer (time, randomness) come through
/// these traits so reducers stay testable.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of unguessable tokens (API keys, link tokens)
    ///
    /// Tokens are bearer capabilities: anyone holding one can act with it.
    /// Production implementations must draw from a cryptographically secure
    /// generator. Test implementations may be deterministic.
    pub trait TokenSource: Send + Sync {
        /// Mint a fresh token
        fn mint(&self) -> String;
    }
}
