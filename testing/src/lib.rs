//! # Bazaar Testing
//!
//! Testing utilities and helpers for the Bazaar marketplace backend.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (clock, token source)
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effects
//! - Helpers that resolve effects into the actions they produce
//!
//! ## Example
//!
//! ```ignore
//! use bazaar_testing::{test_clock, SequentialTokens};
//!
//! let env = MarketEnvironment::new(test_clock(), SequentialTokens::new("key"));
//! let service = Marketplace::new(env);
//! ```

use chrono::{DateTime, Utc};
use bazaar_core::environment::{Clock, TokenSource};


pub use reducer_test::{ReducerTest, assertions, resolve_effects};

/// Mock implementations of Environment traits.
pub mod mocks {
    use super::{Clock, DateTime, TokenSource, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use bazaar_testing::mocks::FixedClock;
    /// use bazaar_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable token source: `{prefix}-0001`, `{prefix}-0002`, ...
    ///
    /// Never repeats within a run, so it behaves like a secure source as far
    /// as uniqueness goes while keeping assertions readable.
    #[derive(Debug)]
    pub struct SequentialTokens {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialTokens {
        /// Create a token source with the given prefix
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }

        /// Number of tokens minted so far
        #[must_use]
        pub fn minted(&self) -> u64 {
            self.next.load(Ordering::SeqCst) - 1
        }
    }

    impl TokenSource for SequentialTokens {
        fn mint(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            format!("{}-{n:04}", self.prefix)
        }
    }

    /// Token source that always returns the same token
    ///
    /// Drives the collision path of anything that mints unique tokens.
    #[derive(Debug, Clone)]
    pub struct ConstantToken(pub String);

    impl TokenSource for ConstantToken {
        fn mint(&self) -> String {
            self.0.clone()
        }
    }
}

/// Install a `tracing` subscriber for tests, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{ConstantToken, FixedClock, SequentialTokens, test_clock};
