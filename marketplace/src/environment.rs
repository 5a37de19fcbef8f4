//! Injected dependencies of the marketplace reducer.

use base64::Engine;
use bazaar_core::environment::{Clock, SystemClock, TokenSource};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shape of minted tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// Random bytes, base64url without padding
    #[default]
    Opaque,
    /// Decimal milliseconds since the epoch followed by the opaque suffix
    Timestamped,
}

impl std::str::FromStr for TokenFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opaque" => Ok(Self::Opaque),
            "timestamped" => Ok(Self::Timestamped),
            other => Err(format!("unknown token format '{other}'")),
        }
    }
}

/// Token source backed by the thread-local CSPRNG
///
/// API keys and link tokens are bearer capabilities, so every byte comes
/// from `rand::thread_rng()`.
#[derive(Clone)]
pub struct SecureTokens {
    bytes: usize,
    format: TokenFormat,
    clock: Arc<dyn Clock>,
}

impl SecureTokens {
    /// Minimum number of random bytes per token
    pub const MIN_BYTES: usize = 16;

    /// Creates a token source drawing `bytes` random bytes per token
    ///
    /// Values below [`Self::MIN_BYTES`] are raised to it.
    #[must_use]
    pub fn new(bytes: usize, format: TokenFormat, clock: Arc<dyn Clock>) -> Self {
        Self {
            bytes: bytes.max(Self::MIN_BYTES),
            format,
            clock,
        }
    }

    fn random_suffix(&self) -> String {
        let mut random_bytes = vec![0u8; self.bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }
}

impl Default for SecureTokens {
    fn default() -> Self {
        Self::new(32, TokenFormat::Opaque, Arc::new(SystemClock))
    }
}

impl TokenSource for SecureTokens {
    fn mint(&self) -> String {
        match self.format {
            TokenFormat::Opaque => self.random_suffix(),
            TokenFormat::Timestamped => {
                format!("{}{}", self.clock.now().timestamp_millis(), self.random_suffix())
            },
        }
    }
}

impl std::fmt::Debug for SecureTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureTokens")
            .field("bytes", &self.bytes)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Environment for the marketplace reducer
#[derive(Clone)]
pub struct MarketEnvironment {
    /// Clock for order timestamps
    pub clock: Arc<dyn Clock>,
    /// Source of API keys and link tokens
    pub tokens: Arc<dyn TokenSource>,
}

impl MarketEnvironment {
    /// Creates a new marketplace environment
    pub fn new(clock: Arc<dyn Clock>, tokens: Arc<dyn TokenSource>) -> Self {
        Self { clock, tokens }
    }

    /// Wall clock and secure opaque tokens
    #[must_use]
    pub fn production(token_bytes: usize, format: TokenFormat) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let tokens = Arc::new(SecureTokens::new(token_bytes, format, Arc::clone(&clock)));
        Self::new(clock, tokens)
    }
}

impl std::fmt::Debug for MarketEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketEnvironment").finish_non_exhaustive()
    }
}
