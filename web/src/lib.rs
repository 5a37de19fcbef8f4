//! Axum integration for the Bazaar backend.
//!
//! Implements the imperative shell around the reducer core:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, bearer keys
//! │  - Request parsing                      │  ← Tracing, metrics
//! │  - Response serialization               │
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Validation and state changes         │  ← Testable at memory speed
//! │  - Effect descriptions (values)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract** the bearer key, path and JSON body
//! 3. **Dispatch** the command through the domain service (which owns the `Store`)
//! 4. **Map result** to an HTTP response, errors via [`AppError`]

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CORRELATION_ID_HEADER, CorrelationId};
pub use handlers::health::ReadinessProbe;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
