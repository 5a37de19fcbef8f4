//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, extract::State, http::StatusCode};
use bazaar_core::reducer::Reducer;
use bazaar_runtime::{HealthCheck, HealthStatus, Store};
use std::sync::Arc;

/// Anything that can report its own readiness.
pub trait ReadinessProbe {
    /// Current health of the component.
    fn readiness(&self) -> HealthCheck;
}

impl<S, A, E, R> ReadinessProbe for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    S: Send + Sync + 'static,
    A: Send + Clone + 'static,
    E: Send + Sync + 'static,
{
    fn readiness(&self) -> HealthCheck {
        self.health()
    }
}

impl<P: ReadinessProbe> ReadinessProbe for Arc<P> {
    fn readiness(&self) -> HealthCheck {
        (**self).readiness()
    }
}

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check backed by a [`ReadinessProbe`].
///
/// # Status Codes
///
/// - 200 OK: Healthy or Degraded
/// - 503 Service Unavailable: Unhealthy
///
/// # Endpoint
///
/// ```text
/// GET /health/ready
/// ```
///
/// # Response
///
/// ```json
/// {
///   "component": "store",
///   "status": "Healthy",
///   "message": null,
///   "metadata": [["pending_effects", "0"]]
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn readiness<P>(State(probe): State<P>) -> (StatusCode, Json<HealthCheck>)
where
    P: ReadinessProbe + Clone + Send + Sync + 'static,
{
    let health = probe.readiness();

    let status = match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(health))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::{SmallVec, effect::Effect};
    use std::time::Duration;

    #[derive(Clone)]
    struct NoopReducer;

    impl Reducer for NoopReducer {
        type State = ();
        type Action = ();
        type Environment = ();

        fn reduce(&self, _state: &mut (), _action: (), _env: &()) -> SmallVec<[Effect<()>; 4]> {
            SmallVec::new()
        }
    }

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_with_healthy_store() {
        let store = Arc::new(Store::new((), NoopReducer, ()));

        let (status, Json(health)) = readiness(State(store)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_readiness_after_shutdown() {
        let store = Arc::new(Store::new((), NoopReducer, ()));
        store.shutdown(Duration::from_millis(100)).await.unwrap();

        let (status, Json(health)) = readiness(State(store)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }
}
