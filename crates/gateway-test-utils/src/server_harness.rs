//! Test server harness for E2E testing
//!
//! Provides `TestGateway` and `TestQaService` for spawning real server
//! instances on ephemeral ports.

use common::clock::{Clock, SystemClock};
use gateway::config::Config as GatewayConfig;
use gateway::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use qa_service::config::Config as QaConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Signing secret used by harness gateways and [`TestCredentialBuilder`](crate::TestCredentialBuilder).
pub const TEST_JWT_SECRET: &str = "test-signing-secret-at-least-32-bytes-long";

/// Gateway secret shared between harness gateways and QA services.
pub const TEST_GATEWAY_SECRET: &str = "test-gateway-shared-secret";

async fn serve(app: axum::Router) -> Result<(SocketAddr, JoinHandle<()>), anyhow::Error> {
    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

    let addr = listener
        .local_addr()
        .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

    // Spawn server in background
    let handle = tokio::spawn(async move {
        // Use into_make_service_with_connect_info to support SocketAddr extraction
        let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, make_service).await {
            eprintln!("Test server error: {}", e);
        }
    });

    Ok((addr, handle))
}

// ============================================================================
// Gateway
// ============================================================================

/// Test harness for spawning the edge gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let upstream = wiremock::MockServer::start().await;
/// let gateway = TestGateway::spawn(&upstream.uri()).await?;
///
/// let response = reqwest::get(format!("{}/actuator/health", gateway.url())).await?;
/// assert_eq!(response.status(), 200);
/// ```
pub struct TestGateway {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    /// Spawn a gateway routing every path to `upstream`.
    pub async fn spawn(upstream: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with(upstream, &[], Arc::new(SystemClock)).await
    }

    /// Spawn a gateway with extra environment overrides and a custom clock.
    ///
    /// `overrides` replace the harness defaults, e.g.
    /// `("GATEWAY_REQUIRE_SESSION", "true")`.
    pub async fn spawn_with(
        upstream: &str,
        overrides: &[(&str, &str)],
        clock: Arc<dyn Clock>,
    ) -> Result<Self, anyhow::Error> {
        // Build configuration for test environment
        let mut vars = HashMap::from([
            ("GATEWAY_BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string()),
            ("GATEWAY_SECRET".to_string(), TEST_GATEWAY_SECRET.to_string()),
            ("UPSTREAM_ROUTES".to_string(), format!("/={upstream}")),
            ("UPSTREAM_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = GatewayConfig::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(
            AppState::new(config, clock)
                .map_err(|e| anyhow::anyhow!("Failed to create state: {}", e))?,
        );

        // A detached recorder: the scrape endpoint works without installing
        // a process-global recorder in every test
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        // Build routes using the gateway's real route builder
        let app = routes::build_routes(state.clone(), metrics_handle)
            .map_err(|e| anyhow::anyhow!("Failed to build routes: {}", e))?;

        let (addr, handle) = serve(app).await?;

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the shared application state (sessions, registry, config).
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

// ============================================================================
// QA service
// ============================================================================

/// Test harness for spawning the QA service in E2E tests.
pub struct TestQaService {
    addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestQaService {
    /// Spawn a QA service expecting [`TEST_GATEWAY_SECRET`].
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("QA_BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("GATEWAY_SECRET".to_string(), TEST_GATEWAY_SECRET.to_string()),
        ]);

        let config = QaConfig::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let app = qa_service::routes::build_routes(&config)
            .map_err(|e| anyhow::anyhow!("Failed to build routes: {}", e))?;

        let (addr, handle) = serve(app).await?;

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestQaService {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
