// Companion server - Axum HTTP server for LAN clients
// Exposes the recommendation pipeline as a small JSON API

pub mod routes;

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use rand::thread_rng;
use rand::Rng;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::engine::RecommendationEngine;

/// Shared state for the companion server
pub struct CompanionServerState {
    /// Auth token (256-bit random, hex-encoded unless configured)
    pub token: String,
    pub engine: Arc<RecommendationEngine>,
}

/// Holds the running server's shutdown mechanism
pub struct RunningServer {
    pub shutdown_tx: oneshot::Sender<()>,
    pub addr: SocketAddr,
    pub token: String,
    pub handle: JoinHandle<()>,
}

impl RunningServer {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            error!("Companion server task failed: {}", e);
        }
    }
}

/// Generate a cryptographically random 256-bit token (64 hex chars)
pub fn generate_token() -> String {
    let mut rng = thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// LAN address other devices can use to reach this machine.
pub fn lan_ip() -> IpAddr {
    if let Ok(ip) = local_ip_address::local_ip() {
        if !ip.is_loopback() {
            return ip;
        }
    }
    if let Ok(ifas) = local_ip_address::list_afinet_netifas() {
        for (_name, ip) in ifas {
            if !ip.is_loopback() && ip.is_ipv4() {
                return ip;
            }
        }
    }
    warn!("Could not detect LAN IP, using 127.0.0.1");
    IpAddr::from([127, 0, 0, 1])
}

/// Auth middleware - validates Bearer token on every request.
/// `/api/status` stays public so clients can check the server is up.
async fn auth_middleware(
    State(state): State<Arc<CompanionServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if request.uri().path() == "/api/status" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header) if header.starts_with("Bearer ") => {
            let provided_token = &header[7..];
            if provided_token == state.token {
                Ok(next.run(request).await)
            } else {
                Err(StatusCode::UNAUTHORIZED)
            }
        }
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

pub fn build_router(state: Arc<CompanionServerState>) -> Router {
    // CORS configuration - not a security layer, auth middleware handles that
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_origin(HeaderValue::from_static("*"));

    Router::new()
        .merge(routes::api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
        .layer(cors)
}

/// Start the companion HTTP server on the given port.
/// Returns the running server handle (for shutdown) or an error.
pub async fn start_server(
    port: u16,
    token: String,
    engine: Arc<RecommendationEngine>,
) -> Result<RunningServer> {
    let state = Arc::new(CompanionServerState {
        token: token.clone(),
        engine,
    });
    let app = build_router(state);

    let listener = try_bind(port).await?;
    let actual_addr = listener
        .local_addr()
        .context("Failed to get local addr")?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    // Log without sensitive info
    info!("Companion server starting on {}", actual_addr);

    let handle = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Shutdown signal received, draining connections...");
            })
            .await;
        if let Err(e) = result {
            error!("Companion server error: {}", e);
        }
        info!("Companion server stopped");
    });

    Ok(RunningServer {
        shutdown_tx,
        addr: actual_addr,
        token,
        handle,
    })
}

/// Try to bind to the given port, with fallback to nearby ports then OS-assigned
async fn try_bind(preferred_port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], preferred_port));
    if let Ok(listener) = TcpListener::bind(addr).await {
        return Ok(listener);
    }

    for offset in 1..=10u16 {
        let port = preferred_port.saturating_add(offset);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        if let Ok(listener) = TcpListener::bind(addr).await {
            warn!("Port {} unavailable, using {}", preferred_port, port);
            return Ok(listener);
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], 0u16));
    if let Ok(listener) = TcpListener::bind(addr).await {
        warn!("All preferred ports unavailable, OS assigned a port");
        return Ok(listener);
    }

    Err(anyhow!("Failed to bind to any port"))
}
