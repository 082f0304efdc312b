//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use rand::RngCore;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use user_metadata_service::config::{CircuitBreakerConfig, RetryConfig, ServiceConfig};
use user_metadata_service::http::HttpServer;
use user_metadata_service::lifecycle::Shutdown;
use user_metadata_service::resilience::{CircuitBreaker, RetryPolicy};
use user_metadata_service::store::{FailureInjector, GuardedStore};
use user_metadata_service::UserService;

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub service: Arc<UserService>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a server around the given service.
pub async fn start_server(service: UserService) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = Arc::new(service);
    let server = HttpServer::with_service(ServiceConfig::default(), service.clone());

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, rx).await });

    TestServer {
        addr,
        service,
        shutdown,
        handle,
    }
}

/// Short delays so real-clock tests stay fast.
pub fn fast_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::from(&RetryConfig {
        max_attempts,
        base_delay_ms: 10,
        min_delay_ms: 10,
        max_delay_ms: 50,
        jitter_max_ms: 5,
        jitter_seed: Some(3),
    })
}

/// Build a service with explicit breaker settings and failure source.
pub fn service(
    failure_threshold: u32,
    recovery_timeout_secs: f64,
    max_attempts: u32,
    injector: FailureInjector,
) -> UserService {
    let breaker = CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold,
        recovery_timeout_secs,
        half_open_successes: 1,
    });
    let store = Arc::new(GuardedStore::new(breaker, injector));
    UserService::new(store, fast_retries(max_attempts), Some(3))
}

/// JSON body for `POST /user`.
pub fn user_body(user_id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "phone": "555-0100",
    })
}

/// Replays a fixed list of fail/succeed decisions, then always succeeds.
pub struct ScriptedRng(VecDeque<bool>);

impl ScriptedRng {
    pub fn new(failures: &[bool]) -> Self {
        Self(failures.iter().copied().collect())
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        match self.0.pop_front() {
            Some(true) => 0,
            _ => u64::MAX,
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
