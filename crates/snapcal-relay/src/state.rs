use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use snapcal_core::extract::DirectTransport;

/// Fixed per-client request ceiling enforced by the relay.
pub const MAX_REQUESTS_PER_MINUTE: u32 = 10;

const WINDOW: Duration = Duration::from_secs(60);

/// Shared application state: the credential-bearing transport and the
/// per-client rate accounting.
#[derive(Clone)]
pub struct AppState {
    pub transport: DirectTransport,
    limiter: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

struct Window {
    started: Instant,
    count: u32,
}

impl AppState {
    pub fn new(api_key: String, model: String) -> Self {
        AppState {
            transport: DirectTransport::new(api_key, model),
            limiter: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record one request from `client`; false when the fixed window for
    /// that client is already full.
    pub fn allow_request(&self, client: IpAddr) -> bool {
        let mut windows = match self.limiter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        let window = windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= WINDOW {
            window.started = now;
            window.count = 0;
        }
        if window.count >= MAX_REQUESTS_PER_MINUTE {
            return false;
        }
        window.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_rate_limit_fills_and_rejects() {
        let state = AppState::new("test-key".to_string(), "test-model".to_string());
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);

        for _ in 0..MAX_REQUESTS_PER_MINUTE {
            assert!(state.allow_request(client));
        }
        assert!(!state.allow_request(client), "window should be exhausted");
    }

    #[test]
    fn test_rate_limit_is_per_client() {
        let state = AppState::new("test-key".to_string(), "test-model".to_string());
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        for _ in 0..MAX_REQUESTS_PER_MINUTE {
            assert!(state.allow_request(first));
        }
        assert!(!state.allow_request(first));
        assert!(state.allow_request(second), "other clients are unaffected");
    }
}
