use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use super::exchange;
use super::ticket::TicketProvider;
use super::types::{AuthState, AuthStatus, Credentials, TokenData};
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Authentication manager
/// Owns the access token and coalesces renewals so only one ticket exchange runs at a time
#[derive(Clone)]
pub struct AuthManager {
    /// Current state; the sender is the single write path
    state: Arc<watch::Sender<AuthState>>,

    /// Credentials handed to the ticket provider
    credentials: Arc<Credentials>,

    /// Platform ticket source
    provider: Arc<dyn TicketProvider>,

    /// Client configuration (base URL, API key, provider name)
    config: Arc<ClientConfig>,

    /// HTTP client for the token exchange
    client: Client,

    /// Number of ticket exchanges started
    exchanges: Arc<AtomicU64>,
}

impl AuthManager {
    /// Create a new AuthManager in the `Unauthenticated` state
    pub fn new(
        config: Arc<ClientConfig>,
        client: Client,
        credentials: Credentials,
        provider: Arc<dyn TicketProvider>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            state: Arc::new(state),
            credentials: Arc::new(credentials),
            provider,
            config,
            client,
            exchanges: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create an AuthManager that already holds `access_token`
    /// Available in test builds and integration tests
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Arc<ClientConfig>,
        access_token: String,
        provider: Arc<dyn TicketProvider>,
    ) -> Self {
        let manager = Self::new(config, Client::new(), Credentials::default(), provider);
        manager.state.send_replace(AuthState::Ready(TokenData {
            access_token,
            acquired_at: chrono::Utc::now(),
        }));
        manager
    }

    /// Current authentication status
    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status()
    }

    /// True only while a valid access token is held
    pub fn is_ready(&self) -> bool {
        self.status() == AuthStatus::Ready
    }

    /// Number of ticket exchanges started since construction
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::SeqCst)
    }

    /// Current access token, or `NotReady` when none is held
    pub fn access_token(&self) -> Result<String, ApiError> {
        match &*self.state.borrow() {
            AuthState::Ready(data) => Ok(data.access_token.clone()),
            other => Err(ApiError::NotReady {
                status: other.status(),
            }),
        }
    }

    /// Acquire a fresh access token
    ///
    /// If an acquisition is already in flight, waits for its outcome instead
    /// of starting a second exchange.
    pub async fn acquire(&self) -> Result<(), ApiError> {
        if self.begin_acquisition(|state| !matches!(state, AuthState::Acquiring)) {
            self.run_acquisition().await
        } else {
            tracing::debug!("Acquisition already in flight, waiting for it");
            self.wait_settled().await
        }
    }

    /// Wait until no acquisition is in flight and report the outcome
    pub async fn wait_settled(&self) -> Result<(), ApiError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, AuthState::Acquiring))
            .await
            .map_err(|_| ApiError::Auth("authentication state closed".to_string()))?;

        match &*state {
            AuthState::Ready(_) => Ok(()),
            AuthState::Failed(reason) => Err(ApiError::Auth(reason.clone())),
            other => Err(ApiError::NotReady {
                status: other.status(),
            }),
        }
    }

    /// Mark `stale_token` as rejected and renew in the background
    ///
    /// Only the first caller holding the current token starts a renewal;
    /// later callers see `Acquiring` or a newer token and do nothing.
    pub fn invalidate(&self, stale_token: &str) {
        let started = self.begin_acquisition(|state| {
            matches!(state, AuthState::Ready(data) if data.access_token == stale_token)
        });

        if started {
            tracing::warn!(
                token = %token_prefix(stale_token),
                "Access token rejected, renewing in background"
            );
            self.spawn_acquisition();
        } else {
            tracing::debug!("Renewal already in flight or token already replaced");
        }
    }

    /// Retry a failed acquisition in the background
    pub(crate) fn renew_if_failed(&self) {
        if self.begin_acquisition(|state| matches!(state, AuthState::Failed(_))) {
            tracing::info!("Retrying failed authentication in background");
            self.spawn_acquisition();
        }
    }

    /// Atomically move to `Acquiring` when `should_start` holds for the current state
    fn begin_acquisition(&self, should_start: impl FnOnce(&AuthState) -> bool) -> bool {
        self.state.send_if_modified(|state| {
            if should_start(state) {
                *state = AuthState::Acquiring;
                true
            } else {
                false
            }
        })
    }

    fn spawn_acquisition(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if let Err(e) = manager.run_acquisition().await {
                tracing::error!("Background token renewal failed: {}", e);
            }
        });
    }

    /// Perform the exchange; the caller must have moved the state to `Acquiring`
    async fn run_acquisition(&self) -> Result<(), ApiError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        let mut guard = AcquisitionGuard {
            state: &self.state,
            settled: false,
        };

        let result = self.fetch_token().await;
        guard.settled = true;

        match result {
            Ok(data) => {
                tracing::info!(
                    token = %token_prefix(&data.access_token),
                    acquired_at = %data.acquired_at.to_rfc3339(),
                    "Access token acquired"
                );
                self.state.send_replace(AuthState::Ready(data));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Token acquisition failed: {}", e);
                self.state.send_replace(AuthState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn fetch_token(&self) -> Result<TokenData, ApiError> {
        let ticket = self
            .provider
            .ticket(&self.credentials)
            .await
            .map_err(|e| ApiError::Auth(format!("ticket provider failed: {:#}", e)))?;

        exchange::exchange_ticket(&self.client, &self.config, &ticket).await
    }
}

/// Moves the state out of `Acquiring` if the acquisition future is dropped mid-flight
struct AcquisitionGuard<'a> {
    state: &'a watch::Sender<AuthState>,
    settled: bool,
}

impl Drop for AcquisitionGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state
                .send_replace(AuthState::Failed("acquisition cancelled".to_string()));
        }
    }
}

/// First characters of a token, safe to log
fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}...", prefix)
}
