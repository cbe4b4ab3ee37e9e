//! Authenticated request gateway.
//!
//! Every outbound call gets the stored access credential attached as a
//! bearer token. A 401 on a fresh request triggers one recovery attempt:
//! exchange the refresh credential at `/auth/token/refresh/`, persist the
//! rotated access credential, and replay the original request once. A 401
//! on the replay, or recovery without a refresh credential, is terminal.
//!
//! Concurrent 401s share one in-flight exchange: the first flight through
//! the gate performs it, later flights observe the rotated credential and
//! replay without a second exchange.

use {
    reqwest::{Client, Method, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tokio::sync::{Mutex, broadcast},
    tracing::{debug, warn},
};

use crate::{
    error::ApiError,
    session::SessionStore,
    types::RefreshResponse,
};

/// Fixed API root segment appended to the configured base address.
const API_ROOT: &str = "/api";

/// Refresh-exchange endpoint, always called bare (no auth injection).
const REFRESH_PATH: &str = "/auth/token/refresh/";

/// Out-of-band notifications from the gateway to the hosting shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credential recovery failed; the user must log in again. Emitted
    /// exactly once per failed refresh exchange.
    Expired,
}

/// Recovery state carried with one logical request.
///
/// `Fresh -> RetriedOnce` happens at most once; a 401 in `RetriedOnce`
/// forwards the failure instead of attempting a second recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Fresh,
    RetriedOnce,
}

pub struct ApiGateway {
    http: Client,
    base_url: String,
    session: SessionStore,
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiGateway {
    /// Create a gateway rooted at `base_url` (the `/api` segment is appended
    /// here; configure only the server address).
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            http: Client::new(),
            base_url: format!("{}{API_ROOT}", base_url.trim_end_matches('/')),
            session,
            refresh_gate: Mutex::new(()),
            events,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Subscribe to gateway session events. The hosting shell decides what
    /// "go to login" means; the gateway only announces it.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, &[], None).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PATCH, path, &[], Some(body)).await
    }

    /// Send one logical request, recovering from at most one 401.
    ///
    /// The request is rebuilt from parts on replay so the pre-send hook
    /// (credential lookup, bearer header) runs again and picks up the
    /// rotated access credential.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut attempt = Attempt::Fresh;

        loop {
            let access = self.session.load().map(|c| c.access);

            let mut req = self
                .http
                .request(method.clone(), &url)
                .header(reqwest::header::CONTENT_TYPE, "application/json");
            if let Some(access) = &access {
                req = req.bearer_auth(access.expose_secret());
            }
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(body) = &body {
                req = req.json(body);
            }

            let resp = req.send().await?;
            let status = resp.status();

            if status != StatusCode::UNAUTHORIZED {
                if status.is_success() {
                    return Ok(resp.json().await?);
                }
                let text = resp.text().await.unwrap_or_default();
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let text = resp.text().await.unwrap_or_default();
            if attempt == Attempt::RetriedOnce {
                debug!(%url, "replayed request rejected again, giving up");
                return Err(ApiError::Unauthenticated { body: text });
            }
            attempt = Attempt::RetriedOnce;

            self.recover(access.as_ref(), text).await?;
            debug!(%url, "replaying request with rotated access credential");
        }
    }

    /// Recovery path for a first 401: exchange the refresh credential for a
    /// new access credential.
    ///
    /// `presented` is the access credential the failing request was sent
    /// with. If the stored credential no longer matches it, a concurrent
    /// flight already rotated it and this flight replays without its own
    /// exchange.
    async fn recover(
        &self,
        presented: Option<&Secret<String>>,
        original_body: String,
    ) -> Result<(), ApiError> {
        let _flight = self.refresh_gate.lock().await;

        let current = self.session.load();
        match (&current, presented) {
            (Some(cur), Some(pres)) if cur.access.expose_secret() != pres.expose_secret() => {
                debug!("access credential already rotated by a concurrent refresh");
                return Ok(());
            },
            (Some(_), None) => {
                // A login landed after the unauthenticated request went out.
                return Ok(());
            },
            _ => {},
        }

        let Some(credentials) = current else {
            // No refresh half: unrecoverable. Clear whatever is left and
            // surface the original rejection.
            self.session.clear().map_err(ApiError::Session)?;
            return Err(ApiError::Unauthenticated {
                body: original_body,
            });
        };

        match self.exchange_refresh(&credentials.refresh).await {
            Ok(refreshed) => {
                self.session
                    .store_access(&refreshed.access)
                    .map_err(ApiError::Session)?;
                debug!("access credential refreshed");
                Ok(())
            },
            Err(e) => {
                warn!(error = %e, "refresh exchange failed, session expired");
                self.session.clear().map_err(ApiError::Session)?;
                let _ = self.events.send(SessionEvent::Expired);
                Err(ApiError::SessionExpired(Box::new(e)))
            },
        }
    }

    /// Bare call to the refresh endpoint — deliberately bypasses the
    /// pre-send hook so recovery cannot recurse.
    async fn exchange_refresh(
        &self,
        refresh: &Secret<String>,
    ) -> Result<RefreshResponse, ApiError> {
        let url = format!("{}{REFRESH_PATH}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&serde_json::json!({ "refresh": refresh.expose_secret() }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}
