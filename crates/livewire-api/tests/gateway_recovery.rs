//! Gateway behavior against a mock LiveWire server: bearer injection,
//! one-shot 401 recovery, and single-flight refresh coordination.

use std::sync::{Arc, Mutex};

use {
    axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    },
    secrecy::ExposeSecret,
    serde_json::{Value, json},
};

use livewire_api::{ApiError, ApiGateway, Credentials, SessionEvent, SessionStore, auth};

#[derive(Clone, Default)]
struct MockServer {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// Access token `/auth/me/` currently accepts.
    valid_access: String,
    /// Refresh token the exchange endpoint accepts.
    valid_refresh: String,
    /// Token handed out by a successful exchange.
    next_access: String,
    /// When set, `/auth/me/` rejects everything with 401.
    always_reject: bool,
    /// Delay inside the exchange, to widen concurrency windows.
    refresh_delay_ms: u64,
    refresh_calls: usize,
    me_calls: usize,
    /// Authorization header of each `/auth/me/` request, in order.
    seen_auth: Vec<Option<String>>,
}

impl MockServer {
    fn refresh_calls(&self) -> usize {
        self.inner.lock().unwrap().refresh_calls
    }

    fn me_calls(&self) -> usize {
        self.inner.lock().unwrap().me_calls
    }

    fn seen_auth(&self) -> Vec<Option<String>> {
        self.inner.lock().unwrap().seen_auth.clone()
    }
}

fn user_fixture() -> Value {
    json!({
        "id": 1,
        "email": "ada@example.com",
        "display_name": "Ada",
        "avatar_url": null,
        "is_email_verified": true,
        "date_joined": "2026-01-05T09:30:00Z"
    })
}

async fn me_handler(
    State(server): State<MockServer>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut inner = server.inner.lock().unwrap();
    inner.me_calls += 1;
    inner.seen_auth.push(auth.clone());

    let expected = format!("Bearer {}", inner.valid_access);
    if !inner.always_reject && auth.as_deref() == Some(expected.as_str()) {
        (StatusCode::OK, Json(user_fixture()))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "token_not_valid"})),
        )
    }
}

async fn refresh_handler(
    State(server): State<MockServer>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let delay_ms = {
        let mut inner = server.inner.lock().unwrap();
        inner.refresh_calls += 1;
        inner.refresh_delay_ms
    };
    if delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
    }

    let mut inner = server.inner.lock().unwrap();
    if body["refresh"].as_str() == Some(inner.valid_refresh.as_str()) {
        inner.valid_access = inner.next_access.clone();
        let access = inner.next_access.clone();
        (StatusCode::OK, Json(json!({"access": access})))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "refresh_token_invalid"})),
        )
    }
}

async fn spawn(server: MockServer) -> String {
    let app = Router::new()
        .route("/api/auth/me/", get(me_handler))
        .route("/api/auth/token/refresh/", post(refresh_handler))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Harness {
    server: MockServer,
    gateway: ApiGateway,
    store: SessionStore,
    _dir: tempfile::TempDir,
}

async fn harness(inner: Inner) -> Harness {
    let server = MockServer {
        inner: Arc::new(Mutex::new(inner)),
    };
    let base_url = spawn(server.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::with_path(dir.path().join("credentials.json"));
    let gateway = ApiGateway::new(&base_url, store.clone());

    Harness {
        server,
        gateway,
        store,
        _dir: dir,
    }
}

#[tokio::test]
async fn bearer_header_attached_when_logged_in() {
    let h = harness(Inner {
        valid_access: "acc-1".into(),
        valid_refresh: "ref-1".into(),
        ..Inner::default()
    })
    .await;
    h.store
        .store(&Credentials::new("acc-1".into(), "ref-1".into()))
        .unwrap();

    let user = auth::current_user(&h.gateway).await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(h.server.seen_auth(), vec![
        Some("Bearer acc-1".to_string())
    ]);
}

#[tokio::test]
async fn no_header_when_logged_out() {
    let h = harness(Inner {
        valid_access: "acc-1".into(),
        ..Inner::default()
    })
    .await;

    let err = auth::current_user(&h.gateway).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated { .. }));
    assert_eq!(h.server.seen_auth(), vec![None]);
    // No refresh half existed, so no exchange was attempted.
    assert_eq!(h.server.refresh_calls(), 0);
}

#[tokio::test]
async fn stale_access_is_refreshed_and_request_replayed_once() {
    let h = harness(Inner {
        valid_access: "acc-current".into(),
        valid_refresh: "ref-1".into(),
        next_access: "acc-rotated".into(),
        ..Inner::default()
    })
    .await;
    h.store
        .store(&Credentials::new("acc-stale".into(), "ref-1".into()))
        .unwrap();

    let user = auth::current_user(&h.gateway).await.unwrap();
    assert_eq!(user.id, 1);

    assert_eq!(h.server.refresh_calls(), 1);
    assert_eq!(h.server.me_calls(), 2);
    assert_eq!(h.server.seen_auth(), vec![
        Some("Bearer acc-stale".to_string()),
        Some("Bearer acc-rotated".to_string()),
    ]);

    // Access slot rotated, refresh slot untouched.
    let creds = h.store.load().unwrap();
    assert_eq!(creds.access.expose_secret(), "acc-rotated");
    assert_eq!(creds.refresh.expose_secret(), "ref-1");
}

#[tokio::test]
async fn second_401_propagates_without_second_exchange() {
    let h = harness(Inner {
        valid_refresh: "ref-1".into(),
        next_access: "acc-rotated".into(),
        always_reject: true,
        ..Inner::default()
    })
    .await;
    h.store
        .store(&Credentials::new("acc-stale".into(), "ref-1".into()))
        .unwrap();

    let err = auth::current_user(&h.gateway).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated { .. }));

    // One exchange for the first 401; the replayed request's 401 is final.
    assert_eq!(h.server.refresh_calls(), 1);
    assert_eq!(h.server.me_calls(), 2);
}

#[tokio::test]
async fn missing_refresh_half_clears_store_and_propagates_original_error() {
    let h = harness(Inner {
        valid_access: "acc-current".into(),
        ..Inner::default()
    })
    .await;
    // Simulate a torn write: only the access half on disk.
    std::fs::write(
        h._dir.path().join("credentials.json"),
        r#"{"lw_access_token": "acc-stale"}"#,
    )
    .unwrap();

    let err = auth::current_user(&h.gateway).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated { .. }));
    assert_eq!(h.server.refresh_calls(), 0);
    assert!(h.store.load().is_none());
    assert!(!h._dir.path().join("credentials.json").exists());
}

#[tokio::test]
async fn failed_exchange_clears_store_and_emits_expired_once() {
    let h = harness(Inner {
        valid_access: "acc-current".into(),
        valid_refresh: "ref-good".into(),
        ..Inner::default()
    })
    .await;
    h.store
        .store(&Credentials::new("acc-stale".into(), "ref-revoked".into()))
        .unwrap();

    let mut events = h.gateway.subscribe();

    let err = auth::current_user(&h.gateway).await.unwrap_err();
    // The caller gets the refresh failure, not the original 401.
    match err {
        ApiError::SessionExpired(source) => {
            assert!(matches!(*source, ApiError::Status { status: 401, .. }));
        },
        other => panic!("expected SessionExpired, got {other:?}"),
    }

    assert!(h.store.load().is_none());
    assert_eq!(h.server.me_calls(), 1);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn expired_event_is_already_delivered_when_the_call_returns() {
    let h = harness(Inner {
        valid_access: "acc-current".into(),
        valid_refresh: "ref-good".into(),
        ..Inner::default()
    })
    .await;
    h.store
        .store(&Credentials::new("acc-stale".into(), "ref-revoked".into()))
        .unwrap();

    let mut events = h.gateway.subscribe();
    let err = auth::current_user(&h.gateway).await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired(_)));

    // A non-blocking drain after the command finishes must see the event —
    // hosts report it synchronously without racing a background task.
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn recovery_is_idempotent_across_repeats() {
    let h = harness(Inner {
        valid_access: "acc-current".into(),
        valid_refresh: "ref-1".into(),
        next_access: "acc-rotated".into(),
        ..Inner::default()
    })
    .await;

    for round in 0..2 {
        h.store
            .store(&Credentials::new("acc-stale".into(), "ref-1".into()))
            .unwrap();
        auth::current_user(&h.gateway).await.unwrap();

        let creds = h.store.load().unwrap();
        assert_eq!(creds.access.expose_secret(), "acc-rotated", "round {round}");
        assert_eq!(creds.refresh.expose_secret(), "ref-1", "round {round}");
    }
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh_exchange() {
    let h = harness(Inner {
        valid_access: "acc-current".into(),
        valid_refresh: "ref-1".into(),
        next_access: "acc-rotated".into(),
        refresh_delay_ms: 100,
        ..Inner::default()
    })
    .await;
    h.store
        .store(&Credentials::new("acc-stale".into(), "ref-1".into()))
        .unwrap();

    let (a, b) = tokio::join!(
        auth::current_user(&h.gateway),
        auth::current_user(&h.gateway),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(h.server.refresh_calls(), 1);
    let creds = h.store.load().unwrap();
    assert_eq!(creds.access.expose_secret(), "acc-rotated");
}
