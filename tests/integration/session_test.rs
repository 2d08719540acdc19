//! Integration tests for the file-backed client session and the refresh
//! coordinator running on top of it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use brokle_auth::refresh::EndReason;
use brokle_auth::session::SESSION_STORAGE_KEY;
use brokle_auth::{
    FileStorage, RefreshCoordinator, RefreshOutcome, RefreshState, SessionBus, SessionStore,
    StorageBridge, TokenStore,
};
use brokle_core::config::SessionConfig;
use brokle_core::error::AppError;
use brokle_core::result::AppResult;
use brokle_core::traits::{StateStorage, TokenRenewer};
use brokle_core::types::{ApiKey, AuthTokens, Organization, Project, User};

fn user() -> User {
    User {
        id: "u1".into(),
        email: "ada@brokle.dev".into(),
        name: "Ada".into(),
        is_email_verified: true,
        avatar_url: None,
    }
}

fn organization(id: &str) -> Organization {
    Organization {
        id: id.into(),
        name: "Acme".into(),
        slug: "acme".into(),
        plan: Some("pro".into()),
    }
}

fn project(organization_id: &str) -> Project {
    Project {
        id: "p1".into(),
        name: "Chatbot".into(),
        slug: "chatbot".into(),
        organization_id: organization_id.into(),
        description: None,
    }
}

fn api_key() -> ApiKey {
    ApiKey {
        id: "k1".into(),
        name: "CI".into(),
        key_preview: "bk_live_****3f9a".into(),
        project_id: "p1".into(),
        created_at: Utc::now(),
        last_used_at: None,
        expires_at: None,
    }
}

async fn open(dir: &tempfile::TempDir) -> Arc<FileStorage> {
    Arc::new(FileStorage::open(dir.path()).await.unwrap())
}

#[derive(Debug, Default)]
struct StubRenewer {
    fail: bool,
    renewals: AtomicUsize,
    revokes: AtomicUsize,
}

#[async_trait]
impl TokenRenewer for StubRenewer {
    async fn renew(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let n = self.renewals.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(AppError::authentication("Refresh token revoked"));
        }
        Ok(AuthTokens::from_expires_in(
            format!("access-{n}"),
            refresh_token.to_string(),
            900,
            Utc::now(),
        ))
    }

    async fn revoke(&self, _tokens: &AuthTokens) -> AppResult<()> {
        self.revokes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn coordinator(
    store: Arc<SessionStore>,
    storage: Arc<FileStorage>,
    renewer: Arc<StubRenewer>,
) -> RefreshCoordinator {
    RefreshCoordinator::new(
        store,
        TokenStore::new(storage),
        renewer,
        SessionBus::new(8),
        &SessionConfig::default(),
        "/auth/signin",
    )
}

/// One CLI process: its own handle on the storage directory, its own bus,
/// and a bridge to the other processes.
async fn process(
    dir: &tempfile::TempDir,
) -> (RefreshCoordinator, Arc<SessionStore>, StorageBridge) {
    let storage = open(dir).await;
    let store = Arc::new(SessionStore::hydrate(storage.clone()).await.unwrap());
    let bus = SessionBus::new(8);
    let bridge = StorageBridge::spawn(bus.clone(), storage.clone(), Duration::from_millis(20));
    let c = RefreshCoordinator::new(
        store.clone(),
        TokenStore::new(storage),
        Arc::new(StubRenewer::default()),
        bus,
        &SessionConfig::default(),
        "/auth/signin",
    );
    (c, store, bridge)
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let store = SessionStore::hydrate(open(&dir).await).await.unwrap();
    store.login(user(), Some(organization("o1"))).await.unwrap();
    store.set_current_project(Some(project("o1"))).await.unwrap();
    store.set_api_keys(vec![api_key()]).await.unwrap();
    drop(store);

    let restored = SessionStore::hydrate(open(&dir).await).await.unwrap();
    let state = restored.snapshot().await;
    assert!(state.is_authenticated);
    assert_eq!(state.user, Some(user()));
    assert_eq!(state.organization, Some(organization("o1")));
    assert_eq!(state.current_project, Some(project("o1")));
    assert!(state.api_keys.is_empty());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_switching_organization_clears_project() {
    let dir = tempfile::tempdir().unwrap();

    let store = SessionStore::hydrate(open(&dir).await).await.unwrap();
    store.login(user(), Some(organization("o1"))).await.unwrap();
    store.set_current_project(Some(project("o1"))).await.unwrap();
    store.set_organization(Some(organization("o2"))).await.unwrap();

    let restored = SessionStore::hydrate(open(&dir).await).await.unwrap();
    let state = restored.snapshot().await;
    assert_eq!(state.organization.map(|o| o.id), Some("o2".to_string()));
    assert!(state.current_project.is_none());
}

#[tokio::test]
async fn test_logout_removes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;

    let store = SessionStore::hydrate(storage.clone()).await.unwrap();
    store.login(user(), None).await.unwrap();
    assert!(storage.get_item(SESSION_STORAGE_KEY).await.unwrap().is_some());

    store.logout().await.unwrap();
    assert!(storage.get_item(SESSION_STORAGE_KEY).await.unwrap().is_none());

    let restored = SessionStore::hydrate(open(&dir).await).await.unwrap();
    assert!(!restored.is_authenticated().await);
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(SESSION_STORAGE_KEY), "{not json").unwrap();

    let store = SessionStore::hydrate(open(&dir).await).await.unwrap();
    assert!(!store.is_authenticated().await);
    assert!(store.user().await.is_none());
}

#[tokio::test]
async fn test_snapshot_never_contains_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;

    let store = SessionStore::hydrate(storage.clone()).await.unwrap();
    let tokens = TokenStore::new(storage.clone());
    tokens
        .save(&AuthTokens::from_expires_in(
            "secret-access".into(),
            "secret-refresh".into(),
            900,
            Utc::now(),
        ))
        .await
        .unwrap();
    store.login(user(), Some(organization("o1"))).await.unwrap();

    let snapshot = storage.get_item(SESSION_STORAGE_KEY).await.unwrap().unwrap();
    assert!(!snapshot.contains("secret-access"));
    assert!(!snapshot.contains("secret-refresh"));
    assert!(snapshot.contains("\"version\":1"));
}

#[tokio::test]
async fn test_refresh_persists_new_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;
    let store = Arc::new(SessionStore::hydrate(storage.clone()).await.unwrap());
    store.login(user(), None).await.unwrap();

    let renewer = Arc::new(StubRenewer::default());
    let c = coordinator(store, storage, renewer.clone());
    c.start(AuthTokens::from_expires_in(
        "access-0".into(),
        "refresh-0".into(),
        600,
        Utc::now(),
    ))
    .await
    .unwrap();
    assert!(c.state().is_scheduled());

    let outcome = c.refresh_now().await;
    assert!(matches!(outcome, RefreshOutcome::Renewed(_)));
    assert!(c.state().is_scheduled());

    let stored = TokenStore::new(open(&dir).await).load().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-1");
    assert_eq!(stored.refresh_token, "refresh-0");
    c.stop();
}

#[tokio::test]
async fn test_failed_renewal_clears_everything() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;
    let store = Arc::new(SessionStore::hydrate(storage.clone()).await.unwrap());
    store.login(user(), Some(organization("o1"))).await.unwrap();

    let renewer = Arc::new(StubRenewer {
        fail: true,
        ..StubRenewer::default()
    });
    let c = coordinator(store.clone(), storage.clone(), renewer);
    c.start(AuthTokens::from_expires_in(
        "access-0".into(),
        "refresh-0".into(),
        600,
        Utc::now(),
    ))
    .await
    .unwrap();

    let outcome = c.handle_unauthorized().await;
    assert_eq!(
        outcome,
        RefreshOutcome::Ended {
            redirect: "/auth/signin?reason=session_expired".to_string()
        }
    );
    assert!(matches!(c.state(), RefreshState::Expired { .. }));
    assert!(!store.is_authenticated().await);
    assert!(TokenStore::new(storage.clone()).load().await.unwrap().is_none());
    assert!(storage.get_item(SESSION_STORAGE_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_revokes_and_clears() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;
    let store = Arc::new(SessionStore::hydrate(storage.clone()).await.unwrap());
    store.login(user(), None).await.unwrap();

    let renewer = Arc::new(StubRenewer::default());
    let c = coordinator(store.clone(), storage.clone(), renewer.clone());
    c.start(AuthTokens::from_expires_in(
        "access-0".into(),
        "refresh-0".into(),
        600,
        Utc::now(),
    ))
    .await
    .unwrap();

    let location = c.logout().await.unwrap();
    assert_eq!(location, "/auth/signin");
    assert_eq!(renewer.revokes.load(Ordering::SeqCst), 1);
    assert_eq!(c.state(), RefreshState::Idle);
    assert!(!store.is_authenticated().await);

    let restored = SessionStore::hydrate(open(&dir).await).await.unwrap();
    assert!(!restored.is_authenticated().await);
    assert!(TokenStore::new(open(&dir).await).load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_resume_picks_up_stored_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;
    TokenStore::new(storage.clone())
        .save(&AuthTokens::from_expires_in(
            "access-0".into(),
            "refresh-0".into(),
            600,
            Utc::now(),
        ))
        .await
        .unwrap();

    let store = Arc::new(SessionStore::hydrate(storage.clone()).await.unwrap());
    let renewer = Arc::new(StubRenewer::default());
    let c = coordinator(store, storage, renewer.clone());

    let state = c.resume().await.unwrap();
    assert!(state.is_scheduled());
    assert_eq!(renewer.renewals.load(Ordering::SeqCst), 0);
    c.stop();
}

#[tokio::test]
async fn test_logout_reaches_other_process() {
    let dir = tempfile::tempdir().unwrap();
    let (a, a_store, _a_bridge) = process(&dir).await;
    a_store.login(user(), None).await.unwrap();
    a.start(AuthTokens::from_expires_in(
        "access-0".into(),
        "refresh-0".into(),
        600,
        Utc::now(),
    ))
    .await
    .unwrap();

    let (b, b_store, _b_bridge) = process(&dir).await;
    assert!(b_store.is_authenticated().await);
    assert!(b.resume().await.unwrap().is_scheduled());
    let mut b_states = b.subscribe_state();

    a.logout().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        b_states.wait_for(|s| {
            matches!(
                s,
                RefreshState::Expired {
                    reason: EndReason::SignedOut,
                    ..
                }
            )
        }),
    )
    .await
    .expect("other process never saw the logout")
    .unwrap();
    assert!(!b_store.is_authenticated().await);
    b.stop();
}
