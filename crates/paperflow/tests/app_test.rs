use std::sync::Arc;

use paperflow::PaperflowApp;
use paperflow_api::{DocType, SectionDraft};
use paperflow_client::{
    AuthError, AuthProvider, DataStore, MemoryAuth, MemoryStore, SignUpOutcome, TableKind,
};
use serde_json::json;

const PASSWORD: &str = "secret123";

fn app_with(auth: Arc<MemoryAuth>) -> (Arc<MemoryStore>, PaperflowApp) {
    let store = Arc::new(MemoryStore::new());
    let app = PaperflowApp::new(auth, store.clone(), "Kari");
    (store, app)
}

#[tokio::test]
async fn test_signed_out_has_no_workspace() {
    let (_store, app) = app_with(Arc::new(MemoryAuth::new()));

    assert!(app.session().is_none());
    assert!(app.workspace().is_none());
    // refresh without a workspace does nothing
    app.refresh().await;
}

#[tokio::test]
async fn test_sign_in_opens_loaded_workspace() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    let (_store, app) = app_with(auth);

    let workspace = app.sign_in("kari@example.com", PASSWORD).await.unwrap();

    assert_eq!(workspace.acting_user(), "kari@example.com");
    assert!(!workspace.with_state(|s| s.is_loading()));
    assert!(Arc::ptr_eq(&workspace, &app.workspace().unwrap()));
}

#[tokio::test]
async fn test_bad_password_keeps_signed_out() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    let (_store, app) = app_with(auth);

    let err = app.sign_in("kari@example.com", "wrong-pass").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials(_)));
    assert!(app.workspace().is_none());
}

#[tokio::test]
async fn test_sign_out_drops_workspace() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    let (_store, app) = app_with(auth);
    app.sign_in("kari@example.com", PASSWORD).await.unwrap();

    app.sign_out().await.unwrap();

    assert!(app.session().is_none());
    assert!(app.workspace().is_none());
}

#[tokio::test]
async fn test_next_user_sees_shared_rows() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    auth.register("ola@example.com", PASSWORD);
    let (store, app) = app_with(auth);

    let first = app.sign_in("kari@example.com", PASSWORD).await.unwrap();
    first
        .add_section(SectionDraft::new(
            DocType::Handbook,
            "2.3",
            "Sick leave",
            "Report before nine",
        ))
        .await
        .unwrap();
    app.sign_out().await.unwrap();

    let second = app.sign_in("ola@example.com", PASSWORD).await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.acting_user(), "ola@example.com");
    assert_eq!(store.count(TableKind::Sections), 1);
    second.with_state(|s| {
        assert_eq!(s.sections().len(), 1);
        assert_eq!(s.sections()[0].title, "Sick leave");
    });
}

#[tokio::test]
async fn test_same_user_keeps_workspace() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    let (_store, app) = app_with(auth);

    let first = app.sign_in("kari@example.com", PASSWORD).await.unwrap();
    let again = app.sign_in("kari@example.com", PASSWORD).await.unwrap();

    assert!(Arc::ptr_eq(&first, &again));
}

async fn seed_section(store: &MemoryStore, title: &str) {
    store
        .insert(
            TableKind::Sections,
            vec![json!({
                "doc_type": "contract",
                "section_number": "1",
                "title": title,
                "body": "text",
                "sort_order": 1
            })],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_existing_session_loads_workspace() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    auth.sign_in_with_password("kari@example.com", PASSWORD)
        .await
        .unwrap();
    let store = Arc::new(MemoryStore::new());
    seed_section(&store, "Scope").await;

    let app = PaperflowApp::new(auth, store, "Kari");

    let workspace = app.ready().await.unwrap();
    assert_eq!(workspace.acting_user(), "kari@example.com");
    assert!(!workspace.with_state(|s| s.is_loading()));
    workspace.with_state(|s| assert_eq!(s.sections()[0].title, "Scope"));
}

#[tokio::test]
async fn test_sign_in_through_provider_loads_workspace() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    let store = Arc::new(MemoryStore::new());
    seed_section(&store, "Scope").await;
    let app = PaperflowApp::new(auth.clone(), store, "Kari");

    auth.sign_in_with_password("kari@example.com", PASSWORD)
        .await
        .unwrap();

    let workspace = app.ready().await.unwrap();
    assert!(Arc::ptr_eq(&workspace, &app.workspace().unwrap()));
    workspace.with_state(|s| {
        assert!(!s.is_loading());
        assert_eq!(s.sections().len(), 1);
    });
}

#[tokio::test]
async fn test_ready_without_runtime_loads_inline() {
    let auth = Arc::new(MemoryAuth::new());
    auth.register("kari@example.com", PASSWORD);
    auth.sign_in_with_password("kari@example.com", PASSWORD)
        .await
        .unwrap();
    let store = Arc::new(MemoryStore::new());
    seed_section(&store, "Scope").await;

    // built off the runtime, so no background load is started
    let app = std::thread::spawn(move || PaperflowApp::new(auth, store, "Kari"))
        .join()
        .unwrap();
    assert!(app.workspace().unwrap().with_state(|s| s.is_loading()));

    let workspace = app.ready().await.unwrap();
    assert!(!workspace.with_state(|s| s.is_loading()));
}

#[tokio::test]
async fn test_ready_when_signed_out() {
    let (_store, app) = app_with(Arc::new(MemoryAuth::new()));

    assert!(app.ready().await.is_none());
}

#[tokio::test]
async fn test_sign_up_with_confirmation() {
    let auth = Arc::new(MemoryAuth::with_confirmation());
    let (_store, app) = app_with(auth.clone());

    let outcome = app.sign_up("new@example.com", PASSWORD).await.unwrap();

    assert_eq!(
        outcome,
        SignUpOutcome::ConfirmationRequired {
            email: "new@example.com".to_string()
        }
    );
    assert!(app.workspace().is_none());

    assert!(auth.confirm("new@example.com"));
    let workspace = app.sign_in("new@example.com", PASSWORD).await.unwrap();
    assert_eq!(workspace.acting_user(), "new@example.com");
}

#[tokio::test]
async fn test_sign_up_signs_in() {
    let (_store, app) = app_with(Arc::new(MemoryAuth::new()));

    let outcome = app.sign_up("new@example.com", PASSWORD).await.unwrap();

    assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
    let workspace = app.workspace().unwrap();
    assert!(!workspace.with_state(|s| s.is_loading()));
}

#[tokio::test]
async fn test_drop_unsubscribes() {
    let auth = Arc::new(MemoryAuth::new());
    let hub = auth.hub();
    let (_store, app) = app_with(auth);
    assert_eq!(hub.listener_count(), 1);

    drop(app);

    assert_eq!(hub.listener_count(), 0);
}
