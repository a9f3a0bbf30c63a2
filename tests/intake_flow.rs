//! End-to-end intake flow through the public API: engine, store, gate,
//! generator and status routes, backed by a file database.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use nutrikids::channels::{IncomingMessage, MessageFormat, OutgoingResponse};
use nutrikids::config::SubscriptionOffer;
use nutrikids::error::LlmError;
use nutrikids::intake::{
    IntakeEngine, IntakePhase, StatusRouteState, SubscriptionStatus, status_routes,
};
use nutrikids::llm::TextGenerator;
use nutrikids::store::{LibSqlBackend, ProfileStore};

/// Records every prompt it is given.
#[derive(Default)]
struct PromptLog {
    prompts: std::sync::Mutex<Vec<String>>,
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for PromptLog {
    fn model_name(&self) -> &str {
        "prompt-log"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("🍽️ *RECEITA 1: Panqueca Colorida*".to_string())
    }
}

async fn send(engine: &IntakeEngine, user: &str, text: &str) -> Vec<OutgoingResponse> {
    let msg = IncomingMessage::new("telegram", user, text).with_user_name("Ana");
    engine.handle(&msg).await.expect("turn should succeed")
}

#[tokio::test]
async fn intake_to_subscription_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nutrikids.db");
    let llm = Arc::new(PromptLog::default());

    {
        let store: Arc<dyn ProfileStore> = Arc::new(LibSqlBackend::new_local(&db_path).await.unwrap());
        let engine = IntakeEngine::new(
            Arc::clone(&store),
            llm.clone(),
            SubscriptionOffer::default(),
            3,
        );

        let welcome = send(&engine, "100", "/start").await;
        assert!(welcome[0].keyboard.is_some());

        send(&engine, "100", "Maria 3 anos").await;
        send(&engine, "100", "nugget, macarrão").await;
        let replies = send(&engine, "100", "brócolis, cenoura").await;

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[1].format, MessageFormat::Markdown);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);

        let prompt = llm.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Criança: Maria, 3 anos"));
        assert!(prompt.contains("ACEITA: nugget, macarrão"));
        assert!(prompt.contains("RECUSA: brócolis, cenoura"));
    }

    // Reopen the same file: state survives, and the flow continues.
    let store: Arc<dyn ProfileStore> = Arc::new(LibSqlBackend::new_local(&db_path).await.unwrap());
    let engine = IntakeEngine::new(
        Arc::clone(&store),
        llm.clone(),
        SubscriptionOffer::default(),
        3,
    );

    let profile = store.find("100").await.unwrap().unwrap();
    assert_eq!(profile.phase, IntakePhase::Ready);
    assert_eq!(profile.trial_usage_count, 1);

    send(&engine, "100", "mais").await;
    send(&engine, "100", "mais").await;
    let blocked = send(&engine, "100", "mais").await;
    assert_eq!(blocked.len(), 1);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 3);

    send(&engine, "100", "ana@example.com").await;
    let replies = send(&engine, "100", "mais").await;
    assert_eq!(replies.len(), 3);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 4);

    let profile = store.find("100").await.unwrap().unwrap();
    assert_eq!(profile.status, SubscriptionStatus::Subscribed);
    assert_eq!(profile.trial_usage_count, 3);
    assert!(profile.subscribed_at.is_some());

    // Status API sees the same record.
    let app = status_routes(StatusRouteState {
        store: Arc::clone(&store),
    });
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/profiles/100")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "subscribed");
    assert_eq!(body["activation_email"], "ana@example.com");
}

#[tokio::test]
async fn subjects_do_not_share_state() {
    let store: Arc<dyn ProfileStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let engine = IntakeEngine::new(
        Arc::clone(&store),
        Arc::new(PromptLog::default()),
        SubscriptionOffer::default(),
        3,
    );

    send(&engine, "a", "Maria, 3 anos").await;
    send(&engine, "b", "João, 5 anos").await;
    send(&engine, "a", "arroz").await;

    let a = store.find("a").await.unwrap().unwrap();
    let b = store.find("b").await.unwrap().unwrap();
    assert_eq!(a.phase, IntakePhase::AwaitingRejectedFoods);
    assert_eq!(b.phase, IntakePhase::AwaitingAcceptedFoods);
    assert_eq!(b.child_name.as_deref(), Some("João"));
    assert_eq!(b.accepted_foods, None);
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let store = LibSqlBackend::new_memory().await.unwrap();

    let (first, created) = store.get_or_create("same").await.unwrap();
    assert!(created);
    let (second, created) = store.get_or_create("same").await.unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);
}
