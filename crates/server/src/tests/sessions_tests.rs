use super::*;

fn store(max_sessions: usize) -> SessionStore {
    SessionStore::new(
        QuestionSet::new(["Q1", "Q2"]).expect("set"),
        LetterFraming::default(),
        SessionLimits {
            max_sessions,
            idle_ttl: Duration::minutes(30),
        },
    )
}

#[tokio::test]
async fn sessions_are_isolated() {
    let store = store(8);
    let alice = store.create().await.expect("alice");
    let bob = store.create().await.expect("bob");

    store
        .with_session(alice, |s| s.begin("alice-key"))
        .await
        .expect("session")
        .expect("begin");

    let bob_step = store.with_session(bob, |s| s.step()).await.expect("bob");
    let alice_step = store.with_session(alice, |s| s.step()).await.expect("alice");
    assert_eq!(bob_step, 0);
    assert_eq!(alice_step, 1);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let store = store(8);
    let err = store
        .with_session(SessionId::new(), |s| s.step())
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn full_store_rejects_new_sessions() {
    let store = store(1);
    store.create().await.expect("first");
    let err = store.create().await.expect_err("full");
    assert_eq!(err.code, ErrorCode::RateLimited);
}

#[tokio::test]
async fn idle_sessions_expire_and_free_capacity() {
    let store = store(1);
    let old = store.create().await.expect("first");

    assert_eq!(store.purge_expired(Utc::now()).await, 0);
    let later = Utc::now() + Duration::minutes(31);
    assert_eq!(store.purge_expired(later).await, 1);
    assert_eq!(store.len().await, 0);

    let err = store.with_session(old, |s| s.step()).await.expect_err("gone");
    assert_eq!(err.code, ErrorCode::NotFound);
    store.create().await.expect("capacity freed");
}

#[tokio::test]
async fn removed_session_is_gone() {
    let store = store(4);
    let id = store.create().await.expect("create");
    assert!(store.remove(id).await);
    assert!(!store.remove(id).await);
}
