use std::sync::Arc;

use authgate::auth::{FORGOT_PASSWORD_MESSAGE, RESET_PASSWORD_MESSAGE};
use authgate::{
    AuthApi, AuthError, AuthGuard, MemoryStorage, MockAuthEngine, RouteDecision, Settings,
    TokenStore,
};

const EMAIL: &str = "demo@example.com";
const PASSWORD: &str = "Password123";

fn setup_engine() -> (Arc<TokenStore>, MockAuthEngine) {
    let settings = Settings::new_for_test().expect("Failed to load test settings");
    let store = Arc::new(TokenStore::new(Box::new(MemoryStorage::new())));
    let engine = MockAuthEngine::new(store.clone(), &settings);
    (store, engine)
}

async fn login_and_verify(store: &Arc<TokenStore>, engine: &MockAuthEngine) -> String {
    let res = engine.login(EMAIL, PASSWORD).await.expect("login");
    assert_eq!(res.requires_otp, Some(true));
    assert!(store.otp_challenge().is_some());

    let otp = engine.issued_otp().await.expect("issued otp");
    let res = engine.verify_otp(EMAIL, &otp).await.expect("verify otp");
    res.token.expect("session token")
}

#[tokio::test]
async fn test_login_then_verify_otp_authenticates() {
    let (store, engine) = setup_engine();

    let res = engine.login(EMAIL, PASSWORD).await.expect("login");
    assert_eq!(res.requires_otp, Some(true));
    assert!(res.token.is_none());
    let challenge = res.otp_token.expect("challenge token");
    assert!(challenge.starts_with("otp_"));
    assert_eq!(store.otp_challenge().as_deref(), Some(challenge.as_str()));

    // Not authenticated until the second factor
    assert!(!engine.is_authenticated());

    let otp = engine.issued_otp().await.expect("issued otp");
    assert_eq!(otp.len(), 6);

    let res = engine.verify_otp(EMAIL, &otp).await.expect("verify otp");
    let token = res.token.expect("session token");
    assert!(token.starts_with("jwt_"));
    assert!(!token.is_empty());

    assert!(engine.is_authenticated());
    assert_eq!(store.token(), Some(token));
    // Challenge is consumed
    assert_eq!(store.otp_challenge(), None);
}

#[tokio::test]
async fn test_invalid_credentials_leave_store_untouched() {
    let (store, engine) = setup_engine();

    let err = engine.login(EMAIL, "wrong").await.expect_err("must fail");
    assert_eq!(err, AuthError::InvalidCredentials);
    assert_eq!(err.status(), 401);
    assert_eq!(err.to_string(), "Invalid credentials");

    assert!(!engine.is_authenticated());
    assert_eq!(store.token(), None);
    assert_eq!(store.otp_challenge(), None);

    let err = engine
        .login("nobody@example.com", PASSWORD)
        .await
        .expect_err("must fail");
    assert_eq!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn test_verify_otp_without_login_fails_with_400() {
    let (_store, engine) = setup_engine();

    let err = engine
        .verify_otp(EMAIL, "123456")
        .await
        .expect_err("must fail");
    assert_eq!(err, AuthError::InvalidOtpToken);
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_wrong_otp_code_fails_but_challenge_survives() {
    let (_store, engine) = setup_engine();

    engine.login(EMAIL, PASSWORD).await.expect("login");
    let otp = engine.issued_otp().await.expect("issued otp");
    let wrong = if otp == "123456" { "654321" } else { "123456" };

    let err = engine.verify_otp(EMAIL, wrong).await.expect_err("must fail");
    assert_eq!(err, AuthError::InvalidOtpCode);
    assert_eq!(err.status(), 401);
    assert!(!engine.is_authenticated());

    // A failed code attempt does not consume the challenge
    let res = engine.verify_otp(EMAIL, &otp).await.expect("verify otp");
    assert!(res.token.is_some());
    assert!(engine.is_authenticated());
}

#[tokio::test]
async fn test_otp_challenge_is_single_use() {
    let (_store, engine) = setup_engine();

    engine.login(EMAIL, PASSWORD).await.expect("login");
    let otp = engine.issued_otp().await.expect("issued otp");
    engine.verify_otp(EMAIL, &otp).await.expect("verify otp");

    // Replaying the same code after success hits the missing-challenge path
    let err = engine.verify_otp(EMAIL, &otp).await.expect_err("must fail");
    assert_eq!(err, AuthError::InvalidOtpToken);
}

#[tokio::test]
async fn test_second_login_overwrites_pending_challenge() {
    let (store, engine) = setup_engine();

    let first = engine.login(EMAIL, PASSWORD).await.expect("login");
    let first_challenge = first.otp_token.expect("challenge");

    let second = engine.login(EMAIL, PASSWORD).await.expect("login");
    let second_challenge = second.otp_token.expect("challenge");

    assert_ne!(first_challenge, second_challenge);
    assert_eq!(
        store.otp_challenge().as_deref(),
        Some(second_challenge.as_str())
    );

    // Only the latest challenge verifies
    let otp = engine.issued_otp().await.expect("issued otp");
    let res = engine.verify_otp(EMAIL, &otp).await.expect("verify otp");
    assert!(res.token.is_some());
}

#[tokio::test]
async fn test_forgot_password_never_signals_account_existence() {
    let (_store, engine) = setup_engine();

    let known = engine.forgot_password(EMAIL).await.expect("forgot");
    let unknown = engine
        .forgot_password("nobody@example.com")
        .await
        .expect("forgot");

    assert_eq!(known.message, FORGOT_PASSWORD_MESSAGE);
    assert_eq!(known.message, unknown.message);

    // No token is ever minted for an unknown email
    assert!(engine.issued_reset_token(EMAIL).await.is_some());
    assert!(engine
        .issued_reset_token("nobody@example.com")
        .await
        .is_none());
}

#[tokio::test]
async fn test_reset_password_updates_credential_once() {
    let (_store, engine) = setup_engine();

    engine.forgot_password(EMAIL).await.expect("forgot");
    let token = engine.issued_reset_token(EMAIL).await.expect("reset token");
    assert!(token.starts_with("reset_"));

    let res = engine
        .reset_password(&token, "NewPassword456")
        .await
        .expect("reset");
    assert_eq!(res.message, RESET_PASSWORD_MESSAGE);

    // Token was consumed atomically with the reset
    let err = engine
        .reset_password(&token, "EvenNewer789")
        .await
        .expect_err("must fail");
    assert_eq!(err, AuthError::InvalidResetToken);
    assert_eq!(err.status(), 400);

    // The old password is gone, the new one works
    let err = engine.login(EMAIL, PASSWORD).await.expect_err("must fail");
    assert_eq!(err, AuthError::InvalidCredentials);
    let res = engine.login(EMAIL, "NewPassword456").await.expect("login");
    assert_eq!(res.requires_otp, Some(true));
}

#[tokio::test]
async fn test_reset_password_with_unknown_token_fails() {
    let (_store, engine) = setup_engine();

    let err = engine
        .reset_password("reset_neverissued", "NewPassword456")
        .await
        .expect_err("must fail");
    assert_eq!(err, AuthError::InvalidResetToken);
}

#[tokio::test]
async fn test_new_forgot_password_invalidates_previous_token() {
    let (_store, engine) = setup_engine();

    engine.forgot_password(EMAIL).await.expect("forgot");
    let first = engine.issued_reset_token(EMAIL).await.expect("token");

    engine.forgot_password(EMAIL).await.expect("forgot");
    let second = engine.issued_reset_token(EMAIL).await.expect("token");
    assert_ne!(first, second);

    // The overwritten token is invalid immediately
    let err = engine
        .reset_password(&first, "NewPassword456")
        .await
        .expect_err("must fail");
    assert_eq!(err, AuthError::InvalidResetToken);

    engine
        .reset_password(&second, "NewPassword456")
        .await
        .expect("reset");
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let (store, engine) = setup_engine();

    // Logging out while anonymous is a no-op
    engine.logout();
    assert!(!engine.is_authenticated());

    login_and_verify(&store, &engine).await;
    assert!(engine.is_authenticated());

    engine.logout();
    assert!(!engine.is_authenticated());
    assert_eq!(store.token(), None);
    assert_eq!(store.otp_challenge(), None);

    engine.logout();
    assert!(!engine.is_authenticated());
}

#[tokio::test]
async fn test_authenticated_flag_is_observable() {
    let (store, engine) = setup_engine();
    let mut rx = store.watch_authenticated();
    assert!(!*rx.borrow_and_update());

    login_and_verify(&store, &engine).await;
    assert!(rx.has_changed().expect("store alive"));
    assert!(*rx.borrow_and_update());

    engine.logout();
    assert!(!*rx.borrow_and_update());
}

#[tokio::test]
async fn test_guard_follows_session_lifecycle() {
    let settings = Settings::new_for_test().expect("Failed to load test settings");
    let store = Arc::new(TokenStore::new(Box::new(MemoryStorage::new())));
    let engine: Arc<dyn AuthApi> = Arc::new(MockAuthEngine::new(store.clone(), &settings));
    let guard = AuthGuard::new(engine.clone(), "/auth/login");

    assert_eq!(
        guard.check(),
        RouteDecision::Redirect("/auth/login".to_string())
    );

    // Pending challenge still denies entry
    engine.login(EMAIL, PASSWORD).await.expect("login");
    assert_eq!(
        guard.check(),
        RouteDecision::Redirect("/auth/login".to_string())
    );
    // The guard never consumed the challenge
    assert!(store.otp_challenge().is_some());

    store.set_token("jwt_manual");
    assert_eq!(guard.check(), RouteDecision::Allow);

    engine.logout();
    assert_eq!(
        guard.check(),
        RouteDecision::Redirect("/auth/login".to_string())
    );
}
