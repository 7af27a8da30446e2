//! Tests for login, token checks and referral link rotation.

use super::test_helpers::{TEST_LINK_EXPIRY, count, test_engine, test_jwt};
use super::{ErrorKind, GeneratorRegistration, ReferralEngine, ReferralError};
use crate::storage::RoleKind;

const PASSWORD: &str = "s3cret-pass";

async fn register(engine: &ReferralEngine, email: &str) -> GeneratorRegistration {
    engine.register_generator(email, PASSWORD).await.unwrap()
}

// === Login ===

#[tokio::test]
async fn login_issues_token_for_generator() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;

    let token = engine.login("alice@example.com", PASSWORD).await.unwrap();
    let claims = test_jwt().validate(&token).unwrap();
    assert_eq!(claims.sub, reg.user.id);
    assert_eq!(claims.role_id, reg.role.id);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let engine = test_engine().await;
    register(&engine, "alice@example.com").await;

    let wrong_password = engine
        .login("alice@example.com", "nope")
        .await
        .unwrap_err();
    let unknown_email = engine
        .login("nobody@example.com", PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, ReferralError::InvalidCredentials));
    assert!(matches!(unknown_email, ReferralError::InvalidCredentials));
    assert_eq!(
        wrong_password.public_message(),
        unknown_email.public_message()
    );
    assert_eq!(wrong_password.http_status(), 401);
}

#[tokio::test]
async fn contributor_cannot_log_in() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;
    engine
        .register_contributor("bob@example.com", &reg.referral_link.code)
        .await
        .unwrap();

    let err = engine.login("bob@example.com", "").await.unwrap_err();
    assert!(matches!(err, ReferralError::InvalidCredentials));
}

#[tokio::test]
async fn corrupt_stored_hash_is_an_infrastructure_error() {
    let engine = test_engine().await;
    register(&engine, "alice@example.com").await;
    sqlx::query("UPDATE users SET password_hash = 'garbage'")
        .execute(engine.database().pool())
        .await
        .unwrap();

    let err = engine
        .login("alice@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert_eq!(err.public_message(), "something went wrong");
}

// === Authenticate ===

#[tokio::test]
async fn authenticate_rejects_foreign_tokens() {
    let engine = test_engine().await;
    let foreign = crate::auth::JwtManager::new(b"other-secret", 3600)
        .issue_token("u", "r")
        .unwrap();

    assert!(matches!(
        engine.authenticate(&foreign),
        Err(ReferralError::Unauthorized)
    ));
    assert!(matches!(
        engine.authenticate("garbage"),
        Err(ReferralError::Unauthorized)
    ));
}

// === Rotation ===

#[tokio::test]
async fn rotation_retires_old_link_and_keeps_history() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;
    let old = reg.referral_link;
    engine
        .register_contributor("bob@example.com", &old.code)
        .await
        .unwrap();

    let new = engine.rotate_referral_link(&reg.token).await.unwrap();
    assert_ne!(new.id, old.id);
    assert_ne!(new.code, old.code);
    assert_eq!(new.generator_id, reg.user.id);
    assert_eq!(new.expired_at, TEST_LINK_EXPIRY);

    let history = engine
        .database()
        .list_referral_links(&reg.user.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|l| l.is_active()).count(), 1);
    assert!(history.iter().any(|l| l.id == old.id && !l.is_active()));

    // Contributions against the retired link survive.
    assert_eq!(count(&engine, "contributions").await, 1);
}

#[tokio::test]
async fn rotated_code_is_redeemable() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;
    let new = engine.rotate_referral_link(&reg.token).await.unwrap();

    engine
        .register_contributor("bob@example.com", &new.code)
        .await
        .unwrap();

    let err = engine
        .register_contributor("alice@example.com", &new.code)
        .await
        .unwrap_err();
    assert!(matches!(err, ReferralError::CantReferToOwnCode));
}

#[tokio::test]
async fn rotation_requires_valid_token() {
    let engine = test_engine().await;
    register(&engine, "alice@example.com").await;

    let err = engine.rotate_referral_link("garbage").await.unwrap_err();
    assert!(matches!(err, ReferralError::Unauthorized));
    assert_eq!(err.http_status(), 401);
    assert_eq!(count(&engine, "referral_links").await, 1);
}

#[tokio::test]
async fn rotation_rejects_contributor_token() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;
    let bob = engine
        .register_contributor("bob@example.com", &reg.referral_link.code)
        .await
        .unwrap();
    let token = test_jwt().issue_token(&bob.id, &bob.role_id).unwrap();

    let err = engine.rotate_referral_link(&token).await.unwrap_err();
    assert!(matches!(err, ReferralError::Unauthorized));
    assert_eq!(count(&engine, "referral_links").await, 1);
}

#[tokio::test]
async fn rotation_rejects_token_for_deleted_user() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;
    sqlx::query("UPDATE users SET deleted_at = 1")
        .execute(engine.database().pool())
        .await
        .unwrap();

    let err = engine.rotate_referral_link(&reg.token).await.unwrap_err();
    assert!(matches!(err, ReferralError::Unauthorized));
}

#[tokio::test]
async fn rotation_rejects_mismatched_role_claim() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;
    let contributor_role = engine
        .database()
        .get_role_by_name(RoleKind::Contributor)
        .await
        .unwrap()
        .unwrap();
    let token = test_jwt()
        .issue_token(&reg.user.id, &contributor_role.id)
        .unwrap();

    let err = engine.rotate_referral_link(&token).await.unwrap_err();
    assert!(matches!(err, ReferralError::Unauthorized));
}

// === Active link ===

#[tokio::test]
async fn active_link_follows_rotation() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;

    let current = engine.active_referral_link(&reg.token).await.unwrap();
    assert_eq!(current.id, reg.referral_link.id);

    let rotated = engine.rotate_referral_link(&reg.token).await.unwrap();
    let current = engine.active_referral_link(&reg.token).await.unwrap();
    assert_eq!(current.id, rotated.id);
}

#[tokio::test]
async fn active_link_missing_is_not_found() {
    let engine = test_engine().await;
    let reg = register(&engine, "alice@example.com").await;
    sqlx::query("UPDATE referral_links SET deleted_at = 1")
        .execute(engine.database().pool())
        .await
        .unwrap();

    let err = engine.active_referral_link(&reg.token).await.unwrap_err();
    assert!(matches!(err, ReferralError::ReferralCodeNotFound));
}
