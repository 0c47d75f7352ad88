//! Credential checks and session synchronization against the mock gateway.

use std::sync::Arc;
use std::time::Duration;

use campus_market::adapters::MockAuthGateway;
use campus_market::application::{AuthService, AuthSynchronizer};
use campus_market::domain::foundation::{DataError, UserId, ValidationError};
use campus_market::domain::session::{AuthChange, Identity, InstitutionEmail, SessionState};
use campus_market::ports::SignUpProfile;

fn identity(email: &str) -> Identity {
    Identity::new(UserId::random(), email)
}

#[tokio::test]
async fn foreign_domain_sign_up_fails_before_any_call() {
    let gateway = Arc::new(MockAuthGateway::new());
    let auth = AuthService::new(gateway.clone(), InstitutionEmail::new("mtroyal.ca"));

    let error = auth
        .sign_up("user@gmail.com", "secret-pass", &SignUpProfile::default())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DataError::Validation(ValidationError::DisallowedDomain { .. })
    ));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn institution_sign_up_reaches_the_gateway() {
    let gateway = Arc::new(MockAuthGateway::new());
    let auth = AuthService::new(gateway.clone(), InstitutionEmail::new("mtroyal.ca"));

    let outcome = auth
        .sign_up("user@mtroyal.ca", "secret-pass", &SignUpProfile::default())
        .await
        .unwrap();

    assert_eq!(outcome, None);
    assert_eq!(gateway.calls(), vec!["sign_up"]);
}

#[tokio::test]
async fn sign_out_wins_over_a_late_initial_fetch() {
    let gateway = Arc::new(MockAuthGateway::new().with_session(identity("sam@mtroyal.ca")));
    let release = gateway.hold_current_identity();

    let sync = AuthSynchronizer::start(gateway.clone());
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(sync.is_loading());

    gateway.emit(AuthChange::SignedOut);
    assert_eq!(sync.settled().await, SessionState::Unauthenticated);

    release.send(()).ok();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(sync.state(), SessionState::Unauthenticated);
    sync.teardown().await;
}

#[tokio::test]
async fn sign_in_and_out_drive_the_session() {
    let who = identity("sam@mtroyal.ca");
    let gateway = Arc::new(MockAuthGateway::new().with_account("sam@mtroyal.ca", "secret-pass", who.clone()));
    let auth = AuthService::new(gateway.clone(), InstitutionEmail::new("mtroyal.ca"));
    let sync = AuthSynchronizer::start(gateway);
    assert_eq!(sync.settled().await, SessionState::Unauthenticated);

    let mut watch = sync.watch();
    auth.sign_in("sam@mtroyal.ca", "secret-pass").await.unwrap();
    watch.changed().await.unwrap();
    assert_eq!(sync.identity(), Some(who));

    auth.sign_out().await.unwrap();
    watch.changed().await.unwrap();
    assert_eq!(sync.state(), SessionState::Unauthenticated);
    sync.teardown().await;
}

#[tokio::test]
async fn wrong_password_keeps_the_backend_envelope() {
    let gateway = Arc::new(
        MockAuthGateway::new().with_account("sam@mtroyal.ca", "secret-pass", identity("sam@mtroyal.ca")),
    );
    let auth = AuthService::new(gateway, InstitutionEmail::new("mtroyal.ca"));

    match auth.sign_in("sam@mtroyal.ca", "guessing-wrong").await.unwrap_err() {
        DataError::Backend(envelope) => {
            assert_eq!(envelope.status, 400);
            assert_eq!(envelope.code.as_deref(), Some("invalid_credentials"));
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}
