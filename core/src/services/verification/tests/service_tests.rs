use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use vg_shared::config::{ActionLimit, RateLimitPolicy, VerificationPolicy};

use crate::domain::entities::audit::AuditEventType;
use crate::domain::entities::verification_request::{Purpose, RequestStatus, VerificationRequest};
use crate::errors::DomainError;
use crate::repositories::audit::MemoryAuditRepository;
use crate::repositories::verification::MemoryVerificationRepository;
use crate::repositories::{AuditRepository, VerificationRepository};
use crate::services::rate_limit::MemoryRateLimitStore;
use crate::services::token::TokenCodec;
use crate::services::verification::{
    CreateOutcome, ResendOutcome, VerificationService, VerifyOutcome,
};

const IP: &str = "203.0.113.7";

struct Harness {
    service: VerificationService<
        MemoryVerificationRepository,
        MemoryAuditRepository,
        MemoryRateLimitStore,
    >,
    requests: Arc<MemoryVerificationRepository>,
    audit: Arc<MemoryAuditRepository>,
}

fn harness(limits: RateLimitPolicy) -> Harness {
    let requests = Arc::new(MemoryVerificationRepository::new());
    let audit = Arc::new(MemoryAuditRepository::new());
    let store = Arc::new(MemoryRateLimitStore::new());
    let codec = TokenCodec::new(b"service-test-secret".to_vec(), 32).unwrap();
    let service = VerificationService::new(
        Arc::clone(&requests),
        Arc::clone(&audit),
        store,
        codec,
        VerificationPolicy::default(),
        limits,
    );
    Harness {
        service,
        requests,
        audit,
    }
}

/// Limits high enough that no test trips them unless it means to.
fn relaxed_limits() -> RateLimitPolicy {
    let wide = ActionLimit {
        ip_limit: 1000,
        ip_window_seconds: 3600,
        subject_limit: 1000,
        subject_window_seconds: 3600,
    };
    RateLimitPolicy {
        send: wide.clone(),
        resend: wide.clone(),
        verify_attempt: wide,
        resend_cooldown_seconds: 0,
        ..Default::default()
    }
}

async fn create(h: &Harness, subject: Uuid) -> crate::services::verification::IssuedVerification {
    match h
        .service
        .create_verification(subject, "user@example.com", Purpose::Signup, IP, None)
        .await
        .unwrap()
    {
        CreateOutcome::Created(issued) => issued,
        CreateOutcome::RateLimited { .. } => panic!("unexpected rate limit"),
    }
}

async fn event_types(h: &Harness, request_id: Uuid) -> Vec<AuditEventType> {
    h.audit
        .list_for_request(request_id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect()
}

#[tokio::test]
async fn create_stores_digest_not_raw_token() {
    let h = harness(relaxed_limits());
    let issued = create(&h, Uuid::new_v4()).await;

    let stored = h
        .requests
        .find_by_id(issued.request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_ne!(stored.token_digest, issued.raw_token);
    assert!(!stored.token_digest.contains(&issued.raw_token));
    assert_eq!(
        event_types(&h, issued.request_id).await,
        vec![AuditEventType::Created]
    );
}

#[tokio::test]
async fn create_rejects_invalid_address() {
    let h = harness(relaxed_limits());
    let result = h
        .service
        .create_verification(Uuid::new_v4(), "not-an-address", Purpose::Signup, IP, None)
        .await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert!(h.audit.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_supersedes_prior_active_request() {
    let h = harness(relaxed_limits());
    let subject = Uuid::new_v4();

    let first = create(&h, subject).await;
    let second = create(&h, subject).await;

    let old = h
        .requests
        .find_by_id(first.request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old.status, RequestStatus::Superseded);

    // The replaced token no longer verifies.
    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, &first.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        VerifyOutcome::InvalidToken {
            attempts_remaining: 4
        }
    );

    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, &second.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Success);
}

#[tokio::test]
async fn create_is_rate_limited_per_subject() {
    let mut limits = relaxed_limits();
    limits.send.subject_limit = 2;
    let h = harness(limits);
    let subject = Uuid::new_v4();

    create(&h, subject).await;
    create(&h, subject).await;

    let outcome = h
        .service
        .create_verification(subject, "user@example.com", Purpose::Signup, IP, None)
        .await
        .unwrap();
    match outcome {
        CreateOutcome::RateLimited { retry_after } => {
            assert!(retry_after.num_seconds() > 0);
        }
        CreateOutcome::Created(_) => panic!("third send must be limited"),
    }

    let rate_limited = h
        .audit
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.event_type == AuditEventType::RateLimited)
        .count();
    assert_eq!(rate_limited, 1);
}

#[tokio::test]
async fn verify_is_idempotent_after_success() {
    let h = harness(relaxed_limits());
    let subject = Uuid::new_v4();
    let issued = create(&h, subject).await;

    let first = h
        .service
        .verify_token(subject, Purpose::Signup, &issued.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(first, VerifyOutcome::Success);

    let second = h
        .service
        .verify_token(subject, Purpose::Signup, &issued.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(second, VerifyOutcome::AlreadyVerified);

    let types = event_types(&h, issued.request_id).await;
    let verified = types
        .iter()
        .filter(|t| **t == AuditEventType::Verified)
        .count();
    assert_eq!(verified, 1);
}

#[tokio::test]
async fn verify_unknown_pair_is_not_found() {
    let h = harness(relaxed_limits());
    let result = h
        .service
        .verify_token(Uuid::new_v4(), Purpose::Signup, "whatever", IP, None)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn wrong_tokens_count_down_then_lock() {
    let h = harness(relaxed_limits());
    let subject = Uuid::new_v4();
    let issued = create(&h, subject).await;

    for expected_remaining in [4u32, 3, 2, 1] {
        let outcome = h
            .service
            .verify_token(subject, Purpose::Signup, "wrong-token", IP, None)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::InvalidToken {
                attempts_remaining: expected_remaining
            }
        );
    }

    // Fifth failure trips the lockout.
    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, "wrong-token", IP, None)
        .await
        .unwrap();
    assert!(matches!(outcome, VerifyOutcome::Locked { .. }));

    // Even the correct token is refused while locked.
    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, &issued.raw_token, IP, None)
        .await
        .unwrap();
    match outcome {
        VerifyOutcome::Locked { retry_after } => {
            assert!(retry_after.num_seconds() > 0);
            assert!(retry_after.num_seconds() <= 3600);
        }
        other => panic!("expected locked, got {other:?}"),
    }

    let types = event_types(&h, issued.request_id).await;
    assert_eq!(
        types
            .iter()
            .filter(|t| **t == AuditEventType::FailedAttempt)
            .count(),
        4
    );
    assert_eq!(
        types
            .iter()
            .filter(|t| **t == AuditEventType::Locked)
            .count(),
        1
    );
}

#[tokio::test]
async fn expired_request_reports_expired_without_consuming_attempts() {
    let h = harness(relaxed_limits());
    let subject = Uuid::new_v4();

    // Insert a request whose token lifetime already ran out.
    let request = VerificationRequest::new(
        subject,
        "user@example.com",
        Purpose::Signup,
        "digest-of-a-dead-token",
        Duration::hours(-1),
        IP,
        None,
    );
    let request_id = request.id;
    h.requests.insert(request).await.unwrap();

    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, "anything", IP, None)
        .await
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Expired);

    let stored = h.requests.find_by_id(request_id).await.unwrap().unwrap();
    assert_eq!(stored.failed_attempts, 0);
    assert_eq!(
        event_types(&h, request_id).await,
        vec![AuditEventType::Expired]
    );
}

#[tokio::test]
async fn verify_attempts_are_rate_limited() {
    let mut limits = relaxed_limits();
    limits.verify_attempt.subject_limit = 1;
    let h = harness(limits);
    let subject = Uuid::new_v4();
    create(&h, subject).await;

    h.service
        .verify_token(subject, Purpose::Signup, "wrong-token", IP, None)
        .await
        .unwrap();
    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, "wrong-token", IP, None)
        .await
        .unwrap();
    assert!(matches!(outcome, VerifyOutcome::RateLimited { .. }));
}

#[tokio::test]
async fn resend_supersedes_and_resets_attempts() {
    let h = harness(relaxed_limits());
    let subject = Uuid::new_v4();
    let first = create(&h, subject).await;

    // Burn a couple of attempts against the original token.
    for _ in 0..2 {
        h.service
            .verify_token(subject, Purpose::Signup, "wrong-token", IP, None)
            .await
            .unwrap();
    }

    let second = match h
        .service
        .resend_verification(subject, Purpose::Signup, IP, None)
        .await
        .unwrap()
    {
        ResendOutcome::Resent(issued) => issued,
        other => panic!("expected resent, got {other:?}"),
    };
    assert_ne!(second.request_id, first.request_id);

    let old = h
        .requests
        .find_by_id(first.request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old.status, RequestStatus::Superseded);

    // The replacement starts with a clean counter.
    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, "wrong-token", IP, None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        VerifyOutcome::InvalidToken {
            attempts_remaining: 4
        }
    );

    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, &second.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Success);

    assert_eq!(
        event_types(&h, second.request_id)
            .await
            .first()
            .copied()
            .unwrap(),
        AuditEventType::Resent
    );
}

#[tokio::test]
async fn resend_without_active_request_is_not_found() {
    let h = harness(relaxed_limits());
    let result = h
        .service
        .resend_verification(Uuid::new_v4(), Purpose::Signup, IP, None)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn resend_respects_the_cooldown() {
    let mut limits = relaxed_limits();
    limits.resend_cooldown_seconds = 60;
    let h = harness(limits);
    let subject = Uuid::new_v4();
    let issued = create(&h, subject).await;

    let outcome = h
        .service
        .resend_verification(subject, Purpose::Signup, IP, None)
        .await
        .unwrap();
    match outcome {
        ResendOutcome::CooldownActive { retry_after } => {
            assert!(retry_after.num_seconds() <= 60);
            assert!(retry_after > Duration::zero());
        }
        other => panic!("expected cooldown, got {other:?}"),
    }

    // The original request is untouched and its token still works.
    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, &issued.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Success);
}

#[tokio::test]
async fn purposes_track_separate_requests() {
    let h = harness(relaxed_limits());
    let subject = Uuid::new_v4();

    let signup = create(&h, subject).await;
    let reset = match h
        .service
        .create_verification(subject, "user@example.com", Purpose::PasswordReset, IP, None)
        .await
        .unwrap()
    {
        CreateOutcome::Created(issued) => issued,
        CreateOutcome::RateLimited { .. } => panic!("unexpected rate limit"),
    };

    // Neither issuance superseded the other.
    let outcome = h
        .service
        .verify_token(subject, Purpose::Signup, &signup.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Success);
    let outcome = h
        .service
        .verify_token(subject, Purpose::PasswordReset, &reset.raw_token, IP, None)
        .await
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Success);
}
