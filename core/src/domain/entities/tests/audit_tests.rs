use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::audit::{AuditEvent, AuditEventType};

#[test]
fn event_type_round_trips_through_storage_form() {
    let all = [
        AuditEventType::Created,
        AuditEventType::Verified,
        AuditEventType::FailedAttempt,
        AuditEventType::Locked,
        AuditEventType::Expired,
        AuditEventType::Resent,
        AuditEventType::RateLimited,
        AuditEventType::ReminderSent,
    ];
    for event_type in all {
        assert_eq!(AuditEventType::parse(event_type.as_str()), Some(event_type));
    }
    assert_eq!(AuditEventType::parse("NO_SUCH_EVENT"), None);
}

#[test]
fn builder_attaches_context() {
    let request_id = Uuid::new_v4();
    let event = AuditEvent::new(AuditEventType::FailedAttempt, "203.0.113.9")
        .with_request(request_id)
        .with_agent(Some("agent/2.0"))
        .with_metadata(json!({ "attempts_remaining": 2 }));

    assert_eq!(event.request_id, Some(request_id));
    assert_eq!(event.ip.as_deref(), Some("203.0.113.9"));
    assert_eq!(event.user_agent.as_deref(), Some("agent/2.0"));
    assert_eq!(event.metadata.unwrap()["attempts_remaining"], 2);
}

#[test]
fn internal_event_has_no_ip() {
    let event = AuditEvent::internal(AuditEventType::ReminderSent);
    assert!(event.ip.is_none());
    assert!(event.user_agent.is_none());
}

#[test]
fn rate_limited_event_needs_no_request() {
    let event = AuditEvent::new(AuditEventType::RateLimited, "203.0.113.9");
    assert!(event.request_id.is_none());
}

#[test]
fn serialization_uses_screaming_snake_case() {
    let event = AuditEvent::new(AuditEventType::ReminderSent, "203.0.113.9");
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event_type"], "REMINDER_SENT");
}
