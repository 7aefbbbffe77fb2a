//! Audit event entity: immutable facts about verification activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Event types recorded by the verification engine.
///
/// Exactly one event is emitted per state transition or policy
/// rejection; external analytics consume the stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// A new verification request was issued
    Created,
    /// A token was verified successfully
    Verified,
    /// A wrong token was presented
    FailedAttempt,
    /// Repeated failures locked the request
    Locked,
    /// A verification attempt hit an expired request
    Expired,
    /// A replacement token was issued
    Resent,
    /// A call was rejected by the rate limiter or cooldown
    RateLimited,
    /// A pending-request reminder was dispatched
    ReminderSent,
}

impl AuditEventType {
    /// String representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Verified => "VERIFIED",
            Self::FailedAttempt => "FAILED_ATTEMPT",
            Self::Locked => "LOCKED",
            Self::Expired => "EXPIRED",
            Self::Resent => "RESENT",
            Self::RateLimited => "RATE_LIMITED",
            Self::ReminderSent => "REMINDER_SENT",
        }
    }

    /// Parse from the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "VERIFIED" => Some(Self::Verified),
            "FAILED_ATTEMPT" => Some(Self::FailedAttempt),
            "LOCKED" => Some(Self::Locked),
            "EXPIRED" => Some(Self::Expired),
            "RESENT" => Some(Self::Resent),
            "RATE_LIMITED" => Some(Self::RateLimited),
            "REMINDER_SENT" => Some(Self::ReminderSent),
            _ => None,
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    /// Unique identifier for the event
    pub id: Uuid,

    /// Request the event concerns; absent for pre-creation rejections
    pub request_id: Option<Uuid>,

    /// What happened
    pub event_type: AuditEventType,

    /// When it happened
    pub occurred_at: DateTime<Utc>,

    /// IP address of the triggering call; absent for events raised by
    /// internal machinery such as the reminder scheduler
    pub ip: Option<String>,

    /// User agent of the triggering call
    pub user_agent: Option<String>,

    /// Free-form context (action names, counters, masked addresses)
    pub metadata: Option<JsonValue>,
}

impl AuditEvent {
    /// Create a new event for the given type and source IP.
    pub fn new(event_type: AuditEventType, ip: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: None,
            event_type,
            occurred_at: Utc::now(),
            ip: Some(ip.into()),
            user_agent: None,
            metadata: None,
        }
    }

    /// Create an event with no originating call, e.g. scheduler output.
    pub fn internal(event_type: AuditEventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: None,
            event_type,
            occurred_at: Utc::now(),
            ip: None,
            user_agent: None,
            metadata: None,
        }
    }

    /// Attach the request this event concerns.
    pub fn with_request(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Attach the calling user agent.
    pub fn with_agent(mut self, user_agent: Option<impl Into<String>>) -> Self {
        self.user_agent = user_agent.map(Into::into);
        self
    }

    /// Attach free-form metadata.
    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
