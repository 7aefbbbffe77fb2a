//! Rate limiting and lockout configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Limits for a single rate-limited action, checked on two dimensions.
///
/// Both dimensions are evaluated on every call: the IP window guards
/// against a single host spraying many subjects, the subject window
/// guards against many hosts targeting one subject.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionLimit {
    /// Max calls per source IP within `ip_window_seconds`
    pub ip_limit: u32,

    /// Window duration for the IP dimension in seconds
    pub ip_window_seconds: u64,

    /// Max calls per subject within `subject_window_seconds`
    pub subject_limit: u32,

    /// Window duration for the subject dimension in seconds
    pub subject_window_seconds: u64,
}

impl ActionLimit {
    fn validate(&self, action: &str) -> Result<(), ConfigError> {
        if self.ip_limit == 0 || self.subject_limit == 0 {
            return Err(ConfigError::invalid(action, "limits must be non-zero"));
        }
        if self.ip_window_seconds == 0 || self.subject_window_seconds == 0 {
            return Err(ConfigError::invalid(action, "windows must be non-zero"));
        }
        Ok(())
    }
}

/// Rate limiting and abuse-prevention policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitPolicy {
    /// Limits for issuing a new verification (initial send)
    #[serde(default = "default_send_limit")]
    pub send: ActionLimit,

    /// Limits for re-issuing a token for an existing verification
    #[serde(default = "default_resend_limit")]
    pub resend: ActionLimit,

    /// Limits for token verification attempts
    #[serde(default = "default_verify_limit")]
    pub verify_attempt: ActionLimit,

    /// Minimum seconds between sends for the same (subject, purpose)
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_seconds: u64,

    /// Failed verification attempts before a request is locked
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    /// How long a locked request refuses attempts, in seconds
    #[serde(default = "default_lockout_duration")]
    pub lockout_duration_seconds: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            send: default_send_limit(),
            resend: default_resend_limit(),
            verify_attempt: default_verify_limit(),
            resend_cooldown_seconds: default_resend_cooldown(),
            max_failed_attempts: default_max_failed_attempts(),
            lockout_duration_seconds: default_lockout_duration(),
        }
    }
}

impl RateLimitPolicy {
    /// Validate the policy at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.send.validate("send")?;
        self.resend.validate("resend")?;
        self.verify_attempt.validate("verify_attempt")?;
        if self.max_failed_attempts == 0 {
            return Err(ConfigError::invalid(
                "max_failed_attempts",
                "must be non-zero",
            ));
        }
        if self.lockout_duration_seconds == 0 {
            return Err(ConfigError::invalid(
                "lockout_duration_seconds",
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

fn default_send_limit() -> ActionLimit {
    ActionLimit {
        ip_limit: 5,
        ip_window_seconds: 3600,
        subject_limit: 3,
        subject_window_seconds: 3600,
    }
}

fn default_resend_limit() -> ActionLimit {
    ActionLimit {
        ip_limit: 10,
        ip_window_seconds: 86400,
        subject_limit: 6,
        subject_window_seconds: 86400,
    }
}

fn default_verify_limit() -> ActionLimit {
    ActionLimit {
        ip_limit: 30,
        ip_window_seconds: 3600,
        subject_limit: 10,
        subject_window_seconds: 3600,
    }
}

fn default_resend_cooldown() -> u64 {
    60
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_lockout_duration() -> u64 {
    3600 // 1 hour
}
