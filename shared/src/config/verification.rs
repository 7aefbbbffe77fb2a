//! Verification token and reminder configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Policy governing token issuance and reminder scheduling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationPolicy {
    /// Raw token entropy in bytes
    #[serde(default = "default_token_length")]
    pub token_length_bytes: usize,

    /// Hours before an issued token expires
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_hours: i64,

    /// Day offsets after creation at which a pending request is nudged
    #[serde(default = "default_reminder_offsets")]
    pub reminder_offsets_days: Vec<u32>,

    /// Upper bound on reminders per request
    #[serde(default = "default_max_reminders")]
    pub max_reminders: usize,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            token_length_bytes: default_token_length(),
            token_lifetime_hours: default_token_lifetime(),
            reminder_offsets_days: default_reminder_offsets(),
            max_reminders: default_max_reminders(),
        }
    }
}

impl VerificationPolicy {
    /// Validate the policy at startup.
    ///
    /// Reminder offsets past the token lifetime are rejected: such a
    /// reminder could never fire because the request expires first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_length_bytes < 16 {
            return Err(ConfigError::invalid(
                "token_length_bytes",
                "must be at least 16 bytes of entropy",
            ));
        }
        if self.token_lifetime_hours <= 0 {
            return Err(ConfigError::invalid(
                "token_lifetime_hours",
                "must be positive",
            ));
        }
        if self.reminder_offsets_days.is_empty() {
            return Err(ConfigError::invalid(
                "reminder_offsets_days",
                "must not be empty",
            ));
        }
        let lifetime_days = self.token_lifetime_hours / 24;
        if let Some(offset) = self
            .reminder_offsets_days
            .iter()
            .find(|&&o| i64::from(o) > lifetime_days)
        {
            return Err(ConfigError::invalid(
                "reminder_offsets_days",
                format!("offset {offset} exceeds the token lifetime"),
            ));
        }
        if self.max_reminders == 0 {
            return Err(ConfigError::invalid("max_reminders", "must be non-zero"));
        }
        Ok(())
    }
}

fn default_token_length() -> usize {
    32
}

fn default_token_lifetime() -> i64 {
    720 // 30 days
}

fn default_reminder_offsets() -> Vec<u32> {
    vec![3, 7, 14]
}

fn default_max_reminders() -> usize {
    3
}
