//! Reminder scheduling for pending verifications.

mod service;


pub use service::{ReminderDue, ReminderScheduler};
