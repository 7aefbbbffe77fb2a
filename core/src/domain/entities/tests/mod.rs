mod audit_tests;
mod reminder_tests;
