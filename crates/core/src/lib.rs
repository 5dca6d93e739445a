//! Pure decision logic for the CRM follow-up engine.
//!
//! Everything in this crate is synchronous and free of I/O. Callers load
//! activity logs and todos from storage, capture "today" once, and pass
//! both in.

pub mod activity;
pub mod calendar;
pub mod error;
pub mod follow_up;
pub mod list_filter;
pub mod todo;
pub mod types;
