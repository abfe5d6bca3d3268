//! HTTP handlers
//!
//! - `guestbook`: entry CRUD under `/api/guestbook`
//! - `actuator`: health and build info under `/actuator`

pub mod actuator;
pub mod guestbook;
