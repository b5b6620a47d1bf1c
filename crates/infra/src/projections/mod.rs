//! Read models built from the session's scan event stream.

pub mod activity_log;
pub mod live;
