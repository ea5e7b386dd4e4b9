//! Listening socket and connection dispatch.

pub mod listener;
pub mod pool;
