//! Lantern - a minimal static file server
//!
//! Serves one HTTP/1.1 request per connection from a document root, with
//! strict request limits and a bounded worker pool.

pub mod cli;
pub mod config;
pub mod fs;
pub mod http;
pub mod logging;
pub mod server;
