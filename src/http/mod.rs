//! The HTTP/1.1 subset the server speaks: one request per connection, GET
//! and HEAD only, no request bodies.
//!
//! - **`connection`**: per-connection state machine
//! - **`parser`**: request line and header block, under size limits
//! - **`request`** / **`headers`**: the parsed request
//! - **`handler`**: maps requests onto the document root
//! - **`response`** / **`writer`**: building and sending the answer
//! - **`error`**: client errors answered with a 4xx
//! - **`mime`** / **`listing`**: content types and directory pages
//!
//! # Lifecycle
//!
//! ```text
//!        ┌─────────────┐
//!        │  Accepted   │
//!        └──────┬──────┘
//!               ▼
//!        ┌──────────────────┐  protocol error   ┌─────────┐
//!        │  ParsingRequest  │ ────────────────▶ │  Error  │
//!        └──────┬───────────┘                   └────┬────┘
//!               │ request parsed                     │ error response
//!               ▼                                    │
//!        ┌──────────────────┐  internal error        │
//!        │    Handling      │ ───────────────────────┤
//!        └──────┬───────────┘                        │
//!               │ response ready                     │
//!               ▼                                    │
//!        ┌──────────────────┐ ◀──────────────────────┘
//!        │ WritingResponse  │
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │ ◀── reset / timeout while reading
//!        └──────────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod handler;
pub mod headers;
pub mod listing;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

/// Value of the `Server` header.
pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
