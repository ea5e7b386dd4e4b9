//! Filesystem access confined to the document root.

pub mod resolver;

pub use resolver::{DirEntry, DocumentRoot, ResolveError, ResolvedTarget};
