//! Logical-path resolution: turning an extension-agnostic asset name plus a
//! desired content type into a concrete filename.
//!
//! Resolution searches ordered load paths, peels engine extensions from
//! basenames, and negotiates content types against weighted accept lists.
//! Resolution never mutates the filesystem; its only side effect is warming
//! directory-listing memoization inside a single call.

#![warn(missing_docs)]

pub mod accept;
pub mod error;
pub mod extensions;
pub mod mime;
pub mod resolver;

pub use accept::parse_accept;
pub use error::ResolveError;
pub use extensions::{parse_basename, ParsedBasename};
pub use mime::{mime_range_match, EngineRegistry, MimeRegistry};
pub use resolver::{normalize, Resolved, Resolver};
