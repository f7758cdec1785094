//! Require-directive parsing and bundle linearization.
//!
//! Source files declare dependency and bundling intent through directive
//! lines in their leading comment block (`//= require ./lib`). This crate
//! parses those headers, expands directory-level requires, and turns the
//! per-file require lists into a stable bundle order with stub subtraction
//! and cycle detection.

#![warn(missing_docs)]

pub mod bundle;
pub mod directive;
pub mod error;
pub mod expand;

pub use bundle::{bundle_order, concatenate, required_order};
pub use directive::{parse_header, Directive, ParsedSource};
pub use error::GraphError;
pub use expand::{expand_directory, expand_tree};
