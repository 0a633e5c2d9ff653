//! # MarkIt Testkit
//!
//! Test utilities for MarkIt.
//!
//! This crate provides:
//! - Bookmark fixtures with deterministic timestamps
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use markit_testkit::prelude::*;
//!
//! let row = bookmark("b1", 10);
//! assert_eq!(row.owner, owner());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
