//! <div align="center">
//!   <h1>jsdoctor</h1>
//!   <p>
//!     <strong>Parser for JSDoc block comments and Closure-Compiler-style type expressions.</strong>
//!   </p>
//! </div>
//!
//! ## Example
//!
//! ```rust
//! use jsdoctor::ast::{Tag, TypeNode};
//! use jsdoctor::{parse, ParseOptions};
//!
//! let comment = parse(
//!     r#"/**
//!         * Adds numbers.
//!         * @param {number} a - the first
//!         * @returns {number} the sum
//!         */"#,
//!     &ParseOptions {
//!         unwrap: true,
//!         ..ParseOptions::default()
//!     },
//! )?;
//!
//! assert_eq!(comment.description, "Adds numbers.");
//! assert_eq!(
//!     comment.tags,
//!     vec![
//!         Tag {
//!             name: Some("a".to_owned()),
//!             ty: Some(TypeNode::name("number")),
//!             description: Some("the first".to_owned()),
//!             ..Tag::new("param")
//!         },
//!         Tag {
//!             ty: Some(TypeNode::name("number")),
//!             description: Some("the sum".to_owned()),
//!             ..Tag::new("returns")
//!         },
//!     ]
//! );
//! # Ok::<(), jsdoctor::Error>(())
//! ```
//!
//! Type expressions can be parsed and printed on their own:
//!
//! ```rust
//! use jsdoctor::{parse_type, stringify, StringifyOptions, TypeOptions};
//!
//! let node = parse_type("function(this:Foo, string=): ?number", TypeOptions::default())?;
//! assert_eq!(
//!     stringify(&node, StringifyOptions::default()),
//!     "function (this: Foo, string=): ?number"
//! );
//! # Ok::<(), jsdoctor::Error>(())
//! ```
//!
//! ## Error handling
//!
//! Malformed type expressions always fail the parse. Tag-level problems such as a missing
//! name or an unknown `@access` level follow [`ErrorPolicy`]: fail, drop the tag, or keep
//! the tag with the messages collected in [`Tag::errors`](ast::Tag::errors).
//!
//! ## Logging
//!
//! The parser emits [`tracing`] events at `debug` and `trace` level for dropped tags,
//! collected errors and backtracking. No subscriber is installed.

#![doc(html_root_url = "https://docs.rs/jsdoctor/0.1.0")]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

pub mod ast;
pub mod error;
pub mod options;
pub mod scanner;

mod chars;
mod comment;
mod parsers;
mod stringify;
mod tags;
mod types;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

pub use crate::comment::{parse, unwrap_comment};
pub use crate::error::Error;
pub use crate::options::{ErrorPolicy, ParseOptions, StringifyOptions, TypeOptions};
pub use crate::stringify::stringify;
pub use crate::types::{
    parse_param_type, parse_param_type_midstream, parse_type, parse_type_midstream, Midstream,
    MAX_DEPTH,
};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
