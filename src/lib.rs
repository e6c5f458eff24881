//! # Lockstep
//!
//! A regular expression engine built on lock-step NFA simulation (a
//! "Pike VM"), with SIMD-accelerated literal search via
//! [`memchr`](https://crates.io/crates/memchr).
//!
//! Patterns compile to a small bytecode program whose jumps are all
//! relative displacements; execution advances every live alternative one
//! character at a time, so matching time stays linear in the subject for
//! patterns without backreferences. Capture groups, counted repetition
//! `{m,n}`, lookahead/lookbehind and backreferences are supported;
//! leftmost-first match selection follows pattern order, with greedy and
//! lazy quantifiers.
//!
//! ## Quick Start
//!
//! ```rust
//! use lockstep::prelude::*;
//!
//! let re = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
//! let m = re.find("Date: 2026-02-12").unwrap();
//! assert_eq!(m.as_str(), "2026-02-12");
//! assert_eq!(m.start(), 6);
//! ```
//!
//! For fine-grained control, use [`RegexBuilder`](api::RegexBuilder):
//!
//! ```rust
//! use lockstep::prelude::*;
//!
//! let re = Regex::builder(r"hello")
//!     .case_insensitive(true)
//!     .build()
//!     .unwrap();
//! assert!(re.is_match("Hello World"));
//! ```
//!
//! ## Inspecting Compiled Programs
//!
//! The compiled bytecode disassembles through `Display`:
//!
//! ```rust
//! use lockstep::prelude::*;
//!
//! let re = Regex::new("a|b").unwrap();
//! assert_eq!(
//!     re.program().to_string(),
//!     "split 0,2\nchar 'a'\njmp 1\nchar 'b'\nmatch\n"
//! );
//! ```
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`api`] | `Regex`, `Match`, `Captures`, search loop |
//! | [`compile`] | Recursive-descent pattern compiler |
//! | [`program`] | Instruction set and compiled programs |
//! | [`vm`] | Lock-step thread simulation |
//! | [`classes`] | Character classes and case folding |
//! | [`error`] | Compile-time error type |

pub mod api;
pub mod classes;
pub mod compile;
pub mod error;
pub mod prelude;
pub mod program;
pub mod vm;

pub use api::{Captures, FindIter, Match, Regex, RegexBuilder};
pub use error::Error;
pub use program::{Options, Program};
