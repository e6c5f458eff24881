// prelude.rs - Convenient re-exports for the matching API.
//
//! # Prelude
//!
//! ```
//! use lockstep::prelude::*;
//!
//! let re = Regex::new(r"\d+").unwrap();
//! let m = re.find("answer: 42").unwrap();
//! assert_eq!(m.as_str(), "42");
//! ```

pub use crate::api::{Captures, FindIter, Match, Regex, RegexBuilder};
pub use crate::error::Error;
pub use crate::program::Options;
