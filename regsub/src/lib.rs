/*!
POSIX extended regular expression matching and `%`-template substitution over
byte strings.

## Features
- [POSIX extended regular expressions](syntax) (`regcomp(REG_EXTENDED)`),
  including bracket expressions with POSIX classes, intervals and the GNU
  word/buffer anchors, with `REG_ICASE` and `REG_NEWLINE` modes.
- Matching with up to [`NMATCH`] capture spans, kept on the stack.
- [Replacement templates](replace) with `%0`..`%9` back-references, replacing
  the first or every match.
- [Entry points](host) for a dynamically-typed scripting host.
*/
//! ## Usage
//! ```
//! use regsub::Pattern;
//!
//! let re = Pattern::new("([a-z]+)")?;
//! assert_eq!(
//!     re.replace(b"hello 42 world", b"<%1>").call()?.unwrap(),
//!     b"<hello> 42 world"
//! );
//! assert_eq!(
//!     re.replace(b"hello 42 world", b"<%1>").all(true).call()?.unwrap(),
//!     b"<hello> 42 <world>"
//! );
//! # Ok::<(), regsub::Error>(())
//! ```
//!
//! ## Logging
//! Compilation and replacement emit [`tracing`](https://docs.rs/tracing/)
//! events at `debug` and `trace` level. Install a subscriber to see them.
//!
//! ## Crate features
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

mod ascii;
mod captures;
mod error;
#[cfg(feature = "host")]
pub mod host;
pub mod pattern;
pub mod replace;
pub mod syntax;

pub use captures::Captures;
pub use error::Error;
pub use pattern::{Builder, Pattern};
pub use regex_automata::Span;
pub use replace::Template;

/// Number of capture spans reported by a search: the whole match and the
/// first nine groups.
pub const NMATCH: usize = 10;
