//! Safe-string tracking and contextual placeholder escaping for HTML output.
//!
//! This crate keeps untrusted text from being interpreted as markup, while
//! making sure markup that is already trusted is not escaped twice:
//! - **Registry**: [`SafeStrings`] records which exact strings are known safe
//!   for one unit of work, and under which [`Strategy`]
//! - **Capability**: [`Markup`] proves safety by construction, without a
//!   registry lookup
//! - **Placeholders**: [`Formatter`] substitutes `@`, `%`, `:` and `!`
//!   tokens, escaping each value the way its sigil demands
//!
//! # Core Types
//!
//! - [`SafeStrings`]: per-request (or per-batch-step) registry of safe strings
//! - [`Markup`] / [`Arg`]: trusted markup vs. untrusted text
//! - [`Formatter`] / [`Args`] / [`FormattedText`]: placeholder substitution
//! - [`ProtocolFilter`]: allow-list of URI schemes for `:` placeholders
//! - [`SafeEntry`]: transfer record for carrying trust state between units
//!   of work
//!
//! # Examples
//!
//! ```
//! use safe_markup::{Args, SafeStrings, Strategy};
//!
//! let registry = SafeStrings::for_unit("req-123");
//!
//! let out = registry
//!     .format(
//!         "<a href=\":url\">%name</a>",
//!         &Args::new()
//!             .with(":url", "javascript:alert(1)")
//!             .with("%name", "<Bob>"),
//!     )
//!     .expect("all tokens mapped");
//!
//! assert_eq!(
//!     out.as_str(),
//!     "<a href=\"alert(1)\"><em class=\"placeholder\">&lt;Bob&gt;</em></a>"
//! );
//! assert!(out.is_safe());
//!
//! // The next batch step starts from the same trust state.
//! let snapshot = registry.export_all();
//! let next_step = SafeStrings::for_unit("req-123/step-2");
//! next_step.import_all(snapshot).expect("snapshot is valid");
//! assert!(next_step.is_safe_str(out.as_str(), Strategy::Html));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod escape;
mod format;
mod logging;
mod markup;
mod protocol;
mod registry;
mod strategy;

#[cfg(test)]
mod test_utils;

pub use error::{Error, Misuse, MisuseKind};
pub use escape::encode_html;
pub use format::{tokenize, Args, FormattedText, Formatter, Sigil, Token, Tokens};
pub use logging::RegistryLog;
pub use markup::{Arg, Markup};
pub use protocol::{strip_dangerous_protocols, ProtocolFilter, DEFAULT_ALLOWED_PROTOCOLS};
pub use registry::{SafeEntry, SafeStrings};
pub use strategy::{Strategy, StrategySet};
