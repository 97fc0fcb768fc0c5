//! Structured exceptions: an error value that carries an open set of
//! structured fields next to its message, a sanitized stack trace, and an
//! identity marking which [`Kind`] produced it.
//!
//! Kinds are reusable templates with default fields. Membership is checked
//! by token equality rather than by type hierarchy, so it survives a trip
//! through JSON:
//!
//! ```
//! use exceptions::{Arg, Kind};
//! use serde_json::json;
//!
//! let timeout = Kind::define(json!({ "codename": "TIMEOUT", "code": 408 }));
//!
//! let ex = timeout.build([Arg::text("upstream took too long")]);
//! assert!(ex.is(&timeout));
//! assert_eq!(ex.message(), "upstream took too long");
//! assert_eq!(ex.field("code"), Some(&json!(408)));
//!
//! let rehydrated = timeout.deserialize(&ex.to_json(true)).unwrap();
//! assert!(rehydrated.is(&timeout));
//! ```

pub mod args;
pub mod config;
pub mod error;
pub mod exception;
pub mod kind;
pub mod stacktrace;

pub use args::Arg;
pub use error::Error;
pub use exception::{CreateArgs, Exception, Finisher};
pub use kind::{Kind, KindId};
