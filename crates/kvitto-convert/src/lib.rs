/// Conversion behavior shared by a whole walk.
pub mod config;

/// Per-walk traversal state handed to receivers.
pub mod context;

pub mod error;

/// Template backfill over built documents.
pub mod merge;

/// The per-position dispatch abstraction.
pub mod receive;

/// Scalar text converters.
pub mod scalar;

/// Generic read-only view over a parsed source tree.
pub mod source;

/// The recursive pre-order traversal driver.
pub mod walk;

pub use config::{Config, ErrorPolicy, UnknownKeys};
pub use context::Context;
pub use error::{ConvertError, ConvertErrorKind};
pub use merge::merge_missing;
pub use receive::Receiver;
pub use scalar::ScalarKind;
pub use source::{Source, SourceKind};
pub use walk::walk;

#[cfg(test)]
mod tests;
