/// Arena-backed tree of target nodes built during a conversion.
pub mod document;

/// Normalized output value: nested maps and lists with scalar leaves.
pub mod value;

pub use document::{DocumentError, DocumentTree, NodeId};
pub use value::{Value, ValueMap};
