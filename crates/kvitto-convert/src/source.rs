use std::borrow::Cow;

/// Shape of a generic source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Object,
    Array,
    Scalar,
}

/// Read-only view over a parsed source tree: objects with ordered keys,
/// indexed arrays, and scalar text. The engine walks any implementor and
/// never parses raw text itself.
pub trait Source {
    fn kind(&self) -> SourceKind;

    /// Entries of an object node in document order; empty otherwise.
    fn entries(&self) -> impl Iterator<Item = (&str, &Self)>;

    /// Items of an array node in order; empty otherwise.
    fn items(&self) -> impl Iterator<Item = &Self>;

    /// Text of a scalar node; `None` for composites.
    fn scalar_text(&self) -> Option<Cow<'_, str>>;

    fn is_composite(&self) -> bool {
        matches!(self.kind(), SourceKind::Object | SourceKind::Array)
    }
}

impl Source for serde_json::Value {
    fn kind(&self) -> SourceKind {
        match self {
            serde_json::Value::Object(_) => SourceKind::Object,
            serde_json::Value::Array(_) => SourceKind::Array,
            _ => SourceKind::Scalar,
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.as_object()
            .into_iter()
            .flat_map(|map| map.iter().map(|(key, value)| (key.as_str(), value)))
    }

    fn items(&self) -> impl Iterator<Item = &Self> {
        self.as_array().into_iter().flatten()
    }

    fn scalar_text(&self) -> Option<Cow<'_, str>> {
        match self {
            serde_json::Value::String(text) => Some(Cow::Borrowed(text)),
            serde_json::Value::Number(number) => Some(Cow::Owned(number.to_string())),
            serde_json::Value::Bool(flag) => {
                Some(Cow::Borrowed(if *flag { "true" } else { "false" }))
            }
            serde_json::Value::Null => Some(Cow::Borrowed("null")),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
        }
    }
}
