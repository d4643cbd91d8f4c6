use kvitto_document::Value;

/// Semantic type declared for a scalar schema position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Keep the text as-is.
    Text,
    /// Parse as a double-precision number.
    Number,
    /// Parse as a boolean, `true`/`false` case-insensitive.
    Flag,
}

impl ScalarKind {
    /// Converts raw scalar text to a typed value. The error carries the
    /// reason only; callers add key and path context.
    pub fn convert(self, text: &str) -> Result<Value, String> {
        match self {
            ScalarKind::Text => Ok(Value::String(text.to_string())),
            ScalarKind::Number => text
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|err| format!("{err}: {text:?}")),
            ScalarKind::Flag => {
                let trimmed = text.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(format!("not a boolean: {text:?}"))
                }
            }
        }
    }
}
