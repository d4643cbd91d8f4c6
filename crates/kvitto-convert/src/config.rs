use crate::error::ConvertError;

/// Predicate deciding whether a conversion or structural error is
/// recoverable. Returning `true` skips the offending attribute and lets the
/// walk continue; otherwise the error aborts the whole conversion.
pub type ErrorPolicy<'p> = &'p dyn Fn(&ConvertError) -> bool;

/// How attribute keys no receiver recognizes are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Log and skip, the permissive default.
    #[default]
    Ignore,
    /// Raise an unknown-attribute error, still subject to the error policy.
    Deny,
}

/// Behavior knobs shared by a whole conversion walk.
#[derive(Default, Clone, Copy)]
pub struct Config<'p> {
    pub on_error: Option<ErrorPolicy<'p>>,
    pub unknown_keys: UnknownKeys,
}
