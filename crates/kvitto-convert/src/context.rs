use kvitto_document::{DocumentTree, NodeId};
use tracing::{debug, info};

use crate::config::{Config, UnknownKeys};
use crate::error::{ConvertError, ConvertErrorKind};
use crate::scalar::ScalarKind;
use crate::source::Source;

/// Mutable per-walk state handed to every receiver invocation: the current
/// key and value, the path stack, the source document identity, the error
/// policy, and the accumulator the walk is building into.
pub struct Context<'w, S, A> {
    key: String,
    value: &'w S,
    path: Vec<String>,
    document: String,
    config: Config<'w>,
    /// Accumulator carried through the whole walk.
    pub acc: &'w mut A,
}

impl<'w, S: Source, A> Context<'w, S, A> {
    pub(crate) fn new(root: &'w S, document: &str, config: Config<'w>, acc: &'w mut A) -> Self {
        Context {
            key: String::new(),
            value: root,
            path: Vec::new(),
            document: document.to_string(),
            config,
            acc,
        }
    }

    pub(crate) fn set(&mut self, key: String, value: &'w S) {
        self.key = key;
        self.value = value;
    }

    pub(crate) fn push(&mut self) {
        self.path.push(self.key.clone());
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }

    /// The attribute key of the current node; array elements carry their
    /// index rendered as decimal text.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current source node.
    pub fn value(&self) -> &'w S {
        self.value
    }

    /// Current path rendered for diagnostics: keys joined by `\` with a
    /// trailing separator, the synthetic empty root key elided.
    pub fn path_string(&self) -> String {
        let mut rendered = String::new();
        for segment in self.path.iter().filter(|segment| !segment.is_empty()) {
            rendered.push_str(segment);
            rendered.push('\\');
        }
        rendered
    }

    /// Builds an error at the current position.
    pub fn error(&self, kind: ConvertErrorKind) -> ConvertError {
        ConvertError {
            kind,
            key: self.key.clone(),
            path: self.path_string(),
            document: self.document.clone(),
        }
    }

    /// Offers `err` to the error policy: `Ok(())` when the policy accepts it
    /// and the attribute is to be skipped, `Err` otherwise.
    pub fn recover(&self, err: ConvertError) -> Result<(), ConvertError> {
        match self.config.on_error {
            Some(policy) if policy(&err) => {
                debug!(error = %err, "error accepted by policy, attribute skipped");
                Ok(())
            }
            _ => Err(err),
        }
    }

    /// Handles an attribute no receiver recognizes.
    pub fn unknown_attribute(&self) -> Result<(), ConvertError> {
        match self.config.unknown_keys {
            UnknownKeys::Ignore => {
                info!(
                    key = %self.key,
                    path = %self.path_string(),
                    document = %self.document,
                    "unknown attribute"
                );
                Ok(())
            }
            UnknownKeys::Deny => self.recover(self.error(ConvertErrorKind::UnknownAttribute)),
        }
    }

    /// Validates that the current value is composite and hands back the
    /// receiver for its children; a scalar value is a structural error
    /// offered to the policy, pruning the subtree when accepted.
    pub fn composite<R>(&self, next: R) -> Result<Option<R>, ConvertError> {
        if self.value.is_composite() {
            Ok(Some(next))
        } else {
            self.recover(self.error(ConvertErrorKind::ExpectedComposite))?;
            Ok(None)
        }
    }
}

impl<'w, S: Source> Context<'w, S, DocumentTree> {
    /// Converts the current scalar value with `kind` and writes it into
    /// `node` under the current key, materializing ancestors as needed.
    /// Returns whether a value was written.
    pub fn append(&mut self, node: NodeId, kind: ScalarKind) -> Result<bool, ConvertError> {
        let Some(text) = self.value.scalar_text() else {
            self.recover(self.error(ConvertErrorKind::ExpectedScalar))?;
            return Ok(false);
        };
        let value = match kind.convert(&text) {
            Ok(value) => value,
            Err(reason) => {
                self.recover(self.error(ConvertErrorKind::Convert(reason)))?;
                return Ok(false);
            }
        };
        let Context { acc, key, .. } = self;
        acc.append(node, key, value);
        Ok(true)
    }

    /// Opens a fresh target array element for `node`.
    pub fn new_element(&mut self, node: NodeId) -> Result<(), ConvertError> {
        if let Err(err) = self.acc.new_element(node) {
            self.recover(self.error(ConvertErrorKind::Structure(err)))?;
        }
        Ok(())
    }
}
