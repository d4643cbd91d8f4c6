//! The check/receipt document schema and its conversion service.
//!
//! This crate configures the generic engine in `kvitto-convert` with the
//! concrete fiscal-receipt schema: which keys are recognized at each
//! position, their scalar types, and which positions are arrays.

/// The receipt schema: target positions and the receiver chain.
pub mod schema;

use kvitto_convert::{Config, ConvertError, merge_missing, walk};
use kvitto_document::{DocumentTree, Value};
use kvitto_xml::XmlError;
use thiserror::Error;
use tracing::warn;

pub use schema::{ReceiptNodes, ReceiptReceiver};

/// Failure of a full XML-to-document conversion.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The XML text did not parse; raised by the upstream parser.
    #[error(transparent)]
    Parse(#[from] XmlError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Converts a parsed source tree into a normalized receipt document.
///
/// When `template` is supplied, any of its subtrees missing from the `check`
/// subtree of the result are backfilled; values the conversion produced are
/// never overwritten. An absent template is a no-op.
pub fn convert_receipt(
    source: &serde_json::Value,
    document: &str,
    template: Option<&Value>,
    config: Config<'_>,
) -> Result<Value, ConvertError> {
    let mut tree = DocumentTree::new();
    let nodes = ReceiptNodes::declare(&mut tree);
    walk(source, document, ReceiptReceiver::root(&nodes), &mut tree, config)?;
    let mut result = tree.to_value();
    if let Some(template) = template {
        if let Value::Map(map) = &mut result {
            if let Some(check) = map.get_mut("check") {
                merge_missing(template, check, document);
            }
        }
    }
    Ok(result)
}

/// Parses receipt XML and converts it. Failures are logged at warn level
/// before propagating, parse errors unchanged from the upstream parser.
pub fn receipt_from_xml(
    xml: &str,
    document: &str,
    template: Option<&Value>,
    config: Config<'_>,
) -> Result<Value, ReceiptError> {
    let source = kvitto_xml::parse_tree(xml)
        .inspect_err(|err| warn!(document, error = %err, "receipt XML parse failed"))?;
    convert_receipt(&source, document, template, config)
        .map_err(ReceiptError::from)
        .inspect_err(|err| warn!(document, error = %err, "receipt conversion failed"))
}
