//! XML to generic tree adapter.
//!
//! Parses XML text into the `serde_json::Value` tree the conversion engine
//! walks. The mapping follows the conventions the rest of the pipeline
//! expects from an XML object mapper: the root element's name is dropped and
//! its content becomes the tree, element text becomes string scalars,
//! attributes become plain string fields, and repeated sibling element names
//! coerce into arrays (the first occurrence stays scalar until a duplicate
//! arrives). Empty elements become empty strings.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, XmlError>;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml syntax error: {0}")]
    Syntax(String),
    #[error("empty document: no root element")]
    EmptyDocument,
    #[error("multiple root elements")]
    MultipleRoots,
    #[error("unexpected end of input: expected closing tag </{0}>")]
    UnexpectedEof(String),
}

/// An element being built while its closing tag is still ahead.
struct OpenElement {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

/// Parses `xml` into a generic tree, dropping the root element's name.
pub fn parse_tree(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<OpenElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(open_element(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = open_element(&start)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Syntax("unexpected closing tag".to_string()))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|err| XmlError::Syntax(err.to_string()))?;
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(data.as_ref()));
                }
            }
            Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(err) => return Err(XmlError::Syntax(err.to_string())),
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(XmlError::UnexpectedEof(unclosed.name.clone()));
    }
    let root = root.ok_or(XmlError::EmptyDocument)?;
    Ok(element_value(root))
}

fn open_element(start: &BytesStart<'_>) -> Result<OpenElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = OpenElement {
        name,
        fields: Map::new(),
        text: String::new(),
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| XmlError::Syntax(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| XmlError::Syntax(err.to_string()))?;
        insert_field(&mut element.fields, key, Value::String(value.into_owned()));
    }
    Ok(element)
}

fn close_element(
    element: OpenElement,
    stack: &mut Vec<OpenElement>,
    root: &mut Option<OpenElement>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            let name = element.name.clone();
            insert_field(&mut parent.fields, name, element_value(element));
            Ok(())
        }
        None if root.is_some() => Err(XmlError::MultipleRoots),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

/// Element content: an object when the element has fields, its text
/// otherwise. Text alongside child elements is dropped.
fn element_value(element: OpenElement) -> Value {
    if element.fields.is_empty() {
        Value::String(element.text)
    } else {
        Value::Object(element.fields)
    }
}

fn insert_field(fields: &mut Map<String, Value>, key: String, value: Value) {
    match fields.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(key, value);
        }
    }
}
