use serde_json::json;

use kvitto_document::{DocumentTree, NodeId, Value};

use crate::{
    Config, Context, ConvertError, ConvertErrorKind, Receiver, ScalarKind, Source, SourceKind,
    UnknownKeys, merge_missing, walk,
};

// A small schema used to exercise the engine without the receipt crate:
//   check { receipt { cashier, total { sum, currency }, lines: [line { qty, label }] } }
struct TestNodes {
    receipt: NodeId,
    total: NodeId,
    line: NodeId,
}

impl TestNodes {
    fn declare(tree: &mut DocumentTree) -> Self {
        let root = tree.root();
        let check = tree.child(root, "check");
        let receipt = tree.child(check, "receipt");
        let total = tree.child(receipt, "total");
        let lines = tree.array(receipt, "lines");
        let line = tree.child(lines, "line");
        TestNodes {
            receipt,
            total,
            line,
        }
    }
}

#[derive(Clone, Copy)]
enum Pos {
    Root,
    Check,
    Receipt,
    Total,
    Lines,
    LineSeq,
    Line,
}

#[derive(Clone, Copy)]
struct TestReceiver<'n> {
    nodes: &'n TestNodes,
    pos: Pos,
}

impl<'n> TestReceiver<'n> {
    fn at(&self, pos: Pos) -> Self {
        TestReceiver {
            nodes: self.nodes,
            pos,
        }
    }
}

impl<'n> Receiver<serde_json::Value> for TestReceiver<'n> {
    type Acc = DocumentTree;

    fn receive(
        &self,
        ctx: &mut Context<'_, serde_json::Value, DocumentTree>,
    ) -> Result<Option<Self>, ConvertError> {
        let nodes = self.nodes;
        match self.pos {
            Pos::Root => {
                if ctx.key() == "check" && ctx.value().kind() == SourceKind::Object {
                    Ok(Some(self.at(Pos::Check)))
                } else {
                    Ok(Some(*self))
                }
            }
            Pos::Check => match ctx.key() {
                "receipt" => ctx.composite(self.at(Pos::Receipt)),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::Receipt => match ctx.key() {
                "cashier" => {
                    ctx.append(nodes.receipt, ScalarKind::Text)?;
                    Ok(None)
                }
                "total" => ctx.composite(self.at(Pos::Total)),
                "lines" => ctx.composite(self.at(Pos::Lines)),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::Total => {
                match ctx.key() {
                    "sum" => {
                        ctx.append(nodes.total, ScalarKind::Number)?;
                    }
                    "currency" => {
                        ctx.append(nodes.total, ScalarKind::Text)?;
                    }
                    _ => ctx.unknown_attribute()?,
                }
                Ok(None)
            }
            Pos::Lines => match ctx.key() {
                "line" => match ctx.value().kind() {
                    SourceKind::Object => {
                        ctx.new_element(nodes.line)?;
                        ctx.composite(self.at(Pos::Line))
                    }
                    _ => ctx.composite(self.at(Pos::LineSeq)),
                },
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::LineSeq => {
                ctx.new_element(nodes.line)?;
                ctx.composite(self.at(Pos::Line))
            }
            Pos::Line => {
                match ctx.key() {
                    "qty" => {
                        ctx.append(nodes.line, ScalarKind::Number)?;
                    }
                    "label" => {
                        ctx.append(nodes.line, ScalarKind::Text)?;
                    }
                    _ => ctx.unknown_attribute()?,
                }
                Ok(None)
            }
        }
    }
}

fn convert(source: serde_json::Value, config: Config<'_>) -> Result<Value, ConvertError> {
    let mut tree = DocumentTree::new();
    let nodes = TestNodes::declare(&mut tree);
    let receiver = TestReceiver {
        nodes: &nodes,
        pos: Pos::Root,
    };
    walk(&source, "doc-1", receiver, &mut tree, config)?;
    Ok(tree.to_value())
}

fn value(json: serde_json::Value) -> Value {
    serde_json::from_value(json).unwrap()
}

fn exported(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
}

// ===== CONVERSION =====

#[test]
fn test_recognized_scalar_keys_are_converted() {
    let result = convert(
        json!({"check": {"receipt": {
            "cashier": "ivan",
            "total": {"sum": "99.50", "currency": "rub"},
            "lines": {"line": [{"qty": "2", "label": "tea"}, {"qty": "3"}]},
        }}}),
        Config::default(),
    )
    .unwrap();
    assert_eq!(
        exported(&result),
        json!({"check": {"receipt": {
            "cashier": "ivan",
            "total": {"sum": 99.5, "currency": "rub"},
            "lines": [{"qty": 2.0, "label": "tea"}, {"qty": 3.0}],
        }}})
    );
}

#[test]
fn test_anchor_is_found_at_any_depth() {
    let result = convert(
        json!({"envelope": {"check": {"receipt": {"cashier": "ivan"}}}}),
        Config::default(),
    )
    .unwrap();
    assert_eq!(
        exported(&result),
        json!({"check": {"receipt": {"cashier": "ivan"}}})
    );
}

#[test]
fn test_missing_anchor_yields_empty_tree() {
    let result = convert(
        json!({"cheque": {"receipt": {"cashier": "ivan"}}}),
        Config::default(),
    )
    .unwrap();
    assert_eq!(exported(&result), json!({}));
}

#[test]
fn test_unknown_keys_never_raise_and_never_appear() {
    let result = convert(
        json!({"check": {
            "mystery": "x",
            "receipt": {
                "cashier": "ivan",
                "oddity": {"deep": "y"},
                "total": {"sum": "1", "strange": "z"},
            },
        }}),
        Config::default(),
    )
    .unwrap();
    assert_eq!(
        exported(&result),
        json!({"check": {"receipt": {"cashier": "ivan", "total": {"sum": 1.0}}}})
    );
}

#[test]
fn test_unknown_keys_can_be_denied() {
    let err = convert(
        json!({"check": {"mystery": "x"}}),
        Config {
            unknown_keys: UnknownKeys::Deny,
            ..Config::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind, ConvertErrorKind::UnknownAttribute);
    assert_eq!(err.key, "mystery");
}

#[test]
fn test_composite_key_on_scalar_value_fails() {
    let err = convert(json!({"check": {"receipt": "oops"}}), Config::default()).unwrap_err();
    assert_eq!(err.kind, ConvertErrorKind::ExpectedComposite);
    assert_eq!(err.key, "receipt");
    assert_eq!(err.path, "check\\");
}

#[test]
fn test_scalar_write_on_composite_value_fails() {
    let err = convert(
        json!({"check": {"receipt": {"cashier": {"name": "ivan"}}}}),
        Config::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind, ConvertErrorKind::ExpectedScalar);
    assert_eq!(err.key, "cashier");
}

#[test]
fn test_conversion_failure_names_key_and_exact_path() {
    let err = convert(
        json!({"check": {"receipt": {"total": {"sum": "abc"}}}}),
        Config::default(),
    )
    .unwrap_err();
    assert!(matches!(err.kind, ConvertErrorKind::Convert(_)));
    assert_eq!(err.key, "sum");
    assert_eq!(err.path, "check\\receipt\\total\\");
    assert_eq!(err.document, "doc-1");
}

#[test]
fn test_policy_skips_accepted_errors_and_continues() {
    let accept_conversion = |err: &ConvertError| matches!(err.kind, ConvertErrorKind::Convert(_));
    let result = convert(
        json!({"check": {"receipt": {"total": {"sum": "abc", "currency": "rub"}}}}),
        Config {
            on_error: Some(&accept_conversion),
            ..Config::default()
        },
    )
    .unwrap();
    assert_eq!(
        exported(&result),
        json!({"check": {"receipt": {"total": {"currency": "rub"}}}})
    );
}

#[test]
fn test_policy_rejection_aborts_the_walk() {
    let accept_nothing = |_: &ConvertError| false;
    let err = convert(
        json!({"check": {"receipt": {"total": {"sum": "abc"}}}}),
        Config {
            on_error: Some(&accept_nothing),
            ..Config::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.key, "sum");
}

#[test]
fn test_single_object_matches_one_element_array() {
    let single = convert(
        json!({"check": {"receipt": {"lines": {"line": {"qty": "2"}}}}}),
        Config::default(),
    )
    .unwrap();
    let listed = convert(
        json!({"check": {"receipt": {"lines": {"line": [{"qty": "2"}]}}}}),
        Config::default(),
    )
    .unwrap();
    assert_eq!(single, listed);
}

#[test]
fn test_one_target_element_per_source_element() {
    let result = convert(
        json!({"check": {"receipt": {"lines": {"line": [{}, {"qty": "1"}, {}]}}}}),
        Config::default(),
    )
    .unwrap();
    assert_eq!(
        exported(&result),
        json!({"check": {"receipt": {"lines": [{}, {"qty": 1.0}, {}]}}})
    );
}

// ===== TEMPLATE MERGE =====

#[test]
fn test_merge_backfills_missing_subtrees() {
    let template = value(json!({"a": 1.0, "b": {"c": 2.0, "d": 3.0}}));
    let mut result = value(json!({"b": {"c": 99.0}}));
    merge_missing(&template, &mut result, "doc-1");
    assert_eq!(exported(&result), json!({"b": {"c": 99.0, "d": 3.0}, "a": 1.0}));
}

#[test]
fn test_merge_preserves_existing_values() {
    let template = value(json!({"x": "template", "nested": {"y": "template"}}));
    let mut result = value(json!({"x": "result", "nested": {"y": "result"}}));
    merge_missing(&template, &mut result, "doc-1");
    assert_eq!(
        exported(&result),
        json!({"x": "result", "nested": {"y": "result"}})
    );
}

#[test]
fn test_merge_is_idempotent() {
    let template = value(json!({"a": 1.0, "b": {"c": 2.0, "d": [1.0, 2.0]}}));
    let mut once = value(json!({"b": {"c": 99.0}}));
    merge_missing(&template, &mut once, "doc-1");
    let mut twice = once.clone();
    merge_missing(&template, &mut twice, "doc-1");
    assert_eq!(once, twice);
}

#[test]
fn test_merge_covers_every_template_leaf() {
    let template = value(json!({"a": {"b": {"c": 1.0}}, "d": [true, "x"]}));
    let mut result = value(json!({"a": {"b": {}}}));
    merge_missing(&template, &mut result, "doc-1");
    assert_eq!(result.get("a").and_then(|a| a.get("b")).and_then(|b| b.get("c")), Some(&Value::Number(1.0)));
    assert_eq!(result.get("d").and_then(Value::as_list).map(<[Value]>::len), Some(2));
}

#[test]
fn test_merge_matches_list_positions_by_index() {
    let template = value(json!([{"t": 1.0}, {"t": 2.0}, {"t": 3.0}]));
    let mut result = value(json!([{"t": 9.0}, {}]));
    merge_missing(&template, &mut result, "doc-1");
    assert_eq!(
        exported(&result),
        json!([{"t": 9.0}, {"t": 2.0}, {"t": 3.0}])
    );
}

#[test]
fn test_merge_keeps_result_on_kind_mismatch() {
    let template = value(json!({"a": {"deep": 1.0}}));
    let mut result = value(json!({"a": "scalar"}));
    merge_missing(&template, &mut result, "doc-1");
    assert_eq!(exported(&result), json!({"a": "scalar"}));
}
