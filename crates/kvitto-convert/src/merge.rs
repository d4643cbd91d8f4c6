use kvitto_document::Value;
use tracing::debug;

/// Copies into `result` every template subtree `result` lacks, preserving
/// all values the result already has. Map keys are matched by name, list
/// positions by index; where both sides hold a value, the result's wins.
/// One pass, never fails. `document` identifies the result for diagnostics.
pub fn merge_missing(template: &Value, result: &mut Value, document: &str) {
    let mut merger = Merger {
        document,
        path: Vec::new(),
    };
    merger.merge(template, result);
}

/// Merge state threaded through the recursion; the path is diagnostics only.
struct Merger<'m> {
    document: &'m str,
    path: Vec<String>,
}

impl Merger<'_> {
    fn merge(&mut self, template: &Value, result: &mut Value) {
        match (template, result) {
            (Value::Map(template), Value::Map(result)) => {
                for (key, value) in template {
                    self.path.push(key.clone());
                    match result.get_mut(key) {
                        Some(existing) => self.merge(value, existing),
                        None => {
                            self.backfilled();
                            result.insert(key.clone(), value.clone());
                        }
                    }
                    self.path.pop();
                }
            }
            (Value::List(template), Value::List(result)) => {
                for (index, value) in template.iter().enumerate() {
                    self.path.push(index.to_string());
                    match result.get_mut(index) {
                        Some(existing) => self.merge(value, existing),
                        None => {
                            self.backfilled();
                            result.push(value.clone());
                        }
                    }
                    self.path.pop();
                }
            }
            // both sides have a value here; the result's is kept
            _ => {}
        }
    }

    fn backfilled(&self) {
        debug!(
            path = %self.path.join("\\"),
            document = %self.document,
            "backfilled subtree from template"
        );
    }
}
