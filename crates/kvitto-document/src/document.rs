use indexmap::IndexMap;

use crate::value::{Value, ValueMap};

/// Index of a node in a [`DocumentTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("node is not array-typed")]
    ExpectedArray,
}

/// The document being built during one conversion.
///
/// Nodes are owned by the arena and refer to their parent by index, so the
/// upward materialization chain never forms reference cycles. Each node is a
/// schema position created up front; its backing container is absent until
/// the position receives content, and once present its kind (map or list,
/// chosen by `is_array`) never changes.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<TargetNode>,
    root: NodeId,
}

#[derive(Debug, Clone)]
struct TargetNode {
    parent: Option<NodeId>,
    key: String,
    is_array: bool,
    container: Option<Container>,
}

#[derive(Debug, Clone, PartialEq)]
enum Container {
    Map(IndexMap<String, Entry>),
    List(Vec<Entry>),
}

impl Container {
    fn empty(is_array: bool) -> Self {
        if is_array {
            Container::List(Vec::new())
        } else {
            Container::Map(IndexMap::new())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Value(Value),
    Node(NodeId),
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// Creates a tree whose root map is already present, like the result
    /// document a caller would otherwise supply.
    pub fn new() -> Self {
        DocumentTree {
            nodes: vec![TargetNode {
                parent: None,
                key: String::new(),
                is_array: false,
                container: Some(Container::Map(IndexMap::new())),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Declares a map-typed position under `parent`.
    pub fn child(&mut self, parent: NodeId, key: impl Into<String>) -> NodeId {
        self.alloc(parent, key.into(), false)
    }

    /// Declares an array-typed position under `parent`.
    pub fn array(&mut self, parent: NodeId, key: impl Into<String>) -> NodeId {
        self.alloc(parent, key.into(), true)
    }

    fn alloc(&mut self, parent: NodeId, key: String, is_array: bool) -> NodeId {
        self.nodes.push(TargetNode {
            parent: Some(parent),
            key,
            is_array,
            container: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn is_array(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_array
    }

    /// Whether the position has been materialized.
    pub fn has_content(&self, id: NodeId) -> bool {
        self.nodes[id.0].container.is_some()
    }

    /// Writes a scalar under `key`, materializing this node and every
    /// ancestor up to the root. On an array-typed node the value is pushed
    /// instead of keyed.
    pub fn append(&mut self, id: NodeId, key: &str, value: Value) {
        match self.force_container(id) {
            Container::Map(map) => {
                map.insert(key.to_string(), Entry::Value(value));
            }
            Container::List(items) => items.push(Entry::Value(value)),
        }
        self.attach_upward(id);
    }

    /// Forces the node's container into existence and attaches the whole
    /// ancestor chain. Idempotent: existing containers and attachments are
    /// reused.
    pub fn materialize(&mut self, id: NodeId) {
        self.force_container(id);
        self.attach_upward(id);
    }

    /// Opens a fresh element for an array item position.
    ///
    /// The previous element's subtree, if any, is frozen into anonymous
    /// arena nodes first, so later writes through the same position handles
    /// cannot touch it. The fresh element is attached immediately: one
    /// target element exists per call even if nothing is ever written into
    /// it. Fails if the parent position is not array-typed.
    pub fn new_element(&mut self, id: NodeId) -> Result<(), DocumentError> {
        let parent = self.nodes[id.0].parent.ok_or(DocumentError::ExpectedArray)?;
        if !self.nodes[parent.0].is_array {
            return Err(DocumentError::ExpectedArray);
        }
        self.freeze(id, parent);
        let is_array = self.nodes[id.0].is_array;
        self.nodes[id.0].container = Some(Container::empty(is_array));
        self.attach_upward(id);
        Ok(())
    }

    fn force_container(&mut self, id: NodeId) -> &mut Container {
        let node = &mut self.nodes[id.0];
        let is_array = node.is_array;
        node.container
            .get_or_insert_with(|| Container::empty(is_array))
    }

    fn attach_upward(&mut self, id: NodeId) {
        let mut child = id;
        while let Some(parent) = self.nodes[child.0].parent {
            let key = self.nodes[child.0].key.clone();
            match self.force_container(parent) {
                Container::Map(map) => {
                    map.insert(key, Entry::Node(child));
                }
                Container::List(items) => {
                    // attach once: upward propagation repeats for every write
                    if items.last() != Some(&Entry::Node(child)) {
                        items.push(Entry::Node(child));
                    }
                }
            }
            child = parent;
        }
    }

    /// Moves the current element subtree of `id` into anonymous nodes and
    /// swaps the attached list entry over to them, leaving `id` and its
    /// descendant positions unmaterialized for the next element.
    fn freeze(&mut self, id: NodeId, parent: NodeId) {
        let Some(container) = self.nodes[id.0].container.take() else {
            return;
        };
        let frozen = self.freeze_container(container);
        let is_array = self.nodes[id.0].is_array;
        let frozen_id = self.alloc_frozen(is_array, frozen);
        if let Some(Container::List(items)) = self.nodes[parent.0].container.as_mut() {
            match items.iter_mut().rev().find(|entry| **entry == Entry::Node(id)) {
                Some(slot) => *slot = Entry::Node(frozen_id),
                None => items.push(Entry::Node(frozen_id)),
            }
        }
    }

    fn freeze_container(&mut self, container: Container) -> Container {
        match container {
            Container::Map(map) => Container::Map(
                map.into_iter()
                    .map(|(key, entry)| (key, self.freeze_entry(entry)))
                    .collect(),
            ),
            Container::List(items) => Container::List(
                items
                    .into_iter()
                    .map(|entry| self.freeze_entry(entry))
                    .collect(),
            ),
        }
    }

    fn freeze_entry(&mut self, entry: Entry) -> Entry {
        match entry {
            Entry::Value(value) => Entry::Value(value),
            Entry::Node(child) => {
                let taken = self.nodes[child.0].container.take();
                let frozen = taken.map(|container| self.freeze_container(container));
                let is_array = self.nodes[child.0].is_array;
                let frozen_id = match frozen {
                    Some(container) => self.alloc_frozen(is_array, container),
                    None => self.alloc_frozen(is_array, Container::empty(is_array)),
                };
                Entry::Node(frozen_id)
            }
        }
    }

    fn alloc_frozen(&mut self, is_array: bool, container: Container) -> NodeId {
        self.nodes.push(TargetNode {
            parent: None,
            key: String::new(),
            is_array,
            container: Some(container),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Exports the materialized tree as a normalized value.
    pub fn to_value(&self) -> Value {
        self.node_value(self.root)
    }

    fn node_value(&self, id: NodeId) -> Value {
        let node = &self.nodes[id.0];
        match &node.container {
            None if node.is_array => Value::List(Vec::new()),
            None => Value::Map(ValueMap::new()),
            Some(Container::Map(map)) => Value::Map(
                map.iter()
                    .map(|(key, entry)| (key.clone(), self.entry_value(entry)))
                    .collect(),
            ),
            Some(Container::List(items)) => {
                Value::List(items.iter().map(|entry| self.entry_value(entry)).collect())
            }
        }
    }

    fn entry_value(&self, entry: &Entry) -> Value {
        match entry {
            Entry::Value(value) => value.clone(),
            Entry::Node(id) => self.node_value(*id),
        }
    }
}
