//! Live scheme tree data structures.

use tr_core::TrellisError;
use tr_core::TrellisResult;

/// ID used to address nodes in the document arena.
pub type NodeId = usize;

/// Payload carried by a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

/// Tag name and attributes of an element, attributes kept in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// Arena-backed document. Node `0` is always the document node.
///
/// Nodes are never freed: detaching a subtree leaves its nodes in the arena,
/// unreachable from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn create_element(
        &mut self,
        tag: impl Into<String>,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.into(),
            attrs,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        self.nodes.len() - 1
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TrellisResult<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Inserts `child` at `index` among the children of `parent`, detaching it
    /// from its previous parent first. `index` is clamped to the child count.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> TrellisResult<()> {
        self.require(parent)?;
        self.require(child)?;

        if child == self.root() {
            return Err(TrellisError::new(
                "dom.hierarchy_invalid",
                "the document node cannot be inserted",
            ));
        }

        if matches!(self.nodes[parent].data, NodeData::Text(_)) {
            return Err(TrellisError::new(
                "dom.hierarchy_invalid",
                format!("text node {parent} cannot have children"),
            ));
        }

        // A childless node can only be its own ancestor.
        let may_contain_parent = child == parent || !self.nodes[child].children.is_empty();
        if may_contain_parent && self.is_inclusive_ancestor(child, parent) {
            return Err(TrellisError::new(
                "dom.hierarchy_invalid",
                format!("node {child} is an ancestor of {parent}"),
            ));
        }

        self.detach(child);
        let children = &mut self.nodes[parent].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Removes `node` from its parent. The subtree stays in the arena.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) else {
            return;
        };

        self.nodes[parent].children.retain(|candidate| *candidate != node);
        self.nodes[node].parent = None;
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    fn require(&self, id: NodeId) -> TrellisResult<()> {
        if id < self.nodes.len() {
            Ok(())
        } else {
            Err(TrellisError::new(
                "dom.node_missing",
                format!("node {id} does not exist"),
            ))
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id).next()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element_data(id).is_some()
    }

    fn element_data(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id)?.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element_data(id).map(|data| data.tag.as_str())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element_data(id)
            .map(|data| data.attrs.as_slice())
            .unwrap_or(&[])
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing the value in place if it already exists so
    /// attribute order survives serialization.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> TrellisResult<()> {
        let Some(NodeData::Element(data)) = self.nodes.get_mut(id).map(|node| &mut node.data)
        else {
            return Err(TrellisError::new(
                "dom.not_an_element",
                format!("node {id} is not an element"),
            ));
        };

        let value = value.into();
        match data.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => data.attrs.push((name.to_owned(), value)),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let Some(NodeData::Element(data)) = self.nodes.get_mut(id).map(|node| &mut node.data)
        else {
            return None;
        };

        let position = data.attrs.iter().position(|(key, _)| key == name)?;
        Some(data.attrs.remove(position).1)
    }

    /// Descendant elements of `id` with the given tag, in document order.
    /// `id` itself is never included.
    pub fn elements_by_tag_name(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();

        while let Some(node) = pending.pop() {
            if self.tag_name(node) == Some(tag) {
                out.push(node);
            }
            pending.extend(self.children(node).iter().rev());
        }
        out
    }

    pub fn element(&self, id: NodeId) -> Option<Element<'_>> {
        self.is_element(id).then_some(Element { document: self, id })
    }
}

/// Borrowed handle to a live element.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    document: &'a Document,
    id: NodeId,
}

impl<'a> Element<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn tag_name(&self) -> &'a str {
        self.document.tag_name(self.id).unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.document.attribute(self.id, name)
    }

    pub fn attributes(&self) -> &'a [(String, String)] {
        self.document.attributes(self.id)
    }

    /// Parent element, `None` when the parent is the document node.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.document
            .parent(self.id)
            .and_then(|parent| self.document.element(parent))
    }

    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let document = self.document;
        document
            .element_children(self.id)
            .filter_map(move |child| document.element(child))
    }

    pub fn elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        self.document.elements_by_tag_name(self.id, tag)
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document) && self.id == other.id
    }
}

impl Eq for Element<'_> {}
