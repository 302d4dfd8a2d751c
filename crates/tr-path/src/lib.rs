//! Structural addressing of scheme elements.
//!
//! An [`ElementAddress`] is the chain of `tag[ordinal]` steps from the top of
//! a tree down to an element, where the ordinal is the 1-based position among
//! preceding siblings sharing the tag. Addresses only carry shape: inserting
//! or removing an earlier same-tag sibling anywhere along the chain makes an
//! old address point at a different element.

use std::fmt;
use std::str::FromStr;
use tr_core::TrellisError;
use tr_core::TrellisResult;
use tr_dom::Document;
use tr_dom::NodeId;

/// One `tag[ordinal]` step of an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub tag: String,
    pub ordinal: usize,
}

impl PathStep {
    pub fn new(tag: impl Into<String>, ordinal: usize) -> Self {
        Self {
            tag: tag.into(),
            ordinal,
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag, self.ordinal)
    }
}

/// Root-to-element structural path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ElementAddress {
    steps: Vec<PathStep>,
}

impl ElementAddress {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Remaining steps below `prefix`, `None` when `prefix` is not a prefix.
    pub fn strip_prefix(&self, prefix: &ElementAddress) -> Option<ElementAddress> {
        self.steps
            .strip_prefix(prefix.steps.as_slice())
            .map(|rest| ElementAddress {
                steps: rest.to_vec(),
            })
    }

    /// Steps joined by `/` without the leading slash.
    pub fn to_relative_string(&self) -> String {
        self.steps
            .iter()
            .map(PathStep::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for ElementAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl FromStr for ElementAddress {
    type Err = TrellisError;

    /// Accepts only fully indexed paths, e.g. `/div[1]/gui-vbox[2]`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let expr = PathExpr::parse(input)?;
        let mut steps = Vec::with_capacity(expr.steps.len());
        for step in expr.steps {
            match (step.test, step.position) {
                (NodeTest::Tag(tag), Some(ordinal)) if ordinal > 0 => {
                    steps.push(PathStep { tag, ordinal });
                }
                _ => {
                    return Err(TrellisError::new(
                        "path.not_an_address",
                        format!("`{input}` has a step without a tag name and ordinal"),
                    ));
                }
            }
        }
        Ok(ElementAddress { steps })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    Any,
    Tag(String),
}

impl NodeTest {
    fn matches(&self, tag: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Tag(expected) => expected == tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprStep {
    pub test: NodeTest,
    /// 1-based position among matching siblings; `None` selects all of them.
    pub position: Option<usize>,
}

/// Parsed structural path expression: an absolute chain of child steps, each
/// `name`, `*`, `name[n]` or `*[n]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    steps: Vec<ExprStep>,
}

impl PathExpr {
    pub fn parse(input: &str) -> TrellisResult<Self> {
        let Some(body) = input.trim().strip_prefix('/') else {
            return Err(syntax(input, "path must be absolute"));
        };

        if body.is_empty() {
            return Err(syntax(input, "path selects no element"));
        }

        let mut steps = Vec::new();
        for segment in body.split('/') {
            if segment.is_empty() {
                return Err(syntax(input, "empty step (descendant axis is not supported)"));
            }
            steps.push(parse_step(input, segment)?);
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ExprStep] {
        &self.steps
    }
}

impl From<&ElementAddress> for PathExpr {
    fn from(address: &ElementAddress) -> Self {
        Self {
            steps: address
                .steps
                .iter()
                .map(|step| ExprStep {
                    test: NodeTest::Tag(step.tag.clone()),
                    position: Some(step.ordinal),
                })
                .collect(),
        }
    }
}

fn parse_step(input: &str, segment: &str) -> TrellisResult<ExprStep> {
    let (name, position) = match segment.split_once('[') {
        Some((name, rest)) => {
            let Some(index) = rest.strip_suffix(']') else {
                return Err(syntax(input, "unterminated predicate"));
            };
            let position = index.trim().parse::<usize>().map_err(|_| {
                syntax(input, "only positional predicates are supported")
            })?;
            (name, Some(position))
        }
        None => (segment, None),
    };

    let test = if name == "*" {
        NodeTest::Any
    } else if !name.is_empty() && name.bytes().all(is_name_char) {
        NodeTest::Tag(name.to_ascii_lowercase())
    } else {
        return Err(syntax(input, "invalid element name"));
    };

    Ok(ExprStep { test, position })
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

fn syntax(input: &str, reason: &str) -> TrellisError {
    TrellisError::new("path.syntax", format!("`{input}`: {reason}"))
}

/// Evaluates `expr` below `context` and returns the first matching element in
/// document order.
pub fn evaluate(
    document: &Document,
    context: NodeId,
    expr: &PathExpr,
) -> TrellisResult<Option<NodeId>> {
    if document.node(context).is_none() {
        return Err(TrellisError::new(
            "path.context_missing",
            format!("context node {context} does not exist"),
        ));
    }

    let mut current = vec![context];
    for step in &expr.steps {
        let mut next = Vec::new();
        for node in current {
            let mut matching = document.element_children(node).filter(|child| {
                document
                    .tag_name(*child)
                    .is_some_and(|tag| step.test.matches(tag))
            });
            match step.position {
                // Position 0 is valid syntax that never matches.
                Some(0) => {}
                Some(position) => next.extend(matching.nth(position - 1)),
                None => next.extend(matching),
            }
        }

        if next.is_empty() {
            return Ok(None);
        }
        current = next;
    }

    Ok(current.first().copied())
}

/// Structural address of `node`. Non-element nodes have an empty address.
pub fn address_of(document: &Document, node: NodeId) -> ElementAddress {
    let mut steps = Vec::new();
    let mut cursor = Some(node);

    while let Some(id) = cursor {
        let Some(tag) = document.tag_name(id) else {
            break;
        };
        steps.push(PathStep::new(tag, sibling_ordinal(document, id, tag)));
        cursor = document.parent(id);
    }

    steps.reverse();
    ElementAddress { steps }
}

fn sibling_ordinal(document: &Document, node: NodeId, tag: &str) -> usize {
    let Some(parent) = document.parent(node) else {
        return 1;
    };

    1 + document
        .children(parent)
        .iter()
        .take_while(|sibling| **sibling != node)
        .filter(|sibling| document.tag_name(**sibling) == Some(tag))
        .count()
}

/// Resolves `path` below `root`. Failures are reported as a `tracing` warning
/// and yield `None`, same as a path that matches nothing.
pub fn element_at(document: &Document, root: NodeId, path: &str) -> Option<NodeId> {
    let result = PathExpr::parse(path).and_then(|expr| evaluate(document, root, &expr));
    match result {
        Ok(found) => found,
        Err(error) => {
            tracing::warn!(path, %error, "structural path evaluation failed");
            None
        }
    }
}

/// Resolves an already parsed address below `root`.
pub fn element_at_address(
    document: &Document,
    root: NodeId,
    address: &ElementAddress,
) -> Option<NodeId> {
    if address.is_empty() {
        return None;
    }

    match evaluate(document, root, &PathExpr::from(address)) {
        Ok(found) => found,
        Err(error) => {
            tracing::warn!(%address, %error, "structural path evaluation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ElementAddress;
    use super::PathExpr;
    use super::PathStep;
    use super::address_of;
    use super::element_at;
    use super::element_at_address;
    use proptest::prelude::*;
    use tr_dom::Document;
    use tr_markup::SchemeOptions;
    use tr_markup::parse_scheme;

    const SCHEME: &str = concat!(
        "<application-window data-id=\"main\">\n",
        "  <gui-vbox>\n",
        "    <gui-vbox-container><gui-button data-id=\"a\"></gui-button></gui-vbox-container>\n",
        "    <gui-vbox-container><gui-label data-id=\"b\"></gui-label>",
        "<gui-button data-id=\"c\"></gui-button></gui-vbox-container>\n",
        "  </gui-vbox>\n",
        "</application-window>",
        "<application-window data-id=\"second\"><gui-button data-id=\"d\"></gui-button></application-window>",
    );

    fn doc() -> Document {
        parse_scheme(SCHEME, &SchemeOptions::default()).unwrap_or_else(|_| unreachable!())
    }

    fn by_id(doc: &Document, id: &str) -> usize {
        (0..doc.node_count())
            .find(|node| doc.attribute(*node, "data-id") == Some(id))
            .unwrap_or_else(|| unreachable!("missing {id}"))
    }

    #[test]
    fn address_counts_same_tag_siblings_only() {
        let doc = doc();
        let c = by_id(&doc, "c");
        assert_eq!(
            address_of(&doc, c).to_string(),
            "/div[1]/application-window[1]/gui-vbox[1]/gui-vbox-container[2]/gui-button[1]"
        );
        let d = by_id(&doc, "d");
        assert_eq!(
            address_of(&doc, d).to_string(),
            "/div[1]/application-window[2]/gui-button[1]"
        );
    }

    #[test]
    fn element_at_inverts_address_of() {
        let doc = doc();
        for id in ["main", "a", "b", "c", "d"] {
            let node = by_id(&doc, id);
            let address = address_of(&doc, node);
            assert_eq!(element_at(&doc, doc.root(), &address.to_string()), Some(node));
            assert_eq!(element_at_address(&doc, doc.root(), &address), Some(node));
        }
    }

    #[test]
    fn unindexed_steps_pick_first_match_in_document_order() {
        let doc = doc();
        let found = element_at(
            &doc,
            doc.root(),
            "/div/application-window/gui-vbox/gui-vbox-container/gui-button",
        );
        assert_eq!(found, Some(by_id(&doc, "a")));
        let second = element_at(&doc, doc.root(), "/div/application-window[2]/*");
        assert_eq!(second, Some(by_id(&doc, "d")));
    }

    #[test]
    fn missing_and_malformed_paths_yield_none() {
        let doc = doc();
        assert_eq!(element_at(&doc, doc.root(), "/div[1]/application-window[3]"), None);
        assert_eq!(element_at(&doc, doc.root(), "/div[1]/application-window[1]/"), None);
        assert_eq!(element_at(&doc, doc.root(), "div[1]"), None);
        assert_eq!(element_at(&doc, doc.root(), "/div[1]//gui-button"), None);
        assert_eq!(element_at(&doc, doc.root(), "/div[@id='x']"), None);
        assert_eq!(element_at(&doc, 9999, "/div[1]"), None);
    }

    #[test]
    fn parse_reports_syntax_errors() {
        let error = PathExpr::parse("/div[1").map(|_| ()).map_err(|e| e.code);
        assert_eq!(error, Err("path.syntax"));
    }

    #[test]
    fn address_parse_requires_ordinals() {
        let parsed = "/div[1]/gui-vbox[2]".parse::<ElementAddress>();
        assert_eq!(
            parsed,
            Ok(ElementAddress::new(vec![
                PathStep::new("div", 1),
                PathStep::new("gui-vbox", 2),
            ]))
        );
        let unindexed = "/div/gui-vbox[2]".parse::<ElementAddress>();
        assert_eq!(unindexed.map_err(|e| e.code), Err("path.not_an_address"));
    }

    #[test]
    fn strips_window_prefix() {
        let full: ElementAddress = "/div[1]/application-window[2]/gui-vbox[1]/gui-button[3]"
            .parse()
            .unwrap_or_default();
        let prefix: ElementAddress = "/div[1]/application-window[2]".parse().unwrap_or_default();
        let relative = full.strip_prefix(&prefix);
        assert_eq!(
            relative.map(|r| r.to_relative_string()).as_deref(),
            Some("gui-vbox[1]/gui-button[3]")
        );
        let other: ElementAddress = "/div[1]/application-window[1]".parse().unwrap_or_default();
        assert!(full.strip_prefix(&other).is_none());
    }

    #[test]
    fn insertion_retargets_existing_addresses() {
        let mut doc = doc();
        let a = by_id(&doc, "a");
        let address = address_of(&doc, a);

        let vbox = doc.elements_by_tag_name(doc.root(), "gui-vbox")[0];
        let slot = doc.create_element("gui-vbox-container", Vec::new());
        let inserted = doc.create_element("gui-button", vec![("data-id".into(), "new".into())]);
        assert!(doc.append_child(slot, inserted).is_ok());
        assert!(doc.insert_child(vbox, 0, slot).is_ok());

        assert_eq!(element_at_address(&doc, doc.root(), &address), Some(inserted));
    }

    const TAGS: [&str; 3] = ["gui-vbox", "gui-button", "gui-label"];

    fn build_tree(shape: &[(usize, usize, bool)]) -> (Document, Vec<usize>) {
        let mut doc = Document::new();
        let mut elements = Vec::new();
        for (parent_pick, tag_pick, with_text) in shape {
            let parent = if elements.is_empty() {
                doc.root()
            } else {
                elements[parent_pick % elements.len()]
            };
            if *with_text {
                let text = doc.create_text(" ");
                let _ = doc.append_child(parent, text);
            }
            let node = doc.create_element(TAGS[tag_pick % TAGS.len()], Vec::new());
            let _ = doc.append_child(parent, node);
            elements.push(node);
        }
        (doc, elements)
    }

    proptest! {
        #[test]
        fn prop_address_roundtrip(
            shape in prop::collection::vec((0usize..64, 0usize..3, any::<bool>()), 1..48)
        ) {
            let (doc, elements) = build_tree(&shape);
            for node in elements {
                let address = address_of(&doc, node);
                prop_assert_eq!(element_at(&doc, doc.root(), &address.to_string()), Some(node));
            }
        }
    }
}
