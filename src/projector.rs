//! Turns match results into markup
//!
//! Each non-terminal node of a parse tree becomes an element over the same
//! span. Existing elements that the grammar consumed as tokens are moved
//! under the element of the node that consumed them.

use crate::document::{Document, DocumentError, Element, ElementId, Placement};
use crate::options::ScanOptions;
use crate::parse_tree::{MatchFailure, ParseTree};
use tracing::debug;

/// Namespace of parse error markers
pub const FN_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions";

pub struct Projector<'a> {
    document: &'a mut Document,
    enclosing: ElementId,
    /// Absolute offset of the fragment start
    base: usize,
    namespace: Option<&'a str>,
    prefix: Option<&'a str>,
}

impl<'a> Projector<'a> {
    pub fn new(
        document: &'a mut Document,
        enclosing: ElementId,
        base: usize,
        options: &'a ScanOptions,
    ) -> Self {
        Projector {
            document,
            enclosing,
            base,
            namespace: options.inserted_namespace_uri.as_deref(),
            prefix: options.inserted_namespace_prefix.as_deref(),
        }
    }

    /// Insert a zero-width `fn:error` marker at the absolute offset `at`
    pub fn project_failure(
        &mut self,
        failure: &MatchFailure,
        at: usize,
    ) -> Result<ElementId, DocumentError> {
        debug!("Marking parse error at {}: {}", at, failure);
        let marker = Element::new("error")
            .with_namespace(FN_NAMESPACE)
            .with_prefix("fn")
            .with_attribute("NT", failure.nonterminal.clone())
            .with_attribute("line", failure.line.to_string())
            .with_attribute("column", failure.column.to_string())
            .with_attribute("position", failure.position.to_string())
            .with_attribute("message", failure.message());
        self.document
            .insert(marker, Placement::Anchor, at, at, &[self.enclosing])
    }

    /// Insert elements for every non-terminal in `tree`
    pub fn project_tree(&mut self, tree: &ParseTree) -> Result<(), DocumentError> {
        debug!(
            "Projecting match [{}, {}) at {}",
            tree.start(),
            tree.end(),
            self.base
        );
        let mut open = vec![self.enclosing];
        self.visit(tree, &mut open)
    }

    fn visit(&mut self, tree: &ParseTree, open: &mut Vec<ElementId>) -> Result<(), DocumentError> {
        let ParseTree::Node {
            kind,
            start,
            end,
            children,
        } = tree
        else {
            return Ok(());
        };

        let element = self.element_for(kind);
        let id = self.document.insert(
            element,
            Placement::Outer,
            self.base + start,
            self.base + end,
            open,
        )?;

        open.push(id);
        for child in children {
            self.visit(child, open)?;
        }
        open.pop();

        let mut tokens = children.iter().filter_map(|child| match child {
            ParseTree::Token { element, .. } => Some(*element),
            _ => None,
        });
        if let Some(first) = tokens.next() {
            let last = tokens.last().unwrap_or(first);
            self.adopt(id, first, last)?;
        }
        Ok(())
    }

    fn element_for(&self, kind: &str) -> Element {
        let element = Element::new(kind);
        match (self.namespace, self.prefix) {
            (Some(uri), Some(prefix)) => element.with_namespace(uri).with_prefix(prefix),
            (Some(uri), None) => element.with_namespace(uri),
            (None, _) => element,
        }
    }

    /// Move the sibling run from `first` to `last` under `id`. Tokens are
    /// resolved to their ancestor at the level of `id`; one that `id`
    /// already contains stands for `id` itself.
    fn adopt(&mut self, id: ElementId, first: ElementId, last: ElementId) -> Result<(), DocumentError> {
        let Some(parent) = self.document.parent(id) else {
            return Ok(());
        };
        let first = self.sibling_of(id, parent, first)?;
        let last = self.sibling_of(id, parent, last)?;

        let siblings = self.document.children(parent);
        let index = |target: ElementId| siblings.iter().position(|&s| s == target);
        let (Some(a), Some(b)) = (index(first), index(last)) else {
            return Err(DocumentError::Corrupt {
                name: self.document.element(id).qname(),
                reason: "sibling missing from its parent",
            });
        };
        let run: Vec<ElementId> = siblings[a.min(b)..=a.max(b)]
            .iter()
            .copied()
            .filter(|&s| s != id)
            .collect();

        for element in run {
            self.document.move_into(element, id)?;
        }
        Ok(())
    }

    fn sibling_of(
        &self,
        id: ElementId,
        parent: ElementId,
        token: ElementId,
    ) -> Result<ElementId, DocumentError> {
        let mut current = token;
        loop {
            if current == id {
                return Ok(id);
            }
            match self.document.parent(current) {
                Some(p) if p == parent => return Ok(current),
                Some(p) => current = p,
                None => {
                    return Err(DocumentError::Unrelated {
                        name: self.document.element(token).qname(),
                        parent: self.document.element(parent).qname(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: &str, start: usize, end: usize, children: Vec<ParseTree>) -> ParseTree {
        ParseTree::Node {
            kind: kind.to_string(),
            start,
            end,
            children,
        }
    }

    fn ch(c: char, position: usize) -> ParseTree {
        ParseTree::Char { ch: c, position }
    }

    #[test]
    fn test_nested_nodes() {
        let mut doc = Document::from_xml("<r>x 12</r>").unwrap();
        let options = ScanOptions::default();
        let tree = node(
            "Sum",
            0,
            2,
            vec![node("Num", 0, 1, vec![ch('1', 0)]), node("Num", 1, 2, vec![ch('2', 1)])],
        );
        let root = doc.root();
        Projector::new(&mut doc, root, 2, &options)
            .project_tree(&tree)
            .unwrap();
        assert_eq!(doc.to_xml(), "<r>x <Sum><Num>1</Num><Num>2</Num></Sum></r>");
        doc.validate().unwrap();
    }

    #[test]
    fn test_same_span_nodes_nest() {
        let mut doc = Document::from_xml("<r><n>7</n></r>").unwrap();
        let options = ScanOptions::default();
        let tree = node("Sum", 0, 1, vec![node("Num", 0, 1, vec![ch('7', 0)])]);
        let root = doc.root();
        Projector::new(&mut doc, root, 0, &options)
            .project_tree(&tree)
            .unwrap();
        assert_eq!(doc.to_xml(), "<r><Sum><Num><n>7</n></Num></Sum></r>");
    }

    #[test]
    fn test_inserted_namespace() {
        let mut doc = Document::from_text("1");
        let options = ScanOptions {
            inserted_namespace_uri: Some("urn:calc".to_string()),
            inserted_namespace_prefix: Some("c".to_string()),
            ..ScanOptions::default()
        };
        let root = doc.root();
        Projector::new(&mut doc, root, 0, &options)
            .project_tree(&node("Num", 0, 1, vec![ch('1', 0)]))
            .unwrap();
        assert_eq!(
            doc.to_xml(),
            "<wrapper><c:Num xmlns:c='urn:calc'>1</c:Num></wrapper>"
        );
    }

    #[test]
    fn test_token_adoption() {
        let mut doc = Document::from_xml("<r><tag/>x</r>").unwrap();
        let tag = doc.find_all("tag")[0];
        let options = ScanOptions::default();
        let tree = node(
            "Rule",
            0,
            1,
            vec![
                ParseTree::Token {
                    element: tag,
                    start: 0,
                    end: 0,
                },
                ch('x', 0),
            ],
        );
        let root = doc.root();
        Projector::new(&mut doc, root, 0, &options)
            .project_tree(&tree)
            .unwrap();
        assert_eq!(doc.to_xml(), "<r><Rule><tag/>x</Rule></r>");
        doc.validate().unwrap();
    }

    #[test]
    fn test_token_outside_parent_is_rejected() {
        let mut doc = Document::from_xml("<r><a>1</a><b><t/>2</b></r>").unwrap();
        let t = doc.find_all("t")[0];
        let a = doc.find_all("a")[0];
        let options = ScanOptions::default();
        let tree = node(
            "X",
            0,
            1,
            vec![
                ch('1', 0),
                ParseTree::Token {
                    element: t,
                    start: 1,
                    end: 1,
                },
            ],
        );
        let err = Projector::new(&mut doc, a, 0, &options)
            .project_tree(&tree)
            .unwrap_err();
        assert!(matches!(err, DocumentError::Unrelated { .. }));
    }

    #[test]
    fn test_failure_marker() {
        let mut doc = Document::from_xml("<r>a<c>12x</c></r>").unwrap();
        let c = doc.find_all("c")[0];
        let options = ScanOptions::default();
        let failure = MatchFailure {
            nonterminal: "num".to_string(),
            line: 1,
            column: 3,
            position: 2,
        };
        Projector::new(&mut doc, c, 1, &options)
            .project_failure(&failure, 3)
            .unwrap();
        let marker = doc.find_all("error")[0];
        assert_eq!(doc.parent(marker), Some(c));
        let element = doc.element(marker);
        assert_eq!(element.namespace(), Some(FN_NAMESPACE));
        assert_eq!(element.attribute("NT"), Some("num"));
        assert_eq!(element.attribute("position"), Some("2"));
        assert_eq!((element.start(), element.end()), (3, 3));
    }
}
