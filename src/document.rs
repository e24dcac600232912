//! Markup-aware document model
//!
//! A [`Document`] is an immutable character buffer with a tree of elements
//! laid over it. Every element covers a half-open `[start, end)` range of the
//! buffer. A parent's range contains each child's range, and siblings are
//! ordered by position and never overlap. Zero-width elements are allowed and
//! sit at a single offset.
//!
//! Elements live in an arena owned by the document and are addressed by
//! [`ElementId`]. Inserting an element never changes the text; it only
//! regroups existing elements.

use std::fmt;

/// Handle to an element in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    local_name: String,
    namespace: Option<String>,
    prefix: Option<String>,
    attributes: Vec<(String, String)>,
    /// Prefix bindings that attribute names rely on
    attribute_namespaces: Vec<(String, String)>,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
}

impl Element {
    /// A detached element with no namespace, ready to be inserted
    pub fn new(local_name: impl Into<String>) -> Self {
        Element {
            local_name: local_name.into(),
            namespace: None,
            prefix: None,
            attributes: Vec::new(),
            attribute_namespaces: Vec::new(),
            start: 0,
            end: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Add the attribute `prefix:name`, with `prefix` bound to `uri`
    pub fn with_namespaced_attribute(
        mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        let prefix = prefix.into();
        self.attributes.push((format!("{}:{}", prefix, name), value.into()));
        if !self.attribute_namespaces.iter().any(|(p, _)| *p == prefix) {
            self.attribute_namespaces.push((prefix, uri.into()));
        }
        self
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Qualified name as written in markup
    pub fn qname(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// `(prefix, uri)` pairs used by namespaced attributes
    pub fn attribute_namespaces(&self) -> &[(String, String)] {
        &self.attribute_namespaces
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of characters covered
    pub fn span_len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_zero_width(&self) -> bool {
        self.start == self.end
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// How a new element attaches relative to existing elements with the same
/// span or boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Wrap existing elements with the same span, unless they are open
    Outer,
    /// Nest inside existing elements with the same span
    Inner,
    /// Zero-width marker at the start offset
    Anchor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Range reversed or beyond the end of the text
    SpanOutOfRange { start: usize, end: usize, len: usize },

    /// New range partially overlaps an existing element
    Overlap {
        name: String,
        start: usize,
        end: usize,
        existing: String,
        existing_start: usize,
        existing_end: usize,
    },

    /// Element would become its own ancestor, or the root would move
    Cycle { name: String },

    /// Element does not fit inside the proposed parent
    OutsideParent {
        name: String,
        start: usize,
        end: usize,
        parent: String,
    },

    /// A pre-parsed element does not sit under the new element's parent
    Unrelated { name: String, parent: String },

    /// Siblings out of order, or a stale parent link
    Corrupt { name: String, reason: &'static str },

    /// Markup could not be read
    Xml(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::SpanOutOfRange { start, end, len } => {
                write!(f, "Span [{}, {}) is outside the text of length {}", start, end, len)
            }
            DocumentError::Overlap {
                name,
                start,
                end,
                existing,
                existing_start,
                existing_end,
            } => write!(
                f,
                "Element '{}' at [{}, {}) overlaps '{}' at [{}, {})",
                name, start, end, existing, existing_start, existing_end
            ),
            DocumentError::Cycle { name } => {
                write!(f, "Cannot move '{}' inside itself", name)
            }
            DocumentError::OutsideParent {
                name,
                start,
                end,
                parent,
            } => write!(
                f,
                "Element '{}' at [{}, {}) does not fit inside '{}'",
                name, start, end, parent
            ),
            DocumentError::Unrelated { name, parent } => {
                write!(f, "Pre-parsed element '{}' is not a descendant of '{}'", name, parent)
            }
            DocumentError::Corrupt { name, reason } => {
                write!(f, "Inconsistent element '{}': {}", name, reason)
            }
            DocumentError::Xml(message) => write!(f, "XML error: {}", message),
        }
    }
}

impl std::error::Error for DocumentError {}

#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) text: Vec<char>,
    pub(crate) elements: Vec<Element>,
    pub(crate) root: ElementId,
}

impl Document {
    /// Create a document whose root element spans all of `text`
    pub fn new(mut root: Element, text: &str) -> Self {
        let text: Vec<char> = text.chars().collect();
        root.start = 0;
        root.end = text.len();
        root.parent = None;
        root.children.clear();
        Document {
            text,
            elements: vec![root],
            root: ElementId(0),
        }
    }

    /// Plain text wrapped in a `wrapper` root element
    pub fn from_text(text: &str) -> Self {
        Self::new(Element::new("wrapper"), text)
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn text(&self) -> &[char] {
        &self.text
    }

    pub fn content(&self) -> String {
        self.text.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.text.len());
        self.text[start.min(end)..end].iter().collect()
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.elements[id.0].children
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements[id.0].parent
    }

    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|&c| c == id)?;
        siblings.get(idx + 1).copied()
    }

    /// All elements below `id` in document order, `id` itself excluded
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Elements with the given local name, root included, in document order
    pub fn find_all(&self, local_name: &str) -> Vec<ElementId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|&id| self.element(id).local_name() == local_name)
            .collect()
    }

    /// Text covered by an element
    pub fn element_text(&self, id: ElementId) -> String {
        let element = self.element(id);
        self.slice(element.start, element.end)
    }

    /// Insert `element` over `[start, end)`.
    ///
    /// The parent is found by descending from the root into any child that
    /// contains the span. A child with exactly the span is entered only if it
    /// is in `open` (or for [`Placement::Inner`]); otherwise the new element
    /// wraps it. Children of the chosen parent that lie inside the span become
    /// children of the new element, except zero-width children on the span's
    /// boundaries. [`Placement::Anchor`] ignores `end`.
    pub fn insert(
        &mut self,
        mut element: Element,
        placement: Placement,
        start: usize,
        end: usize,
        open: &[ElementId],
    ) -> Result<ElementId, DocumentError> {
        let end = if placement == Placement::Anchor { start } else { end };
        if start > end || end > self.text.len() {
            return Err(DocumentError::SpanOutOfRange {
                start,
                end,
                len: self.text.len(),
            });
        }

        let parent = self.find_parent(start, end, placement, open);
        let (lo, hi) = self.capture_range(parent, &element.local_name, start, end)?;

        let id = ElementId(self.elements.len());
        let captured: Vec<ElementId> = self.elements[parent.0].children.drain(lo..hi).collect();
        for &child in &captured {
            self.elements[child.0].parent = Some(id);
        }
        self.elements[parent.0].children.insert(lo, id);

        element.start = start;
        element.end = end;
        element.parent = Some(parent);
        element.children = captured;
        self.elements.push(element);
        Ok(id)
    }

    fn find_parent(
        &self,
        start: usize,
        end: usize,
        placement: Placement,
        open: &[ElementId],
    ) -> ElementId {
        let mut current = self.root;
        'descend: loop {
            for &child in self.children(current) {
                let c = self.element(child);
                let enterable = open.contains(&child) || placement == Placement::Inner;
                let descend = if start == end {
                    (c.start < start && start < c.end)
                        || (enterable && c.start <= start && start <= c.end)
                } else {
                    c.start <= start
                        && end <= c.end
                        && ((c.start, c.end) != (start, end) || enterable)
                };
                if descend {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Index where an element starting at `start` goes among `children`:
    /// after zero-width siblings at `start`, before anything that extends
    /// from `start` or begins later.
    fn insertion_index(&self, children: &[ElementId], start: usize) -> usize {
        children
            .iter()
            .position(|&child| {
                let c = self.element(child);
                c.start > start || (c.start == start && c.end > start)
            })
            .unwrap_or(children.len())
    }

    /// The run of `parent`'s children a new `[start, end)` element captures
    fn capture_range(
        &self,
        parent: ElementId,
        name: &str,
        start: usize,
        end: usize,
    ) -> Result<(usize, usize), DocumentError> {
        let children = self.children(parent);
        let lo = self.insertion_index(children, start);
        let mut hi = lo;
        if start < end {
            while hi < children.len() {
                let c = self.element(children[hi]);
                if c.end <= end && c.start < end {
                    hi += 1;
                } else {
                    break;
                }
            }
        }

        let overlapping = lo
            .checked_sub(1)
            .map(|idx| children[idx])
            .filter(|&before| self.element(before).end > start)
            .or_else(|| {
                children
                    .get(hi)
                    .copied()
                    .filter(|&after| self.element(after).start < end)
            });
        if let Some(existing) = overlapping {
            let e = self.element(existing);
            return Err(DocumentError::Overlap {
                name: name.to_string(),
                start,
                end,
                existing: e.qname(),
                existing_start: e.start,
                existing_end: e.end,
            });
        }

        Ok((lo, hi))
    }

    /// Re-parent `id` under `new_parent`, placing it among the new siblings
    /// by position.
    pub fn move_into(&mut self, id: ElementId, new_parent: ElementId) -> Result<(), DocumentError> {
        let name = self.element(id).qname();
        if id == self.root {
            return Err(DocumentError::Cycle { name });
        }
        let mut ancestor = Some(new_parent);
        while let Some(a) = ancestor {
            if a == id {
                return Err(DocumentError::Cycle { name });
            }
            ancestor = self.parent(a);
        }

        let (start, end) = (self.element(id).start, self.element(id).end);
        let target = self.element(new_parent);
        if start < target.start || end > target.end {
            return Err(DocumentError::OutsideParent {
                name,
                start,
                end,
                parent: target.qname(),
            });
        }
        if let Some(&existing) = target.children.iter().find(|&&child| {
            let c = self.element(child);
            child != id && c.start < end && start < c.end
        }) {
            let e = self.element(existing);
            return Err(DocumentError::Overlap {
                name,
                start,
                end,
                existing: e.qname(),
                existing_start: e.start,
                existing_end: e.end,
            });
        }

        if let Some(old_parent) = self.parent(id) {
            self.elements[old_parent.0].children.retain(|&c| c != id);
        }
        let idx = self.insertion_index(self.children(new_parent), start);
        self.elements[new_parent.0].children.insert(idx, id);
        self.elements[id.0].parent = Some(new_parent);
        Ok(())
    }

    /// Check the containment and ordering invariants of the whole tree
    pub fn validate(&self) -> Result<(), DocumentError> {
        let root = self.element(self.root);
        if root.start != 0 || root.end > self.text.len() {
            return Err(DocumentError::SpanOutOfRange {
                start: root.start,
                end: root.end,
                len: self.text.len(),
            });
        }

        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let parent = self.element(id);
            let mut previous: Option<&Element> = None;
            for &child in &parent.children {
                let c = self.element(child);
                if c.parent != Some(id) {
                    return Err(DocumentError::Corrupt {
                        name: c.qname(),
                        reason: "parent link does not match",
                    });
                }
                if c.start > c.end || c.start < parent.start || c.end > parent.end {
                    return Err(DocumentError::OutsideParent {
                        name: c.qname(),
                        start: c.start,
                        end: c.end,
                        parent: parent.qname(),
                    });
                }
                if let Some(p) = previous {
                    if p.end > c.start {
                        return Err(DocumentError::Corrupt {
                            name: c.qname(),
                            reason: "siblings overlap or are out of order",
                        });
                    }
                }
                previous = Some(c);
                stack.push(child);
            }
        }
        Ok(())
    }
}
