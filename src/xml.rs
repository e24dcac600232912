//! XML conversion for documents
//!
//! Reading flattens the element tree of an XML document into a character
//! buffer plus element spans; writing interleaves the buffer with the element
//! tree again. Comments and processing instructions are not kept.

use crate::document::{Document, DocumentError, Element, ElementId};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

impl Document {
    /// Parse XML into a document whose root is the XML root element
    pub fn from_xml(xml: &str) -> Result<Document, DocumentError> {
        let parsed = roxmltree::Document::parse(xml).map_err(|e| DocumentError::Xml(e.to_string()))?;

        let mut doc = Document {
            text: Vec::new(),
            elements: Vec::new(),
            root: ElementId(0),
        };
        doc.read_element(parsed.root_element(), None);
        Ok(doc)
    }

    fn read_element(&mut self, node: roxmltree::Node, parent: Option<ElementId>) -> ElementId {
        let tag = node.tag_name();
        let mut element = Element::new(tag.name());
        if let Some(uri) = tag.namespace() {
            element = element.with_namespace(uri);
            if let Some(prefix) = node.lookup_prefix(uri) {
                element = element.with_prefix(prefix);
            }
        }
        for attr in node.attributes() {
            let name = attr.name();
            element = match attr.namespace() {
                // The xml prefix is bound in every document
                Some(XML_NAMESPACE) => element.with_attribute(format!("xml:{}", name), attr.value()),
                Some(uri) => match node.lookup_prefix(uri) {
                    Some(prefix) => element.with_namespaced_attribute(prefix, uri, name, attr.value()),
                    None => element.with_attribute(name, attr.value()),
                },
                None => element.with_attribute(name, attr.value()),
            };
        }

        let id = ElementId(self.elements.len());
        element.start = self.text.len();
        element.parent = parent;
        self.elements.push(element);

        for child in node.children() {
            if child.is_element() {
                let child_id = self.read_element(child, Some(id));
                self.elements[id.0].children.push(child_id);
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    self.text.extend(text.chars());
                }
            }
        }

        self.elements[id.0].end = self.text.len();
        id
    }

    /// Serialize the whole document
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        let mut scope: Vec<(Option<String>, Option<String>)> = Vec::new();
        self.write_element(self.root, &mut scope, &mut out);
        out
    }

    /// Serialize one element and its content
    pub fn element_to_xml(&self, id: ElementId) -> String {
        let mut out = String::new();
        let mut scope = Vec::new();
        self.write_element(id, &mut scope, &mut out);
        out
    }

    fn write_element(
        &self,
        id: ElementId,
        scope: &mut Vec<(Option<String>, Option<String>)>,
        out: &mut String,
    ) {
        let element = self.element(id);
        let prefix = element.prefix().map(str::to_string);
        let namespace = element.namespace().map(str::to_string);

        // Innermost binding of this prefix; an unbound default prefix is no namespace
        let bound = scope
            .iter()
            .rev()
            .find(|(p, _)| *p == prefix)
            .map(|(_, ns)| ns.clone());
        let declare = match &bound {
            Some(ns) => *ns != namespace,
            None => prefix.is_some() || namespace.is_some(),
        };
        let scope_depth = scope.len();

        out.push('<');
        out.push_str(&element.qname());
        if declare {
            let attr = match &prefix {
                Some(p) => format!("xmlns:{}", p),
                None => "xmlns".to_string(),
            };
            let value = namespace.as_deref().unwrap_or("");
            out.push_str(&format!(" {}='{}'", attr, escape_xml_attr(value)));
            scope.push((prefix, namespace));
        }
        for (prefix, uri) in element.attribute_namespaces() {
            let bound = scope
                .iter()
                .rev()
                .find(|(p, _)| p.as_deref() == Some(prefix.as_str()))
                .and_then(|(_, ns)| ns.as_deref());
            if bound != Some(uri.as_str()) {
                out.push_str(&format!(" xmlns:{}='{}'", prefix, escape_xml_attr(uri)));
                scope.push((Some(prefix.clone()), Some(uri.clone())));
            }
        }
        for (name, value) in element.attributes() {
            out.push_str(&format!(" {}='{}'", name, escape_xml_attr(value)));
        }

        if element.children().is_empty() && element.is_zero_width() {
            out.push_str("/>");
        } else {
            out.push('>');
            let mut cursor = element.start();
            for &child in element.children() {
                let c = self.element(child);
                out.push_str(&escape_xml_text(&self.slice(cursor, c.start())));
                self.write_element(child, scope, out);
                cursor = c.end();
            }
            out.push_str(&escape_xml_text(&self.slice(cursor, element.end())));
            out.push_str("</");
            out.push_str(&element.qname());
            out.push('>');
        }

        scope.truncate(scope_depth);
    }
}

fn escape_xml_attr(s: &str) -> String {
    // Attribute values are written in single quotes
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('\'', "&apos;")
}

fn escape_xml_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;")
}
