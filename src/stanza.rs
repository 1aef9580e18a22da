//! Stanza element model.
//!
//! A deliberately small XML element tree: enough to build the vendor
//! stanzas this crate emits and to inspect the ones it receives. The
//! XML stream itself (framing, parsing off the socket, TLS) belongs to
//! the host transport; this module only models the element structure
//! handed across that boundary.
//!
//! Serialization is deterministic: attributes keep insertion order,
//! absent parts are omitted entirely, and an element with no content
//! self-closes.

use std::fmt;

/// One XML element: name, optional namespace, attributes, children, text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element name
    pub name: String,
    /// `xmlns` value, if namespaced
    pub namespace: Option<String>,
    /// Attributes in insertion order
    pub attrs: Vec<(String, String)>,
    /// Child elements in insertion order
    pub children: Vec<Element>,
    /// Text content
    pub text: Option<String>,
}

impl Element {
    /// Create an element with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Set the `xmlns` namespace.
    pub fn ns(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Append an attribute.
    pub fn attr(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text content.
    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// First child with the given name, if any.
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Attribute value by name, if present.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, empty string if none.
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Whether name and namespace both match.
    pub fn is(&self, name: &str, namespace: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Serialize to an XML string.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        if let Some(ref ns) = self.namespace {
            out.push_str(" xmlns='");
            out.push_str(&escape_attr(ns));
            out.push('\'');
        }
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("='");
            out.push_str(&escape_attr(value));
            out.push('\'');
        }

        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        if let Some(ref text) = self.text {
            out.push_str(&escape_text(text));
        }
        for child in &self.children {
            child.write_xml(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_xml())
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
