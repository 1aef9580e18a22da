//! Stream capability detection.
//!
//! The server advertises the proprietary extensions in its
//! `<stream:features>` element, once per connection and before
//! authentication. Detection is a pure function of that element; the
//! flags carry nothing over between connections.

use crate::protocol::{PUSH_NS, REBIND_NS};
use crate::stanza::Element;

/// Extension support advertised by the server for one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamCapabilities {
    /// Server supports push configuration (`<push xmlns='p1:push'/>`)
    pub supports_push: bool,
    /// Server supports session rebind (`<rebind xmlns='p1:rebind'/>`)
    pub supports_rebind: bool,
    /// Server hint that a rebind target exists, carried on the rebind
    /// feature element
    pub rebind_session_id: Option<String>,
}

impl StreamCapabilities {
    /// Parse the server's stream features element.
    pub fn from_features(features: &Element) -> Self {
        let mut caps = Self::default();
        for child in &features.children {
            if child.is("push", PUSH_NS) {
                caps.supports_push = true;
            } else if child.is("rebind", REBIND_NS) {
                caps.supports_rebind = true;
                // Session-id hint may be an attribute or element text.
                caps.rebind_session_id = child
                    .get_attr("id")
                    .map(str::to_string)
                    .or_else(|| child.text.clone().filter(|t| !t.is_empty()));
            }
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(children: Vec<Element>) -> Element {
        let mut el = Element::new("stream:features");
        el.children = children;
        el
    }

    #[test]
    fn test_no_extension_features() {
        let caps = StreamCapabilities::from_features(&features(vec![Element::new("bind")
            .ns("urn:ietf:params:xml:ns:xmpp-bind")]));
        assert!(!caps.supports_push);
        assert!(!caps.supports_rebind);
        assert!(caps.rebind_session_id.is_none());
    }

    #[test]
    fn test_push_and_rebind_detected() {
        let caps = StreamCapabilities::from_features(&features(vec![
            Element::new("push").ns(PUSH_NS),
            Element::new("rebind").ns(REBIND_NS),
        ]));
        assert!(caps.supports_push);
        assert!(caps.supports_rebind);
        assert!(caps.rebind_session_id.is_none());
    }

    #[test]
    fn test_rebind_session_hint() {
        let caps = StreamCapabilities::from_features(&features(vec![
            Element::new("rebind").ns(REBIND_NS).attr("id", "abc123"),
        ]));
        assert_eq!(caps.rebind_session_id.as_deref(), Some("abc123"));

        // Text form of the hint.
        let caps = StreamCapabilities::from_features(&features(vec![
            Element::new("rebind").ns(REBIND_NS).text("xyz789"),
        ]));
        assert_eq!(caps.rebind_session_id.as_deref(), Some("xyz789"));
    }

    #[test]
    fn test_wrong_namespace_ignored() {
        // Same element names in a foreign namespace must not count.
        let caps = StreamCapabilities::from_features(&features(vec![
            Element::new("push").ns("urn:xmpp:push:0"),
            Element::new("rebind").ns("other:ns"),
        ]));
        assert!(!caps.supports_push);
        assert!(!caps.supports_rebind);
    }
}
