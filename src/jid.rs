//! JID (Jabber ID) handling.
//!
//! A JID is the structured identifier `node@domain/resource` used
//! throughout the rebind protocol. Only the syntactic split is
//! implemented here; stringprep profiles are the transport's concern.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::P1Error;

/// Structured `node@domain/resource` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jid {
    /// Local part (before `@`), absent for domain-only JIDs
    pub node: Option<String>,
    /// Domain part, always present
    pub domain: String,
    /// Resource part (after `/`), absent for bare JIDs
    pub resource: Option<String>,
}

impl Jid {
    /// Create a full JID from its three parts.
    pub fn full(node: &str, domain: &str, resource: &str) -> Self {
        Self {
            node: Some(node.to_string()),
            domain: domain.to_string(),
            resource: Some(resource.to_string()),
        }
    }

    /// Create a bare JID (no resource).
    pub fn bare(node: &str, domain: &str) -> Self {
        Self {
            node: Some(node.to_string()),
            domain: domain.to_string(),
            resource: None,
        }
    }

    /// The bare form of this JID (resource stripped).
    pub fn to_bare(&self) -> Self {
        Self {
            node: self.node.clone(),
            domain: self.domain.clone(),
            resource: None,
        }
    }

    /// Whether this JID carries a resource.
    pub fn is_full(&self) -> bool {
        self.resource.is_some()
    }
}

impl FromStr for Jid {
    type Err = P1Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(P1Error::InvalidJid("empty string".to_string()));
        }

        let (bare, resource) = match s.split_once('/') {
            Some((bare, res)) if !res.is_empty() => (bare, Some(res.to_string())),
            Some(_) => return Err(P1Error::InvalidJid(format!("empty resource in '{s}'"))),
            None => (s, None),
        };

        let (node, domain) = match bare.split_once('@') {
            Some((node, domain)) if !node.is_empty() && !domain.is_empty() => {
                (Some(node.to_string()), domain.to_string())
            },
            Some(_) => return Err(P1Error::InvalidJid(format!("empty node or domain in '{s}'"))),
            None if !bare.is_empty() => (None, bare.to_string()),
            None => return Err(P1Error::InvalidJid(format!("empty domain in '{s}'"))),
        };

        Ok(Self {
            node,
            domain,
            resource,
        })
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref node) = self.node {
            write!(f, "{node}@")?;
        }
        write!(f, "{}", self.domain)?;
        if let Some(ref resource) = self.resource {
            write!(f, "/{resource}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_jid() {
        let jid: Jid = "user@example.com/mobile".parse().unwrap();
        assert_eq!(jid.node.as_deref(), Some("user"));
        assert_eq!(jid.domain, "example.com");
        assert_eq!(jid.resource.as_deref(), Some("mobile"));
        assert!(jid.is_full());
    }

    #[test]
    fn test_parse_bare_jid() {
        let jid: Jid = "user@example.com".parse().unwrap();
        assert!(!jid.is_full());
        assert_eq!(jid.to_string(), "user@example.com");
    }

    #[test]
    fn test_parse_domain_jid() {
        let jid: Jid = "example.com".parse().unwrap();
        assert!(jid.node.is_none());
        assert_eq!(jid.domain, "example.com");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<Jid>().is_err());
        assert!("@example.com".parse::<Jid>().is_err());
        assert!("user@".parse::<Jid>().is_err());
        assert!("user@example.com/".parse::<Jid>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["user@example.com/mobile", "user@example.com", "example.com"] {
            let jid: Jid = s.parse().unwrap();
            assert_eq!(jid.to_string(), s);
        }
    }

    #[test]
    fn test_to_bare() {
        let jid: Jid = "user@example.com/mobile".parse().unwrap();
        assert_eq!(jid.to_bare().to_string(), "user@example.com");
    }
}
