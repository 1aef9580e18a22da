//! Authentication negotiation and the rebind exchange.
//!
//! Exactly two mechanisms exist: resume a saved session via rebind, or
//! delegate to the transport's standard SASL negotiation. The choice
//! is a two-way branch, not an open plugin set: rebind runs only when
//! the server advertises it, a session record is saved, and the caller
//! has not forced a fresh login.
//!
//! [`RebindAttempt`] is the state machine for one rebind exchange: a
//! single request stanza out, a single terminal stanza back. At most
//! one attempt is in flight per connection; the facade enforces that.

use crate::error::{P1Error, Result};
use crate::jid::Jid;
use crate::protocol::capabilities::StreamCapabilities;
use crate::protocol::REBIND_NS;
use crate::stanza::Element;
use crate::store::SessionRecord;

/// Authentication mechanism selected for a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// Resume the saved session via the rebind exchange
    Rebind,
    /// Delegate to the transport's own mechanism
    Standard,
}

/// Decide the mechanism for a new connection attempt.
///
/// Rebind iff the server supports it, a session record is saved, and
/// a fresh login was not forced. A rejected rebind is not retried with
/// the standard mechanism automatically; that is the caller's call on
/// the next attempt (rebind failures must stay visible).
pub fn select_mechanism(
    caps: &StreamCapabilities,
    record: Option<&SessionRecord>,
    force_fresh: bool,
) -> Mechanism {
    if caps.supports_rebind && record.is_some() && !force_fresh {
        Mechanism::Rebind
    } else {
        Mechanism::Standard
    }
}

/// Rebind attempt state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Request sent or ready to send, awaiting the terminal stanza
    Pending,
    /// Server acknowledged the resume
    Succeeded,
    /// Server declined, or the transport dropped mid-handshake
    Failed,
}

/// One rebind authentication exchange.
pub struct RebindAttempt {
    session_id: String,
    jid: Jid,
    state: AttemptState,
}

/// Outcome of a successful rebind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebindSuccess {
    /// Session id to persist: the server-issued replacement when the
    /// success stanza carried one, otherwise the attempted id
    pub session_id: String,
    /// JID of the resumed session, already bound (no resource-binding
    /// step follows)
    pub jid: Jid,
}

impl RebindAttempt {
    /// Create an attempt targeting the given saved session.
    pub fn new(session_id: &str, jid: Jid) -> Self {
        Self {
            session_id: session_id.to_string(),
            jid,
            state: AttemptState::Pending,
        }
    }

    /// Session id this attempt targets.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// JID this attempt targets.
    pub fn jid(&self) -> &Jid {
        &self.jid
    }

    /// Current state.
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Build the rebind request stanza.
    pub fn request(&self) -> Element {
        Element::new("rebind")
            .ns(REBIND_NS)
            .child(Element::new("jid").text(&self.jid.to_string()))
            .child(Element::new("sid").text(&self.session_id))
    }

    /// Process the server's terminal stanza.
    ///
    /// Success means the transport's session state may be treated as
    /// authenticated and bound. Failure carries the server-supplied
    /// reason; the saved session record is not touched here, so a
    /// stale session is never re-persisted.
    pub fn process_response(&mut self, response: &Element) -> Result<RebindSuccess> {
        if self.state != AttemptState::Pending {
            return Err(P1Error::Protocol(format!(
                "Cannot process rebind response in state {:?}",
                self.state
            )));
        }

        if response.is("rebind", REBIND_NS) {
            self.state = AttemptState::Succeeded;
            // Server may issue a replacement session id.
            let session_id = response
                .find_child("sid")
                .map(|sid| sid.text_content().to_string())
                .filter(|sid| !sid.is_empty())
                .unwrap_or_else(|| self.session_id.clone());
            tracing::info!("rebind succeeded for {}", self.jid);
            Ok(RebindSuccess {
                session_id,
                jid: self.jid.clone(),
            })
        } else if response.is("failure", REBIND_NS) {
            self.state = AttemptState::Failed;
            let reason = match response.text_content() {
                "" => "unspecified".to_string(),
                text => text.to_string(),
            };
            tracing::info!("rebind rejected for {}: {}", self.jid, reason);
            Err(P1Error::RebindRejected(reason))
        } else {
            Err(P1Error::Protocol(format!(
                "Unexpected stanza <{}> during rebind",
                response.name
            )))
        }
    }

    /// Resolve the attempt as failed because the transport dropped
    /// mid-handshake. Returns the error to surface to the caller.
    pub fn fail_disconnected(&mut self) -> P1Error {
        self.state = AttemptState::Failed;
        P1Error::TransportDisconnected("stream closed during rebind".to_string())
    }
}
