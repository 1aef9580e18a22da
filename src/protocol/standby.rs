//! Standby/active lifecycle signaling.
//!
//! `<standby/>` tells the server the client is backgrounded and push
//! delivery should take over; `<active/>` reverses it. Each call
//! returns a [`Receipt`] so the application can block until the
//! stanza has actually left the process, the write barrier needed
//! before an OS-level suspend.
//!
//! The two signals are independent stanzas with no mutual exclusion;
//! ordering on the wire is the transport's FIFO submission order.

use std::sync::Arc;

use crate::protocol::PUSH_NS;
use crate::receipt::Receipt;
use crate::stanza::Element;
use crate::transport::StanzaTransport;

/// Builds and submits the standby/active signaling stanzas.
pub struct StandbyController {
    transport: Arc<dyn StanzaTransport>,
}

impl StandbyController {
    /// Create a controller submitting through the given transport.
    pub fn new(transport: Arc<dyn StanzaTransport>) -> Self {
        Self { transport }
    }

    /// Signal the server this client is going to standby.
    pub fn go_on_standby(&self) -> Receipt {
        tracing::debug!("going on standby");
        self.transport.submit(Element::new("standby").ns(PUSH_NS))
    }

    /// Signal the server this client is active again.
    pub fn go_off_standby(&self) -> Receipt {
        tracing::debug!("going off standby");
        self.transport.submit(Element::new("active").ns(PUSH_NS))
    }
}
