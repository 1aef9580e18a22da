//! The extension facade.
//!
//! [`P1Extension`] composes the transport, session store, capability
//! flags, push manager, and standby controller behind the public
//! operation surface. It holds a reference to the transport rather
//! than extending the stream type: plain composition instead of the
//! open-class extension pattern.
//!
//! All methods are driven from one serialized context per connection
//! (`&mut self`); the transport's write path runs on its own task and
//! submission never blocks. The host stream drives the lifecycle:
//!
//! ```rust,ignore
//! ext.handle_stream_features(&features);
//! match ext.begin_authentication()? {
//!     Mechanism::Rebind => { /* feed the reply to process_rebind_response */ }
//!     Mechanism::Standard => { /* run SASL, then ext.on_authenticated(..) */ }
//! }
//! ```

use std::sync::Arc;

use crate::error::{P1Error, Result};
use crate::jid::Jid;
use crate::protocol::auth::{select_mechanism, AttemptState, Mechanism, RebindAttempt};
use crate::protocol::capabilities::StreamCapabilities;
use crate::protocol::push::{PushConfig, PushManager};
use crate::protocol::standby::StandbyController;
use crate::receipt::Receipt;
use crate::stanza::Element;
use crate::store::{SessionRecord, SessionStore};
use crate::transport::StanzaTransport;

/// Post-authentication session info supplied by the transport after a
/// standard (non-rebind) login.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Server-issued session id
    pub session_id: String,
    /// Bound full JID
    pub jid: Jid,
}

/// Client-side ProcessOne extension state for one stream.
pub struct P1Extension {
    transport: Arc<dyn StanzaTransport>,
    store: Arc<dyn SessionStore>,
    caps: StreamCapabilities,
    push: PushManager,
    standby: StandbyController,
    attempt: Option<RebindAttempt>,
    force_fresh_login: bool,
}

impl P1Extension {
    /// Create the extension over a transport and session store.
    pub fn new(transport: Arc<dyn StanzaTransport>, store: Arc<dyn SessionStore>) -> Self {
        let standby = StandbyController::new(Arc::clone(&transport));
        Self {
            transport,
            store,
            caps: StreamCapabilities::default(),
            push: PushManager::new(),
            standby,
            attempt: None,
            force_fresh_login: false,
        }
    }

    /// Create the extension from configuration, backed by the file
    /// store at the configured path.
    pub fn from_config(
        transport: Arc<dyn StanzaTransport>,
        config: &crate::config::ExtensionConfig,
    ) -> Result<Self> {
        let path = config
            .store_path
            .as_ref()
            .ok_or_else(|| P1Error::Config("no session store path configured".to_string()))?;
        let store = Arc::new(crate::store::FileStore::new(path));
        let mut ext = Self::new(transport, store);
        ext.force_fresh_login = config.force_fresh_login;
        Ok(ext)
    }

    /// Skip rebind on the next authentication even when eligible.
    pub fn set_force_fresh_login(&mut self, force: bool) {
        self.force_fresh_login = force;
    }

    // ---- capabilities -------------------------------------------------

    /// Consume the server's stream features, replacing all capability
    /// flags for this connection.
    pub fn handle_stream_features(&mut self, features: &Element) {
        self.caps = StreamCapabilities::from_features(features);
        tracing::debug!(
            "stream features: push={} rebind={} hint={:?}",
            self.caps.supports_push,
            self.caps.supports_rebind,
            self.caps.rebind_session_id
        );
    }

    /// Whether the server advertised push support.
    pub fn supports_push(&self) -> bool {
        self.caps.supports_push
    }

    /// Whether the server advertised rebind support.
    pub fn supports_rebind(&self) -> bool {
        self.caps.supports_rebind
    }

    /// Server-advertised rebind session hint, if any.
    pub fn rebind_session_id(&self) -> Option<&str> {
        self.caps.rebind_session_id.as_deref()
    }

    /// The persisted session record, if any.
    pub fn saved_session(&self) -> Result<Option<SessionRecord>> {
        self.store.load()
    }

    // ---- authentication -----------------------------------------------

    /// Pick and start the authentication mechanism for this connection.
    ///
    /// Returns `Mechanism::Rebind` after submitting the rebind request
    /// (feed the server's reply to [`process_rebind_response`]), or
    /// `Mechanism::Standard` when the transport should run its own
    /// SASL negotiation (report its success via [`on_authenticated`]).
    ///
    /// [`process_rebind_response`]: Self::process_rebind_response
    /// [`on_authenticated`]: Self::on_authenticated
    pub fn begin_authentication(&mut self) -> Result<Mechanism> {
        if self.attempt.is_some() {
            return Err(P1Error::Protocol(
                "authentication attempt already in flight".to_string(),
            ));
        }

        let record = self.store.load()?;
        match select_mechanism(&self.caps, record.as_ref(), self.force_fresh_login) {
            Mechanism::Standard => Ok(Mechanism::Standard),
            Mechanism::Rebind => {
                // select_mechanism returns Rebind only with a record.
                let Some(record) = record else {
                    return Err(P1Error::Protocol("rebind selected without record".to_string()));
                };
                self.start_rebind(&record.session_id, record.jid);
                Ok(Mechanism::Rebind)
            },
        }
    }

    /// Start an explicit rebind attempt, bypassing mechanism selection.
    pub fn rebind_session(&mut self, session_id: &str, jid: Jid) -> Result<()> {
        if self.attempt.is_some() {
            return Err(P1Error::Protocol(
                "authentication attempt already in flight".to_string(),
            ));
        }
        self.start_rebind(session_id, jid);
        Ok(())
    }

    fn start_rebind(&mut self, session_id: &str, jid: Jid) {
        tracing::info!("attempting session rebind for {}", jid);
        let attempt = RebindAttempt::new(session_id, jid);
        self.transport.submit(attempt.request());
        self.attempt = Some(attempt);
    }

    /// Process the terminal stanza of the in-flight rebind attempt.
    ///
    /// On success the session record is re-persisted with a fresh
    /// timestamp and any pending push configuration is flushed. On
    /// rejection the stored record is left untouched and the error
    /// surfaces to the caller; falling back to standard auth is the
    /// caller's decision on the next connection attempt.
    pub fn process_rebind_response(&mut self, response: &Element) -> Result<()> {
        let attempt = self
            .attempt
            .as_mut()
            .ok_or_else(|| P1Error::Protocol("no rebind attempt in flight".to_string()))?;

        match attempt.process_response(response) {
            Ok(success) => {
                self.attempt = None;
                self.store
                    .save(&SessionRecord::new(&success.session_id, success.jid))?;
                if let Some(stanza) = self.push.on_authenticated(true) {
                    self.transport.submit(stanza);
                }
                Ok(())
            },
            Err(e) => {
                // A non-terminal stanza leaves the attempt pending.
                if attempt.state() != AttemptState::Pending {
                    self.attempt = None;
                }
                Err(e)
            },
        }
    }

    /// Report a standard-mechanism authentication success.
    ///
    /// Persists a fresh session record from the transport-supplied
    /// session info (so subsequent connections may rebind) and flushes
    /// any pending push configuration.
    pub fn on_authenticated(&mut self, info: &SessionInfo) -> Result<()> {
        self.attempt = None;
        self.store
            .save(&SessionRecord::new(&info.session_id, info.jid.clone()))?;
        tracing::info!("authenticated as {}, session saved", info.jid);
        if let Some(stanza) = self.push.on_authenticated(false) {
            self.transport.submit(stanza);
        }
        Ok(())
    }

    /// Report connection teardown.
    ///
    /// Clears the per-connection capability flags and push
    /// authentication state; the desired push configuration survives
    /// for the next connection. Returns the failure for an in-flight
    /// rebind attempt, if one was aborted.
    pub fn on_disconnected(&mut self) -> Option<P1Error> {
        self.caps = StreamCapabilities::default();
        self.push.on_disconnected();
        self.attempt.take().map(|mut attempt| attempt.fail_disconnected())
    }

    // ---- push configuration -------------------------------------------

    /// Replace the desired push configuration.
    ///
    /// Sent right away when authenticated and changed; otherwise held
    /// and delivered once authentication succeeds. `None` clears the
    /// desired configuration without contacting the server.
    pub fn set_push_configuration(&mut self, config: Option<PushConfig>) {
        if let Some(stanza) = self.push.set_config(config) {
            self.transport.submit(stanza);
        }
    }

    /// Unregister the connected resource from push notifications.
    ///
    /// Clear the desired configuration first (set it to `None`) to
    /// avoid re-enabling push on a later delivery cycle.
    pub fn disable_push(&mut self) {
        if let Some(stanza) = self.push.disable() {
            self.transport.submit(stanza);
        }
    }

    // ---- standby ------------------------------------------------------

    /// Signal standby; wait on the receipt before suspending.
    pub fn go_on_standby(&self) -> Receipt {
        self.standby.go_on_standby()
    }

    /// Signal active again.
    pub fn go_off_standby(&self) -> Receipt {
        self.standby.go_off_standby()
    }
}
