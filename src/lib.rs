//! # p1ext - ProcessOne ejabberd Client Extensions
//!
//! Client-side implementation of the proprietary ProcessOne module for
//! ejabberd: session rebind (fast reconnect), push notification
//! configuration, and standby/active lifecycle signaling, layered on
//! top of a standards-compliant XMPP stream.
//!
//! ## Features
//!
//! - **Session rebind**: resume a saved session with one stanza
//!   exchange instead of full SASL negotiation
//! - **Push configuration**: typed `<push xmlns='p1:push'>` document
//!   with delivery deferred until authentication succeeds
//! - **Standby signaling**: `<standby/>`/`<active/>` hints bound to
//!   write-barrier Receipts
//! - **Session persistence**: pluggable store, JSON file store
//!   persisted across process restarts
//!
//! ## Connection lifecycle
//!
//! ```text
//! Transport                 P1Extension                   Server
//!    |                          |                            |
//!    |-- stream features ------>| StreamCapabilities         |
//!    |                          |                            |
//!    |-- begin_authentication ->|                            |
//!    |                          |--- <rebind> (if eligible) >|
//!    |                          |<-- <rebind>/<failure> -----|
//!    |                          |   (else standard SASL,     |
//!    |                          |    then on_authenticated)  |
//!    |                          |                            |
//!    |                          |--- <push> (deferred) ----->|
//!    |                          |                            |
//!    |-- app backgrounded ----->|--- <standby/> + Receipt -->|
//!    |-- app foregrounded ----->|--- <active/>  + Receipt -->|
//! ```
//!
//! ## State machines
//!
//! Rebind attempt:
//!
//! | State       | Meaning                          | Transitions            |
//! |-------------|----------------------------------|------------------------|
//! | `Pending`   | Request out, awaiting terminal   | → Succeeded, Failed    |
//! | `Succeeded` | Session resumed, already bound   | (terminal)             |
//! | `Failed`    | Rejected or stream dropped       | (terminal)             |
//!
//! Receipt:
//!
//! | State     | Meaning                               | Transitions      |
//! |-----------|---------------------------------------|------------------|
//! | `Pending` | Queued, not yet written               | → Sent, Failed   |
//! | `Sent`    | Bytes left the process                | (terminal)       |
//! | `Failed`  | Connection ended before confirmation  | (terminal)       |
//!
//! ## Stanzas
//!
//! | Stanza                          | Direction | Purpose                    |
//! |---------------------------------|-----------|----------------------------|
//! | `<rebind xmlns='p1:rebind'>`    | C→S       | Resume saved session       |
//! | `<rebind/>` / `<failure/>`      | S→C       | Rebind terminal response   |
//! | `<push xmlns='p1:push'>`        | C→S       | Push configuration         |
//! | `<disable xmlns='p1:push'/>`    | C→S       | Remove push registration   |
//! | `<standby xmlns='p1:push'/>`    | C→S       | Client backgrounded        |
//! | `<active xmlns='p1:push'/>`     | C→S       | Client foregrounded        |
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use p1ext::{P1Extension, PushConfig, SendQueue, FileStore, Mechanism};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let (queue, worker) = SendQueue::new();
//! tokio::spawn(worker.run(socket_writer));
//!
//! let store = Arc::new(FileStore::new("/var/lib/app/session.json"));
//! let mut ext = P1Extension::new(Arc::new(queue), store);
//!
//! // Configuration may be set at any time; it is delivered once
//! // authentication succeeds.
//! ext.set_push_configuration(Some(
//!     PushConfig::new()
//!         .keepalive_max(Duration::from_secs(30))
//!         .notification("applepush", device_token)
//!         .app_id("application1"),
//! ));
//!
//! ext.handle_stream_features(&features);
//! match ext.begin_authentication()? {
//!     Mechanism::Rebind => { /* feed reply to ext.process_rebind_response */ }
//!     Mechanism::Standard => { /* run SASL, then ext.on_authenticated(&info) */ }
//! }
//!
//! // Before suspending: block until the standby stanza is truly out.
//! let receipt = ext.go_on_standby();
//! receipt.wait(None).await;
//! ```
//!
//! ## Modules
//!
//! - [`extension`]: the composition root and public operation surface
//! - [`protocol`]: capabilities, rebind, push, standby state machines
//! - [`transport`]: outbound stanza queue with transmission receipts
//! - [`receipt`]: single-shot completion signal per outbound stanza
//! - [`store`]: session record persistence
//! - [`stanza`]: minimal XML element model
//! - [`jid`]: structured `node@domain/resource` identifier
//! - [`config`]: configuration management
//! - [`error`]: error types and result aliases
//!
//! ## Limitations
//!
//! Concurrent connections for the same account sharing one session
//! store are not supported; behavior is undefined. Session staleness
//! is not judged: the presence of a saved record is the sole rebind
//! eligibility signal.

pub mod config;
pub mod error;
pub mod extension;
pub mod jid;
pub mod protocol;
pub mod receipt;
pub mod stanza;
pub mod store;
pub mod transport;

// Re-exports for convenience
pub use config::ExtensionConfig;
pub use error::{P1Error, Result};
pub use extension::{P1Extension, SessionInfo};
pub use jid::Jid;
pub use protocol::{
    BodyPolicy, FromPolicy, Mechanism, Notification, PushConfig, PushManager, RebindAttempt,
    SendPolicy, StandbyController, StatusHint, StreamCapabilities, PUSH_NS, REBIND_NS,
};
pub use receipt::{Receipt, ReceiptState, WaitOutcome};
pub use stanza::Element;
pub use store::{FileStore, MemoryStore, SessionRecord, SessionStore};
pub use transport::{SendQueue, SendWorker, StanzaTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
