//! ProcessOne extension protocol.
//!
//! Implements the client side of the proprietary ejabberd extensions:
//! capability detection from stream features, rebind fast-reconnect
//! authentication, push configuration delivery, and standby/active
//! signaling.
//!
//! # Connection flow
//!
//! ```text
//! Client                               Server
//!    |                                    |
//!    |<---- <stream:features> ------------|  push/rebind capabilities
//!    |                                    |
//!    |----- <rebind xmlns='p1:rebind'> -->|  saved session + server
//!    |<---- <rebind/> or <failure/> ------|  support => fast reconnect
//!    |                                    |  (else standard SASL)
//!    |                                    |
//!    |----- <push xmlns='p1:push'> ------>|  deferred until
//!    |                                    |  authentication succeeds
//!    |                                    |
//!    |----- <standby xmlns='p1:push'/> -->|  lifecycle hints, each
//!    |----- <active xmlns='p1:push'/> --->|  bound to a Receipt
//! ```
//!
//! # Rebind eligibility
//!
//! | Saved session | Server rebind | Fresh forced | Mechanism |
//! |---------------|---------------|--------------|-----------|
//! | yes           | yes           | no           | Rebind    |
//! | yes           | yes           | yes          | Standard  |
//! | yes           | no            | -            | Standard  |
//! | no            | -             | -            | Standard  |
//!
//! A failed rebind is never retried with the standard mechanism
//! mid-attempt; that fallback is the caller's decision on the next
//! connection.

pub mod auth;
pub mod capabilities;
pub mod push;
pub mod standby;

pub use auth::{select_mechanism, AttemptState, Mechanism, RebindAttempt, RebindSuccess};
pub use capabilities::StreamCapabilities;
pub use push::{
    BodyPolicy, FromPolicy, Notification, PushConfig, PushManager, SendPolicy, StatusHint,
};
pub use standby::StandbyController;

/// Namespace of the push configuration and standby/active elements
pub const PUSH_NS: &str = "p1:push";

/// Namespace of the rebind authentication exchange
pub const REBIND_NS: &str = "p1:rebind";
