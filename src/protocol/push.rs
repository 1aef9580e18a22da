//! Push configuration document and delivery timing.
//!
//! [`PushConfig`] is the typed form of the `<push xmlns='p1:push'>`
//! document; every recognized field maps to exactly one child element
//! and absent fields are omitted, never emitted empty. Parsing is
//! strict: an unrecognized child, attribute, or attribute value fails
//! with `InvalidConfiguration` before anything is serialized.
//!
//! [`PushManager`] owns the delivery timing. Configuration set before
//! authentication is held and flushed exactly once when authentication
//! succeeds; while authenticated, a change is sent immediately but an
//! unchanged configuration is never sent twice. The manager is a pure
//! state machine returning the element to transmit; the facade submits
//! it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{P1Error, Result};
use crate::protocol::PUSH_NS;
use crate::stanza::Element;

/// Which message bodies the server forwards into push notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPolicy {
    /// Forward every body
    All,
    /// Forward only the first body per session
    First,
    /// Forward the first body per user
    FirstPerUser,
    /// Forward no bodies
    None,
}

impl SendPolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::First => "first",
            Self::FirstPerUser => "first-per-user",
            Self::None => "none",
        }
    }
}

impl FromStr for SendPolicy {
    type Err = P1Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "first" => Ok(Self::First),
            "first-per-user" => Ok(Self::FirstPerUser),
            "none" => Ok(Self::None),
            other => Err(P1Error::InvalidConfiguration(format!(
                "unknown body send policy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the sender is identified in a push notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromPolicy {
    /// Full JID
    Jid,
    /// Username only
    Username,
    /// Roster name
    Name,
    /// No sender information
    None,
}

impl FromPolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Jid => "jid",
            Self::Username => "username",
            Self::Name => "name",
            Self::None => "none",
        }
    }
}

impl FromStr for FromPolicy {
    type Err = P1Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jid" => Ok(Self::Jid),
            "username" => Ok(Self::Username),
            "name" => Ok(Self::Name),
            "none" => Ok(Self::None),
            other => Err(P1Error::InvalidConfiguration(format!(
                "unknown body from policy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for FromPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `<body send='..' groupchat='..' from='..'/>` policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPolicy {
    /// Which bodies are forwarded
    pub send: SendPolicy,
    /// Include groupchat bodies
    pub groupchat: Option<bool>,
    /// Sender identification
    pub from: Option<FromPolicy>,
}

/// `<status type='..'>message</status>` shown while in push mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusHint {
    /// Presence show value (e.g. `xa`)
    pub kind: Option<String>,
    /// Status message text
    pub message: Option<String>,
}

/// `<notification><type/><id/></notification>` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification backend (e.g. `applepush`)
    pub kind: String,
    /// Device token / registration id
    pub id: String,
}

/// Typed push configuration document.
///
/// An immutable snapshot once handed to the manager; setting a new
/// value replaces a pending one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushConfig {
    /// `<keepalive max='SECS'/>`
    pub keepalive_max: Option<Duration>,
    /// `<session duration='SECS'/>`
    pub session_duration: Option<Duration>,
    /// Body forwarding policy
    pub body: Option<BodyPolicy>,
    /// Presence shown while in push mode
    pub status: Option<StatusHint>,
    /// `<offline>bool</offline>`
    pub offline: Option<bool>,
    /// Notification backend and device id
    pub notification: Option<Notification>,
    /// `<appid>text</appid>`
    pub app_id: Option<String>,
}

impl PushConfig {
    /// Empty configuration; chain the builder methods below.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keepalive maximum.
    pub fn keepalive_max(mut self, max: Duration) -> Self {
        self.keepalive_max = Some(max);
        self
    }

    /// Set how long the server keeps the session alive in push mode.
    pub fn session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = Some(duration);
        self
    }

    /// Set the body forwarding policy.
    pub fn body(mut self, policy: BodyPolicy) -> Self {
        self.body = Some(policy);
        self
    }

    /// Set the presence status shown while in push mode.
    pub fn status(mut self, kind: Option<&str>, message: Option<&str>) -> Self {
        self.status = Some(StatusHint {
            kind: kind.map(str::to_string),
            message: message.map(str::to_string),
        });
        self
    }

    /// Set whether offline messages trigger notifications.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = Some(offline);
        self
    }

    /// Set the notification backend and device id.
    pub fn notification(mut self, kind: &str, id: &str) -> Self {
        self.notification = Some(Notification {
            kind: kind.to_string(),
            id: id.to_string(),
        });
        self
    }

    /// Set the application id.
    pub fn app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    /// Build the `<push xmlns='p1:push'>` stanza.
    ///
    /// Child order is fixed: keepalive, session, body, status,
    /// offline, notification, appid.
    pub fn to_element(&self) -> Element {
        let mut push = Element::new("push").ns(PUSH_NS);

        if let Some(max) = self.keepalive_max {
            push = push.child(Element::new("keepalive").attr("max", max.as_secs()));
        }
        if let Some(duration) = self.session_duration {
            push = push.child(Element::new("session").attr("duration", duration.as_secs()));
        }
        if let Some(ref body) = self.body {
            let mut el = Element::new("body").attr("send", body.send);
            if let Some(groupchat) = body.groupchat {
                el = el.attr("groupchat", groupchat);
            }
            if let Some(from) = body.from {
                el = el.attr("from", from);
            }
            push = push.child(el);
        }
        if let Some(ref status) = self.status {
            let mut el = Element::new("status");
            if let Some(ref kind) = status.kind {
                el = el.attr("type", kind);
            }
            if let Some(ref message) = status.message {
                el = el.text(message);
            }
            push = push.child(el);
        }
        if let Some(offline) = self.offline {
            push = push.child(Element::new("offline").text(if offline { "true" } else { "false" }));
        }
        if let Some(ref notification) = self.notification {
            push = push.child(
                Element::new("notification")
                    .child(Element::new("type").text(&notification.kind))
                    .child(Element::new("id").text(&notification.id)),
            );
        }
        if let Some(ref app_id) = self.app_id {
            push = push.child(Element::new("appid").text(app_id));
        }

        push
    }

    /// Parse a `<push xmlns='p1:push'>` stanza back into a config.
    ///
    /// Strict: unrecognized children, attributes, or attribute values
    /// fail fast.
    pub fn from_element(element: &Element) -> Result<Self> {
        if !element.is("push", PUSH_NS) {
            return Err(P1Error::InvalidConfiguration(format!(
                "expected <push xmlns='{PUSH_NS}'>, got <{}>",
                element.name
            )));
        }

        let mut config = Self::default();
        for child in &element.children {
            match child.name.as_str() {
                "keepalive" => {
                    check_attrs(child, &["max"])?;
                    config.keepalive_max = Some(parse_secs_attr(child, "max")?);
                },
                "session" => {
                    check_attrs(child, &["duration"])?;
                    config.session_duration = Some(parse_secs_attr(child, "duration")?);
                },
                "body" => {
                    check_attrs(child, &["send", "groupchat", "from"])?;
                    let send = child
                        .get_attr("send")
                        .ok_or_else(|| {
                            P1Error::InvalidConfiguration("<body> missing send attribute".into())
                        })?
                        .parse()?;
                    let groupchat = child.get_attr("groupchat").map(parse_bool).transpose()?;
                    let from = child.get_attr("from").map(FromPolicy::from_str).transpose()?;
                    config.body = Some(BodyPolicy {
                        send,
                        groupchat,
                        from,
                    });
                },
                "status" => {
                    check_attrs(child, &["type"])?;
                    config.status = Some(StatusHint {
                        kind: child.get_attr("type").map(str::to_string),
                        message: child.text.clone(),
                    });
                },
                "offline" => {
                    check_attrs(child, &[])?;
                    config.offline = Some(parse_bool(child.text_content())?);
                },
                "notification" => {
                    check_attrs(child, &[])?;
                    let kind = child
                        .find_child("type")
                        .ok_or_else(|| {
                            P1Error::InvalidConfiguration("<notification> missing <type>".into())
                        })?
                        .text_content()
                        .to_string();
                    let id = child
                        .find_child("id")
                        .ok_or_else(|| {
                            P1Error::InvalidConfiguration("<notification> missing <id>".into())
                        })?
                        .text_content()
                        .to_string();
                    config.notification = Some(Notification { kind, id });
                },
                "appid" => {
                    check_attrs(child, &[])?;
                    config.app_id = Some(child.text_content().to_string());
                },
                other => {
                    return Err(P1Error::InvalidConfiguration(format!(
                        "unrecognized push configuration field '{other}'"
                    )));
                },
            }
        }

        Ok(config)
    }
}

fn check_attrs(element: &Element, allowed: &[&str]) -> Result<()> {
    for (name, _) in &element.attrs {
        if !allowed.contains(&name.as_str()) {
            return Err(P1Error::InvalidConfiguration(format!(
                "unrecognized attribute '{name}' on <{}>",
                element.name
            )));
        }
    }
    Ok(())
}

fn parse_secs_attr(element: &Element, attr: &str) -> Result<Duration> {
    let value = element.get_attr(attr).ok_or_else(|| {
        P1Error::InvalidConfiguration(format!("<{}> missing {attr} attribute", element.name))
    })?;
    let secs: u64 = value.parse().map_err(|_| {
        P1Error::InvalidConfiguration(format!("<{}> {attr}='{value}' is not seconds", element.name))
    })?;
    Ok(Duration::from_secs(secs))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(P1Error::InvalidConfiguration(format!(
            "expected boolean, got '{other}'"
        ))),
    }
}

/// Delivery timing for the push configuration.
///
/// Tracks the desired document, the last one actually sent, and the
/// authenticated flag. Operations return the stanza to transmit, if
/// any; returning `None` while unauthenticated is the normal deferred
/// state, not a failure.
#[derive(Debug, Default)]
pub struct PushManager {
    desired: Option<PushConfig>,
    last_sent: Option<PushConfig>,
    disable_pending: bool,
    authenticated: bool,
}

impl PushManager {
    /// Create a manager with no configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration currently wanted on the server.
    pub fn desired(&self) -> Option<&PushConfig> {
        self.desired.as_ref()
    }

    /// Whether the stream is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Replace the desired configuration.
    ///
    /// Sent immediately when authenticated and different from the last
    /// transmitted document; otherwise held until authentication
    /// succeeds.
    pub fn set_config(&mut self, config: Option<PushConfig>) -> Option<Element> {
        self.desired = config;
        if self.authenticated {
            self.flush_config()
        } else {
            tracing::debug!("push configuration deferred until authentication");
            None
        }
    }

    /// Request removal of this resource's push registration.
    ///
    /// Emitted immediately when authenticated, queued otherwise. The
    /// regular configuration is suppressed for the same delivery
    /// cycle; clear the desired configuration first to avoid
    /// re-enabling on a later cycle.
    pub fn disable(&mut self) -> Option<Element> {
        self.last_sent = None;
        if self.authenticated {
            Some(disable_element())
        } else {
            self.disable_pending = true;
            None
        }
    }

    /// Authentication succeeded; flush whatever is pending.
    ///
    /// `session_resumed` distinguishes a rebind (the server kept the
    /// old session's push state, an unchanged document need not be
    /// resent) from a fresh login (the new session has no push state,
    /// so the desired document goes out again).
    pub fn on_authenticated(&mut self, session_resumed: bool) -> Option<Element> {
        self.authenticated = true;
        if !session_resumed {
            self.last_sent = None;
        }
        if std::mem::take(&mut self.disable_pending) {
            // A queued disable wins the cycle over the regular config.
            Some(disable_element())
        } else {
            self.flush_config()
        }
    }

    /// Connection dropped; intent survives for the next connection.
    pub fn on_disconnected(&mut self) {
        self.authenticated = false;
    }

    fn flush_config(&mut self) -> Option<Element> {
        match self.desired {
            Some(ref config) if self.last_sent.as_ref() != Some(config) => {
                self.last_sent = Some(config.clone());
                Some(config.to_element())
            },
            _ => None,
        }
    }
}

fn disable_element() -> Element {
    Element::new("disable").ns(PUSH_NS)
}
