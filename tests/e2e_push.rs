//! End-to-end push configuration delivery tests.
//!
//! Verify the timing invariant on a real wire: the configuration
//! document never precedes authentication, is sent exactly once per
//! change, and the disable variant suppresses it.

use std::sync::Arc;
use std::time::Duration;

use p1ext::{
    BodyPolicy, Element, FromPolicy, MemoryStore, P1Extension, PushConfig, SendPolicy, SendQueue,
    SessionInfo, SessionStore, StanzaTransport,
};
use tokio::io::AsyncReadExt;

fn session_info() -> SessionInfo {
    SessionInfo {
        session_id: "s1".to_string(),
        jid: "user@example.com/mobile".parse().unwrap(),
    }
}

async fn drain(queue: SendQueue, ext: P1Extension, task: tokio::task::JoinHandle<p1ext::Result<()>>, reader: &mut (impl AsyncReadExt + Unpin)) -> String {
    drop(ext);
    drop(queue);
    task.await.unwrap().unwrap();
    let mut wire = String::new();
    reader.read_to_string(&mut wire).await.unwrap();
    wire
}

/// Configuration set before authentication reaches the wire exactly
/// once, immediately after authentication succeeds, and never before.
#[tokio::test]
async fn test_config_deferred_until_authenticated() {
    let (writer, mut reader) = tokio::io::duplex(4096);
    let (queue, worker) = SendQueue::new();
    let task = tokio::spawn(worker.run(writer));

    let mut ext = P1Extension::new(
        Arc::new(queue.clone()) as Arc<dyn StanzaTransport>,
        Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>,
    );

    ext.set_push_configuration(Some(PushConfig::new().offline(true)));
    ext.on_authenticated(&session_info()).unwrap();

    let wire = drain(queue, ext, task, &mut reader).await;
    assert_eq!(wire, "<push xmlns='p1:push'><offline>true</offline></push>");
}

/// Changing the configuration while authenticated sends exactly one
/// more stanza; an unchanged document is never resent.
#[tokio::test]
async fn test_config_change_sends_once() {
    let (writer, mut reader) = tokio::io::duplex(4096);
    let (queue, worker) = SendQueue::new();
    let task = tokio::spawn(worker.run(writer));

    let mut ext = P1Extension::new(
        Arc::new(queue.clone()) as Arc<dyn StanzaTransport>,
        Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>,
    );
    ext.on_authenticated(&session_info()).unwrap();

    let config = PushConfig::new()
        .keepalive_max(Duration::from_secs(30))
        .body(BodyPolicy {
            send: SendPolicy::All,
            groupchat: Some(true),
            from: Some(FromPolicy::Jid),
        });
    ext.set_push_configuration(Some(config.clone()));
    // Unchanged: no duplicate send.
    ext.set_push_configuration(Some(config.clone()));
    // Changed: exactly one more.
    ext.set_push_configuration(Some(config.app_id("application1")));

    let wire = drain(queue, ext, task, &mut reader).await;
    assert_eq!(
        wire,
        "<push xmlns='p1:push'>\
         <keepalive max='30'/>\
         <body send='all' groupchat='true' from='jid'/>\
         </push>\
         <push xmlns='p1:push'>\
         <keepalive max='30'/>\
         <body send='all' groupchat='true' from='jid'/>\
         <appid>application1</appid>\
         </push>"
    );
}

/// `disable_push` with the desired configuration cleared first: only
/// the disable stanza goes out, nothing re-enables push.
#[tokio::test]
async fn test_disable_flow() {
    let (writer, mut reader) = tokio::io::duplex(4096);
    let (queue, worker) = SendQueue::new();
    let task = tokio::spawn(worker.run(writer));

    let mut ext = P1Extension::new(
        Arc::new(queue.clone()) as Arc<dyn StanzaTransport>,
        Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>,
    );

    // Documented usage: clear the configuration, then disable.
    ext.set_push_configuration(Some(PushConfig::new().offline(false)));
    ext.set_push_configuration(None);
    ext.disable_push();
    ext.on_authenticated(&session_info()).unwrap();

    let wire = drain(queue, ext, task, &mut reader).await;
    assert_eq!(wire, "<disable xmlns='p1:push'/>");
}

/// Intent survives a reconnect: after a fresh (non-rebind) login the
/// desired configuration is delivered again.
#[tokio::test]
async fn test_config_resent_after_fresh_login() {
    let (writer, mut reader) = tokio::io::duplex(4096);
    let (queue, worker) = SendQueue::new();
    let task = tokio::spawn(worker.run(writer));

    let mut ext = P1Extension::new(
        Arc::new(queue.clone()) as Arc<dyn StanzaTransport>,
        Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>,
    );

    ext.set_push_configuration(Some(PushConfig::new().offline(true)));
    ext.on_authenticated(&session_info()).unwrap();
    ext.on_disconnected();
    ext.on_authenticated(&session_info()).unwrap();

    let wire = drain(queue, ext, task, &mut reader).await;
    let expected = "<push xmlns='p1:push'><offline>true</offline></push>";
    assert_eq!(wire, format!("{expected}{expected}"));
}

/// Strict parsing: a configuration stanza with an unknown field is
/// rejected whole.
#[test]
fn test_unknown_field_rejected_whole() {
    let element = Element::new("push")
        .ns("p1:push")
        .child(Element::new("offline").text("true"))
        .child(Element::new("vibrate").text("always"));
    assert!(PushConfig::from_element(&element).is_err());
}
