//! End-to-end receipt behavior tests.
//!
//! Receipts exist to be a true write barrier: `Sent` means the stanza
//! left the process, not that it was queued. These tests pin that down
//! with a bounded duplex pipe whose reader controls when bytes drain.

use std::sync::Arc;
use std::time::Duration;

use p1ext::{
    Element, MemoryStore, P1Extension, ReceiptState, SendQueue, SessionStore, StanzaTransport,
    WaitOutcome, PUSH_NS,
};
use tokio::io::AsyncReadExt;

fn extension(queue: SendQueue) -> P1Extension {
    P1Extension::new(
        Arc::new(queue) as Arc<dyn StanzaTransport>,
        Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>,
    )
}

/// The standby receipt resolves `Sent` strictly before the active
/// stanza is confirmed (FIFO), and only once its bytes have actually
/// been accepted by the wire.
#[tokio::test]
async fn test_standby_receipt_is_a_write_barrier() {
    let standby_xml = Element::new("standby").ns(PUSH_NS).to_xml();
    let active_xml = Element::new("active").ns(PUSH_NS).to_xml();

    // Pipe sized to hold exactly the standby stanza: the active write
    // cannot complete until the reader drains.
    let (writer, mut reader) = tokio::io::duplex(standby_xml.len());
    let (queue, worker) = SendQueue::new();
    tokio::spawn(worker.run(writer));

    let ext = extension(queue);
    let standby = ext.go_on_standby();
    let active = ext.go_off_standby();

    // Standby fits the pipe and confirms; active is still blocked.
    assert_eq!(standby.wait(None).await, WaitOutcome::Sent);
    assert_eq!(active.state(), ReceiptState::Pending);

    // A bounded wait on the blocked receipt times out and leaves it
    // pending, still resolvable later.
    assert_eq!(
        active.wait(Some(Duration::from_millis(10))).await,
        WaitOutcome::TimedOut
    );
    assert_eq!(active.state(), ReceiptState::Pending);

    // Drain the standby bytes; the active write can now complete.
    let mut buf = vec![0u8; standby_xml.len()];
    reader.read_exact(&mut buf).await.unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), standby_xml);

    assert_eq!(active.wait(None).await, WaitOutcome::Sent);

    let mut buf = vec![0u8; active_xml.len()];
    reader.read_exact(&mut buf).await.unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), active_xml);
}

/// Tearing down the connection resolves every pending receipt to
/// `Failed`; nobody waits forever past a disconnect.
#[tokio::test]
async fn test_disconnect_fails_all_pending_receipts() {
    let (writer, reader) = tokio::io::duplex(4096);
    // Peer gone: the first write errors.
    drop(reader);

    let (queue, worker) = SendQueue::new();
    let ext = extension(queue);

    let receipts: Vec<_> = (0..4)
        .map(|i| {
            if i % 2 == 0 {
                ext.go_on_standby()
            } else {
                ext.go_off_standby()
            }
        })
        .collect();

    assert!(worker.run(writer).await.is_err());

    for receipt in receipts {
        assert_eq!(receipt.wait(None).await, WaitOutcome::Failed);
        // Terminal state is immutable; a second wait sees the same.
        assert_eq!(receipt.wait(Some(Duration::from_millis(1))).await, WaitOutcome::Failed);
    }
}

/// Waiters attached concurrently to one receipt all observe the same
/// terminal state.
#[tokio::test]
async fn test_concurrent_waiters_agree() {
    let (writer, _reader) = tokio::io::duplex(4096);
    let (queue, worker) = SendQueue::new();
    tokio::spawn(worker.run(writer));

    let ext = extension(queue);
    let receipt = ext.go_on_standby();

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let receipt = receipt.clone();
            tokio::spawn(async move { receipt.wait(None).await })
        })
        .collect();

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), WaitOutcome::Sent);
    }
}
