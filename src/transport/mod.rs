//! Outbound transport seam.
//!
//! The extension core never talks to a socket directly. It hands
//! stanzas to a [`StanzaTransport`] and gets back a [`Receipt`] that
//! resolves once the stanza has actually left the process. The crate
//! ships [`SendQueue`]: a FIFO queue whose worker serializes each
//! stanza onto any `AsyncWrite` and resolves the receipt only after
//! `write_all` and `flush` both succeed.
//!
//! Hosts with their own write path can implement [`StanzaTransport`]
//! instead; the core only depends on the trait.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{P1Error, Result};
use crate::receipt::{receipt_pair, Receipt, ReceiptHandle};
use crate::stanza::Element;

/// Handle for submitting stanzas to the wire.
///
/// Submission is non-blocking: it enqueues the stanza and returns. The
/// receipt resolves `Sent` after the bytes are written, `Failed` if
/// the connection goes away first. Stanzas are transmitted in
/// submission order.
pub trait StanzaTransport: Send + Sync {
    /// Enqueue a stanza for transmission.
    fn submit(&self, stanza: Element) -> Receipt;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}

struct Outbound {
    stanza: Element,
    handle: ReceiptHandle,
}

/// FIFO outbound stanza queue.
///
/// Cloneable sender half; pair it with the [`SendWorker`] returned by
/// [`SendQueue::new`], which drives the writes on its own task.
#[derive(Clone)]
pub struct SendQueue {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl SendQueue {
    /// Create a queue and its worker.
    pub fn new() -> (Self, SendWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, SendWorker { rx })
    }
}

impl StanzaTransport for SendQueue {
    fn submit(&self, stanza: Element) -> Receipt {
        let (handle, receipt) = receipt_pair();
        if let Err(rejected) = self.tx.send(Outbound { stanza, handle }) {
            // Worker already gone; release the waiter immediately.
            tracing::debug!("submit after transport teardown: {}", rejected.0.stanza.name);
            rejected.0.handle.resolve_failed();
        }
        receipt
    }

    fn name(&self) -> &'static str {
        "send-queue"
    }
}

/// Consumer half of a [`SendQueue`].
pub struct SendWorker {
    rx: mpsc::UnboundedReceiver<Outbound>,
}

impl SendWorker {
    /// Write queued stanzas to `writer` until the queue closes or a
    /// write fails.
    ///
    /// Each receipt resolves `Sent` only after its stanza is written
    /// and flushed. On a write error the failing stanza and everything
    /// still queued resolve `Failed`, and the error is returned.
    pub async fn run<W: AsyncWrite + Unpin>(mut self, mut writer: W) -> Result<()> {
        while let Some(outbound) = self.rx.recv().await {
            let bytes = outbound.stanza.to_xml();
            let written = async {
                writer.write_all(bytes.as_bytes()).await?;
                writer.flush().await
            }
            .await;

            match written {
                Ok(()) => {
                    tracing::debug!("transmitted <{}> ({} bytes)", outbound.stanza.name, bytes.len());
                    outbound.handle.resolve_sent();
                },
                Err(e) => {
                    tracing::warn!("write failed on <{}>: {}", outbound.stanza.name, e);
                    outbound.handle.resolve_failed();
                    self.fail_pending();
                    return Err(P1Error::TransportDisconnected(e.to_string()));
                },
            }
        }
        Ok(())
    }

    // Drain the queue, failing every receipt still pending.
    fn fail_pending(&mut self) {
        self.rx.close();
        while let Ok(outbound) = self.rx.try_recv() {
            outbound.handle.resolve_failed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::WaitOutcome;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::AsyncReadExt;

    // Writer that fails every write, for teardown tests.
    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "connection reset",
            )))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_fifo_transmission_and_receipts() {
        let (writer, mut reader) = tokio::io::duplex(4096);
        let (queue, worker) = SendQueue::new();
        let task = tokio::spawn(worker.run(writer));

        let first = queue.submit(Element::new("standby").ns("p1:push"));
        let second = queue.submit(Element::new("active").ns("p1:push"));

        assert_eq!(first.wait(None).await, WaitOutcome::Sent);
        assert_eq!(second.wait(None).await, WaitOutcome::Sent);

        drop(queue);
        task.await.unwrap().unwrap();

        let mut wire = String::new();
        reader.read_to_string(&mut wire).await.unwrap();
        assert_eq!(wire, "<standby xmlns='p1:push'/><active xmlns='p1:push'/>");
    }

    #[tokio::test]
    async fn test_write_failure_fails_all_pending() {
        let (queue, worker) = SendQueue::new();

        let receipts: Vec<_> = (0..3)
            .map(|_| queue.submit(Element::new("standby").ns("p1:push")))
            .collect();

        let err = worker.run(BrokenWriter).await.unwrap_err();
        assert!(matches!(err, P1Error::TransportDisconnected(_)));

        for receipt in receipts {
            assert_eq!(receipt.wait(None).await, WaitOutcome::Failed);
        }
    }

    #[tokio::test]
    async fn test_submit_after_worker_gone_fails_immediately() {
        let (queue, worker) = SendQueue::new();
        drop(worker);

        let receipt = queue.submit(Element::new("active").ns("p1:push"));
        assert_eq!(receipt.wait(None).await, WaitOutcome::Failed);
    }
}
