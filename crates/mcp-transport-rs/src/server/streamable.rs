//! Channel transport backing one streamable-HTTP session.
//!
//! The HTTP layer holds a [`StreamableHttpHandle`] and pushes every POSTed
//! message into it; the session's `Server` loop owns the matching
//! [`StreamableHttpTransport`]. Requests carry a reply slot so the response
//! can be returned in the body of the POST that delivered them. Anything the
//! server writes without a waiting POST goes to the session's GET stream, if
//! one is open.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mcp_core_rs::protocol::message::JsonRpcMessage;
use mcp_error_rs::{Error, Result};
use tokio::sync::{mpsc, oneshot};

use crate::server::traits::ServerTransport;

type PushSlot = Arc<Mutex<Option<mpsc::UnboundedSender<JsonRpcMessage>>>>;

/// A message delivered by the HTTP layer, with an optional reply slot.
#[derive(Debug)]
pub struct Inbound {
    pub message: JsonRpcMessage,
    pub reply: Option<oneshot::Sender<JsonRpcMessage>>,
}

/// Creates a connected handle/transport pair for a new session.
pub fn channel() -> (StreamableHttpHandle, StreamableHttpTransport) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let push: PushSlot = Arc::default();
    (
        StreamableHttpHandle {
            inbound: inbound_tx,
            push: push.clone(),
        },
        StreamableHttpTransport {
            inbound: inbound_rx,
            pending_reply: None,
            push,
        },
    )
}

/// HTTP-side end of a session transport. Cheap to clone.
#[derive(Clone, Debug)]
pub struct StreamableHttpHandle {
    inbound: mpsc::UnboundedSender<Inbound>,
    push: PushSlot,
}

impl StreamableHttpHandle {
    /// Forwards a request and waits for the server's reply to it.
    pub async fn request(&self, message: JsonRpcMessage) -> Result<JsonRpcMessage> {
        let (tx, rx) = oneshot::channel();
        self.inbound
            .send(Inbound {
                message,
                reply: Some(tx),
            })
            .map_err(|_| Error::NotConnected)?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Forwards a notification or client response; nothing is awaited.
    pub fn notify(&self, message: JsonRpcMessage) -> Result<()> {
        self.inbound
            .send(Inbound {
                message,
                reply: None,
            })
            .map_err(|_| Error::NotConnected)
    }

    /// Opens the server-push stream for this session, replacing any previous one.
    pub fn open_stream(&self) -> mpsc::UnboundedReceiver<JsonRpcMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut slot) = self.push.lock() {
            *slot = Some(tx);
        }
        rx
    }

    pub fn is_closed(&self) -> bool {
        self.inbound.is_closed()
    }
}

/// Server-side end of a session transport.
#[derive(Debug)]
pub struct StreamableHttpTransport {
    inbound: mpsc::UnboundedReceiver<Inbound>,
    pending_reply: Option<oneshot::Sender<JsonRpcMessage>>,
    push: PushSlot,
}

impl StreamableHttpTransport {
    fn push(&self, msg: JsonRpcMessage) -> Result<()> {
        let mut slot = self
            .push
            .lock()
            .map_err(|_| Error::System("push stream lock poisoned".into()))?;
        let Some(tx) = slot.as_ref() else {
            tracing::debug!("no open stream, dropping server message");
            return Ok(());
        };
        if tx.send(msg).is_err() {
            tracing::debug!("push stream closed by client");
            *slot = None;
        }
        Ok(())
    }
}

#[async_trait]
impl ServerTransport for StreamableHttpTransport {
    async fn read_message(&mut self) -> Option<Result<JsonRpcMessage>> {
        let Inbound { message, reply } = self.inbound.recv().await?;
        // The server loop answers requests one at a time, so the slot of the
        // message just read is the one its response belongs to.
        self.pending_reply = reply;
        Some(Ok(message))
    }

    async fn write_message(&mut self, msg: JsonRpcMessage) -> Result<()> {
        match self.pending_reply.take() {
            Some(reply) => {
                if reply.send(msg).is_err() {
                    tracing::warn!("client went away before the response was delivered");
                }
                Ok(())
            }
            None => self.push(msg),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.inbound.close();
        if let Ok(mut slot) = self.push.lock() {
            slot.take();
        }
        Ok(())
    }
}
