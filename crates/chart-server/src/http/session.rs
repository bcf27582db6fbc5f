//! Session Transport Registry.
//!
//! One entry per streamable-HTTP client, keyed by the `mcp-session-id` the
//! client received on initialize. Each entry owns a task running the MCP
//! server loop over the session's channel transport.

use std::{collections::HashMap, sync::Arc};

use mcp_chart_rs::{ChartRenderer, ChartRouter};
use mcp_server_rs::{
    router::service::RouterService,
    server::Server,
    transport::{StreamableHttpHandle, StreamableHttpTransport, streamable},
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub type SessionId = Arc<str>;

struct SessionEntry {
    handle: StreamableHttpHandle,
    cancel: CancellationToken,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    renderer: Arc<ChartRenderer>,
    /// Cancelled by `close_all`; parent of every session token.
    closing: CancellationToken,
}

impl SessionRegistry {
    pub fn new(renderer: Arc<ChartRenderer>) -> Self {
        Self {
            sessions: Arc::default(),
            renderer,
            closing: CancellationToken::new(),
        }
    }

    /// Opens a new session and starts its server loop.
    ///
    /// Returns `None` once `close_all` has run.
    pub async fn create(&self) -> Option<(SessionId, StreamableHttpHandle)> {
        let (handle, transport) = streamable::channel();
        let cancel = self.closing.child_token();

        let session = {
            let mut sessions = self.sessions.write().await;
            // Checked under the lock so `close_all` cannot miss an insert.
            if self.closing.is_cancelled() {
                tracing::debug!("Refusing new session during shutdown");
                return None;
            }
            let session = loop {
                let candidate: SessionId = Uuid::new_v4().to_string().into();
                if !sessions.contains_key(&candidate) {
                    break candidate;
                }
            };
            sessions.insert(
                session.clone(),
                SessionEntry {
                    handle: handle.clone(),
                    cancel: cancel.clone(),
                },
            );
            session
        };

        tracing::info!(%session, "Session created");
        self.spawn(session.clone(), transport, cancel);
        Some((session, handle))
    }

    fn spawn(
        &self,
        session: SessionId,
        transport: StreamableHttpTransport,
        cancel: CancellationToken,
    ) {
        let router = ChartRouter::new(self.renderer.clone());
        let sessions = self.sessions.clone();

        tokio::spawn(async move {
            let server = Server::new(RouterService::new(router));

            let result = tokio::select! {
                res = server.run(transport) => {
                    tracing::info!(%session, "Session server loop completed");
                    res
                },
                _ = cancel.cancelled() => {
                    tracing::info!(%session, "Session cancelled");
                    Ok(())
                }
            };

            // Already gone if the session was closed explicitly.
            sessions.write().await.remove(&session);

            if let Err(e) = result {
                tracing::error!(%session, error = %e, "Session server error");
            }
        });
    }

    pub async fn get(&self, session: &str) -> Option<StreamableHttpHandle> {
        self.sessions
            .read()
            .await
            .get(session)
            .map(|entry| entry.handle.clone())
    }

    /// Removes the session and stops its task. Returns false for unknown ids.
    pub async fn close(&self, session: &str) -> bool {
        let entry = self.sessions.write().await.remove(session);
        match entry {
            Some(entry) => {
                entry.cancel.cancel();
                tracing::info!(%session, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Closes every session and refuses new ones from now on. Returns how
    /// many sessions were open; calling it again is harmless.
    pub async fn close_all(&self) -> usize {
        self.closing.cancel();
        let drained: Vec<_> = self.sessions.write().await.drain().collect();
        for (_, entry) in &drained {
            entry.cancel.cancel();
        }
        drained.len()
    }

    pub fn is_closing(&self) -> bool {
        self.closing.is_cancelled()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
