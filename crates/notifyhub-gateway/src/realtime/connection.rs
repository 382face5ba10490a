//! One live client session: the hub-side handle plus the read/write pumps.
//!
//! The hub owns the `Connection` (and with it the only sender of the outbound
//! queue). Dropping it closes the queue, which ends the write pump. The pumps
//! own the transport halves.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::Instrument;

use crate::realtime::hub::Hub;
use crate::realtime::types::{ConnId, PreparedMsg};

/// Client id used when the handshake does not carry one.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Immutable identity of a connection.
#[derive(Debug, Clone)]
pub struct ConnMeta {
    pub id: ConnId,
    pub client_id: Arc<str>,
    pub user_id: Option<Arc<str>>,
}

/// Why an enqueue did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backlog {
    /// Outbound queue is at capacity.
    Full,
    /// Write pump is gone.
    Closed,
}

impl Backlog {
    pub fn as_str(self) -> &'static str {
        match self {
            Backlog::Full => "backlog_full",
            Backlog::Closed => "queue_closed",
        }
    }
}

/// Hub-side handle of a connection. Deliberately not `Clone`: the hub must
/// hold the only sender so that unregistering closes the queue.
#[derive(Debug)]
pub struct Connection {
    meta: ConnMeta,
    tx: mpsc::Sender<PreparedMsg>,
}

impl Connection {
    /// Create a connection handle and the receiving end of its outbound queue.
    pub fn new(meta: ConnMeta, capacity: usize) -> (Self, mpsc::Receiver<PreparedMsg>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { meta, tx }, rx)
    }

    pub fn meta(&self) -> &ConnMeta {
        &self.meta
    }

    pub fn id(&self) -> ConnId {
        self.meta.id
    }

    pub fn client_id(&self) -> &str {
        &self.meta.client_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.meta.user_id.as_deref()
    }

    /// Non-blocking enqueue. Never waits for room in the queue.
    pub fn try_enqueue(&self, msg: &PreparedMsg) -> Result<(), Backlog> {
        match self.tx.try_send(msg.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(Backlog::Full),
            Err(TrySendError::Closed(_)) => Err(Backlog::Closed),
        }
    }
}

/// Drain the outbound queue into the transport, in enqueue order.
///
/// Ends when the hub closes the queue or a write fails; the transport is
/// closed either way.
pub async fn write_pump<S>(mut sink: S, mut rx: mpsc::Receiver<PreparedMsg>, hub: Hub, meta: ConnMeta)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(msg) = rx.recv().await {
        if let Err(e) = sink.send(msg.to_ws_message()).await {
            tracing::debug!(conn_id = %meta.id, error = %e, "websocket write failed");
            hub.unregister(meta.id);
            break;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::trace!(conn_id = %meta.id, error = %e, "websocket close failed");
    }
    tracing::debug!(conn_id = %meta.id, "write pump stopped");
}

/// Watch the inbound side for closure. Inbound frames carry no meaning for
/// notifications and are discarded.
pub async fn read_pump<R, E>(mut stream: R, hub: Hub, meta: ConnMeta)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!(conn_id = %meta.id, reason = ?frame, "client initiated close");
                break;
            }
            Some(Ok(_)) => {
                tracing::trace!(conn_id = %meta.id, "inbound frame ignored");
            }
            Some(Err(e)) => {
                tracing::debug!(conn_id = %meta.id, error = %e, "websocket read failed");
                break;
            }
            None => break,
        }
    }

    hub.unregister(meta.id);
}

/// Run both pumps for one session; whichever side ends first ends the
/// session. The write pump runs on its own task, the read pump on the caller's.
///
/// - write pump done (queue closed by unregister/eviction, or write error):
///   the read half is dropped without waiting for the peer
/// - read pump done (peer close or read error): the writer task is aborted
pub async fn run_pumps<S, R, E>(
    sink: S,
    stream: R,
    rx: mpsc::Receiver<PreparedMsg>,
    hub: Hub,
    meta: ConnMeta,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut writer = tokio::spawn(write_pump(sink, rx, hub.clone(), meta.clone()).in_current_span());

    tokio::select! {
        _ = &mut writer => {
            tracing::debug!(conn_id = %meta.id, "write side ended, dropping read side");
            hub.unregister(meta.id);
        }
        _ = read_pump(stream, hub.clone(), meta.clone()) => {
            writer.abort();
        }
    }
}
