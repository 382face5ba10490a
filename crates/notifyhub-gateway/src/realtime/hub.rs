//! Connection hub: membership + fan-out behind a single control loop.
//!
//! Every membership change and every dispatch decision flows through one
//! command channel consumed by `run`, so "current membership" is always read
//! at the same point that performs evictions. Callers hold a cheap `Hub`
//! handle; the `Registry` itself is private to the loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use notifyhub_core::error::{NotifyError, Result};
use notifyhub_core::protocol::Notification;

use crate::config::HubSection;
use crate::obs::metrics::GatewayMetrics;
use crate::realtime::connection::{Backlog, ConnMeta, Connection, ANONYMOUS_CLIENT};
use crate::realtime::types::{ConnId, ConnectionCounts, PreparedMsg};

enum Command {
    Register(Connection),
    Unregister(ConnId),
    BroadcastAll(PreparedMsg),
    BroadcastToUser { user_id: String, msg: PreparedMsg },
    Counts {
        user_id: Option<String>,
        reply: oneshot::Sender<ConnectionCounts>,
    },
    Shutdown,
}

/// Handle to the hub control loop. Clone freely.
#[derive(Clone)]
pub struct Hub {
    tx: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
    outbound_capacity: usize,
}

impl Hub {
    /// Start the control loop on the current runtime.
    pub fn spawn(cfg: &HubSection, metrics: Arc<GatewayMetrics>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, metrics));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
            outbound_capacity: cfg.outbound_capacity,
        }
    }

    /// Build a connection handle with a fresh id and the configured queue
    /// capacity. A missing client id becomes `"anonymous"`.
    pub fn connection(
        &self,
        client_id: Option<Arc<str>>,
        user_id: Option<Arc<str>>,
    ) -> (Connection, mpsc::Receiver<PreparedMsg>) {
        let meta = ConnMeta {
            id: ConnId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            client_id: client_id.unwrap_or_else(|| Arc::from(ANONYMOUS_CLIENT)),
            user_id,
        };
        Connection::new(meta, self.outbound_capacity)
    }

    /// Add a connection. It is a dispatch target for every call issued after
    /// this returns.
    pub fn register(&self, conn: Connection) -> Result<()> {
        self.send(Command::Register(conn))
    }

    /// Remove a connection and close its outbound queue. Idempotent; a
    /// stopped hub has already dropped everything, so errors are ignored.
    pub fn unregister(&self, id: ConnId) {
        let _ = self.send(Command::Unregister(id));
    }

    /// Serialize once and enqueue on every connection.
    pub fn broadcast_all(&self, n: &Notification) -> Result<()> {
        let msg = PreparedMsg::prepare(n)?;
        self.send(Command::BroadcastAll(msg))
    }

    /// Serialize once and enqueue on every connection of `user_id`.
    /// Unknown users are a silent no-op.
    pub fn broadcast_to_user(&self, user_id: &str, n: &Notification) -> Result<()> {
        let msg = PreparedMsg::prepare(n)?;
        self.send(Command::BroadcastToUser {
            user_id: user_id.to_string(),
            msg,
        })
    }

    /// Route by the notification's target user.
    pub fn dispatch(&self, n: &Notification) -> Result<()> {
        match n.target_user() {
            Some(user) => self.broadcast_to_user(user, n),
            None => self.broadcast_all(n),
        }
    }

    pub async fn counts(&self, user_id: Option<&str>) -> Result<ConnectionCounts> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Counts {
            user_id: user_id.map(str::to_owned),
            reply,
        })?;
        rx.await.map_err(|_| NotifyError::HubClosed)
    }

    pub async fn connection_count(&self) -> Result<usize> {
        Ok(self.counts(None).await?.total)
    }

    pub async fn user_connection_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.counts(Some(user_id)).await?.user.unwrap_or(0))
    }

    /// Stop the loop, dropping every connection (which closes their queues).
    pub fn shutdown(&self) {
        let _ = self.send(Command::Shutdown);
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.tx.send(cmd).map_err(|_| NotifyError::HubClosed)
    }
}

/// Outcome of one fan-out.
#[derive(Debug, Default)]
struct Delivery {
    delivered: usize,
    evicted: Vec<(Connection, Backlog)>,
}

/// Membership state owned by the control loop:
/// - `conns`: `conn_id -> Connection`
/// - `users`: `user_id -> [conn_id...]` (registration order)
#[derive(Default)]
struct Registry {
    conns: HashMap<ConnId, Connection>,
    users: HashMap<Arc<str>, Vec<ConnId>>,
}

impl Registry {
    fn register(&mut self, conn: Connection) {
        if let Some(user) = conn.meta().user_id.clone() {
            self.users.entry(user).or_default().push(conn.id());
        }
        self.conns.insert(conn.id(), conn);
    }

    /// Returns the removed connection only on the first effective call.
    fn unregister(&mut self, id: ConnId) -> Option<Connection> {
        let conn = self.conns.remove(&id)?;
        if let Some(user) = conn.user_id() {
            if let Some(ids) = self.users.get_mut(user) {
                ids.retain(|c| *c != id);
                if ids.is_empty() {
                    self.users.remove(user);
                }
            }
        }
        Some(conn)
    }

    fn broadcast_all(&mut self, msg: &PreparedMsg) -> Delivery {
        let targets: Vec<ConnId> = self.conns.keys().copied().collect();
        self.deliver(&targets, msg)
    }

    fn broadcast_to_user(&mut self, user_id: &str, msg: &PreparedMsg) -> Delivery {
        let Some(targets) = self.users.get(user_id).cloned() else {
            return Delivery::default();
        };
        self.deliver(&targets, msg)
    }

    /// Enqueue on each target; a target that cannot take the message is
    /// dropped from membership right here.
    fn deliver(&mut self, targets: &[ConnId], msg: &PreparedMsg) -> Delivery {
        let mut out = Delivery::default();
        let mut failed = Vec::new();
        for id in targets {
            let Some(conn) = self.conns.get(id) else { continue };
            match conn.try_enqueue(msg) {
                Ok(()) => out.delivered += 1,
                Err(reason) => failed.push((*id, reason)),
            }
        }
        for (id, reason) in failed {
            if let Some(conn) = self.unregister(id) {
                out.evicted.push((conn, reason));
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.conns.len()
    }

    fn user_len(&self, user_id: &str) -> usize {
        self.users.get(user_id).map(Vec::len).unwrap_or(0)
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>, metrics: Arc<GatewayMetrics>) {
    let mut reg = Registry::default();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Register(conn) => {
                let (client_id, user_id) = (conn.meta().client_id.clone(), conn.meta().user_id.clone());
                reg.register(conn);
                metrics.connections_active.inc(&[]);
                tracing::info!(
                    client_id = %client_id,
                    user_id = user_id.as_deref().unwrap_or(""),
                    total = reg.len(),
                    "client registered"
                );
            }
            Command::Unregister(id) => {
                if let Some(conn) = reg.unregister(id) {
                    metrics.connections_active.dec(&[]);
                    tracing::info!(
                        conn_id = %id,
                        client_id = %conn.client_id(),
                        user_id = conn.user_id().unwrap_or(""),
                        total = reg.len(),
                        "client unregistered"
                    );
                }
            }
            Command::BroadcastAll(msg) => {
                let d = reg.broadcast_all(&msg);
                report(&metrics, d, reg.len());
            }
            Command::BroadcastToUser { user_id, msg } => {
                if reg.user_len(&user_id) == 0 {
                    tracing::debug!(user_id = %user_id, "no connections for user");
                    continue;
                }
                let d = reg.broadcast_to_user(&user_id, &msg);
                report(&metrics, d, reg.len());
            }
            Command::Counts { user_id, reply } => {
                let counts = ConnectionCounts {
                    total: reg.len(),
                    user: user_id.map(|u| reg.user_len(&u)),
                };
                let _ = reply.send(counts);
            }
            Command::Shutdown => break,
        }
    }

    let dropped = reg.len();
    metrics.connections_active.add(&[], -(dropped as i64));
    tracing::info!(dropped, "hub stopped");
}

fn report(metrics: &GatewayMetrics, d: Delivery, total: usize) {
    for (conn, reason) in &d.evicted {
        metrics.connections_active.dec(&[]);
        metrics.evictions.inc(&[("reason", reason.as_str())]);
        tracing::warn!(
            conn_id = %conn.id(),
            client_id = %conn.client_id(),
            user_id = conn.user_id().unwrap_or(""),
            reason = reason.as_str(),
            total,
            "client evicted"
        );
    }
    tracing::debug!(delivered = d.delivered, evicted = d.evicted.len(), "fan-out done");
}
