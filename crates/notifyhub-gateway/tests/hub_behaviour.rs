//! Hub membership and fan-out behaviour through the public handle.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use notifyhub_core::protocol::Notification;
use notifyhub_gateway::config::HubSection;
use notifyhub_gateway::obs::metrics::GatewayMetrics;
use notifyhub_gateway::realtime::{Hub, PreparedMsg};

fn hub_with_capacity(outbound_capacity: usize) -> (Hub, Arc<GatewayMetrics>) {
    let metrics = Arc::new(GatewayMetrics::default());
    let cfg = HubSection { outbound_capacity, ..HubSection::default() };
    (Hub::spawn(&cfg, Arc::clone(&metrics)), metrics)
}

fn note(kind: &str) -> Notification {
    Notification::new(None, kind, "title", "message", Map::new())
}

fn kind_of(msg: &PreparedMsg) -> String {
    let v: Value = serde_json::from_str(msg.as_str()).unwrap();
    v["type"].as_str().unwrap().to_string()
}

fn drain(rx: &mut mpsc::Receiver<PreparedMsg>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(m) = rx.try_recv() {
        out.push(kind_of(&m));
    }
    out
}

#[tokio::test]
async fn scenario_targeted_then_broadcast_then_unregister() {
    let (hub, _) = hub_with_capacity(256);

    let (a, mut a_rx) = hub.connection(Some("tab-a".into()), Some("u1".into()));
    let a_id = a.id();
    let (b, mut b_rx) = hub.connection(None, None);
    assert_eq!(b.client_id(), "anonymous");
    hub.register(a).unwrap();
    hub.register(b).unwrap();

    hub.broadcast_to_user("u1", &note("ping")).unwrap();
    hub.broadcast_all(&note("pong")).unwrap();
    // counts are served by the same loop, so both broadcasts are done after this
    assert_eq!(hub.connection_count().await.unwrap(), 2);

    assert_eq!(drain(&mut a_rx), ["ping", "pong"]);
    assert_eq!(drain(&mut b_rx), ["pong"]);

    hub.unregister(a_id);
    assert_eq!(hub.user_connection_count("u1").await.unwrap(), 0);
    assert_eq!(hub.connection_count().await.unwrap(), 1);
}

#[tokio::test]
async fn double_unregister_does_not_double_decrement() {
    let (hub, metrics) = hub_with_capacity(256);
    let mut ids = Vec::new();
    let mut queues = Vec::new();
    for _ in 0..3 {
        let (c, rx) = hub.connection(None, None);
        ids.push(c.id());
        queues.push(rx);
        hub.register(c).unwrap();
    }

    hub.unregister(ids[0]);
    hub.unregister(ids[0]);
    hub.unregister(ids[1]);

    assert_eq!(hub.connection_count().await.unwrap(), 1);
    assert_eq!(metrics.connections_active.get(&[]), 1);
}

#[tokio::test]
async fn user_count_tracks_every_device() {
    let (hub, _) = hub_with_capacity(256);
    let mut ids = Vec::new();
    let mut queues = Vec::new();
    for _ in 0..4 {
        let (c, rx) = hub.connection(None, Some("u7".into()));
        ids.push(c.id());
        queues.push(rx);
        hub.register(c).unwrap();
    }
    assert_eq!(hub.user_connection_count("u7").await.unwrap(), 4);

    for id in ids {
        hub.unregister(id);
    }
    let counts = hub.counts(Some("u7")).await.unwrap();
    assert_eq!(counts.total, 0);
    assert_eq!(counts.user, Some(0));
}

#[tokio::test]
async fn targeted_delivery_skips_other_users() {
    let (hub, _) = hub_with_capacity(256);
    let (u1a, mut u1a_rx) = hub.connection(None, Some("u1".into()));
    let (u1b, mut u1b_rx) = hub.connection(None, Some("u1".into()));
    let (u2, mut u2_rx) = hub.connection(None, Some("u2".into()));
    let (anon, mut anon_rx) = hub.connection(None, None);
    for c in [u1a, u1b, u2, anon] {
        hub.register(c).unwrap();
    }

    hub.broadcast_to_user("u1", &note("only-u1")).unwrap();
    hub.broadcast_to_user("ghost", &note("nobody")).unwrap();
    assert_eq!(hub.connection_count().await.unwrap(), 4);

    assert_eq!(drain(&mut u1a_rx), ["only-u1"]);
    assert_eq!(drain(&mut u1b_rx), ["only-u1"]);
    assert!(drain(&mut u2_rx).is_empty());
    assert!(drain(&mut anon_rx).is_empty());
}

#[tokio::test]
async fn dispatch_routes_by_target_user() {
    let (hub, _) = hub_with_capacity(256);
    let (a, mut a_rx) = hub.connection(None, Some("u1".into()));
    let (b, mut b_rx) = hub.connection(None, None);
    hub.register(a).unwrap();
    hub.register(b).unwrap();

    let targeted = Notification::new(Some("u1"), "direct", "t", "m", Map::new());
    hub.dispatch(&targeted).unwrap();
    hub.dispatch(&note("everyone")).unwrap();
    hub.connection_count().await.unwrap();

    assert_eq!(drain(&mut a_rx), ["direct", "everyone"]);
    assert_eq!(drain(&mut b_rx), ["everyone"]);
}

#[tokio::test]
async fn saturated_queue_is_evicted() {
    let (hub, metrics) = hub_with_capacity(1);
    let (slow, mut slow_rx) = hub.connection(Some("slow".into()), None);
    let (fast, mut fast_rx) = hub.connection(Some("fast".into()), None);
    hub.register(slow).unwrap();
    hub.register(fast).unwrap();

    hub.broadcast_all(&note("m1")).unwrap();
    hub.connection_count().await.unwrap();
    // fast drains between broadcasts, slow never does
    assert_eq!(drain(&mut fast_rx), ["m1"]);

    hub.broadcast_all(&note("m2")).unwrap();
    assert_eq!(hub.connection_count().await.unwrap(), 1);
    assert_eq!(metrics.evictions.get(&[("reason", "backlog_full")]), 1);
    assert_eq!(drain(&mut fast_rx), ["m2"]);

    hub.broadcast_all(&note("m3")).unwrap();
    assert_eq!(hub.connection_count().await.unwrap(), 1);
    assert_eq!(drain(&mut fast_rx), ["m3"]);

    // the evicted queue keeps what it had, then reports closed
    assert_eq!(kind_of(&slow_rx.recv().await.unwrap()), "m1");
    assert!(slow_rx.recv().await.is_none());
}

#[tokio::test]
async fn per_connection_order_is_preserved() {
    let (hub, _) = hub_with_capacity(256);
    let (c, mut rx) = hub.connection(None, Some("u1".into()));
    hub.register(c).unwrap();

    for i in 0..50 {
        let n = note(&format!("m{i}"));
        if i % 2 == 0 {
            hub.broadcast_all(&n).unwrap();
        } else {
            hub.broadcast_to_user("u1", &n).unwrap();
        }
    }
    hub.connection_count().await.unwrap();

    let expected: Vec<String> = (0..50).map(|i| format!("m{i}")).collect();
    assert_eq!(drain(&mut rx), expected);
}

#[tokio::test]
async fn shutdown_closes_every_queue() {
    let (hub, _) = hub_with_capacity(256);
    let (a, mut a_rx) = hub.connection(None, Some("u1".into()));
    let (b, mut b_rx) = hub.connection(None, None);
    hub.register(a).unwrap();
    hub.register(b).unwrap();

    hub.shutdown();
    assert!(a_rx.recv().await.is_none());
    assert!(b_rx.recv().await.is_none());
    assert!(hub.connection_count().await.is_err());
    assert!(hub.broadcast_all(&note("late")).is_err());
}
